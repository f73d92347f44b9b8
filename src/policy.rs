//! Visibility policy: decides whether an element is exposed in a deployment mode.
//!
//! Rules, first match wins:
//!
//! | Annotation class | Hidden when the mode does not grant |
//! |------------------|-------------------------------------|
//! | `internal` | internal access |
//! | `private` | private access |
//! | `public` | (never hidden) |
//! | (none) | (never hidden by itself; parents cascade in the filter) |
//!
//! A `public` annotation combined with `private` or `internal` on the same
//! element has no consistent reading and is rejected at validation time.

use crate::error::SchemaError;
use crate::graph::AnnotationSet;
use crate::registry::DirectiveRegistry;
use crate::types::{DeploymentMode, Visibility, VisibilityClass};

/// Visibility classes present on one element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityMarks {
    pub internal: bool,
    pub private: bool,
    pub public: bool,
}

impl VisibilityMarks {
    /// Collect the marks carried by `annotations`.
    pub fn collect(annotations: &AnnotationSet, registry: &DirectiveRegistry) -> Self {
        let mut marks = Self::default();
        for class in registry.visibility_classes(annotations) {
            match class {
                VisibilityClass::Internal => marks.internal = true,
                VisibilityClass::Private => marks.private = true,
                VisibilityClass::Public => marks.public = true,
            }
        }
        marks
    }

    /// True if the marks both require and forbid exposure.
    pub fn is_conflicting(&self) -> bool {
        self.public && (self.private || self.internal)
    }
}

/// Evaluate marks against a mode.
pub fn evaluate(marks: VisibilityMarks, mode: DeploymentMode) -> Visibility {
    if marks.internal && !mode.grants(VisibilityClass::Internal) {
        return Visibility::Hidden;
    }
    if marks.private && !mode.grants(VisibilityClass::Private) {
        return Visibility::Hidden;
    }
    Visibility::Visible
}

/// Returns true if an element with these annotations is exposed under `mode`.
pub fn is_visible(
    annotations: &AnnotationSet,
    registry: &DirectiveRegistry,
    mode: DeploymentMode,
) -> bool {
    evaluate(VisibilityMarks::collect(annotations, registry), mode).is_visible()
}

/// Reject an element whose visibility annotations contradict each other.
///
/// # Errors
///
/// Returns `SchemaError::ConflictingVisibilityAnnotations` naming the
/// element and its visibility directives.
pub fn check_conflicts(
    path: &str,
    annotations: &AnnotationSet,
    registry: &DirectiveRegistry,
) -> Result<(), SchemaError> {
    if VisibilityMarks::collect(annotations, registry).is_conflicting() {
        return Err(SchemaError::ConflictingVisibilityAnnotations {
            path: path.to_string(),
            directives: annotations
                .names()
                .filter(|name| registry.is_visibility_directive(name))
                .map(String::from)
                .collect(),
        });
    }
    Ok(())
}

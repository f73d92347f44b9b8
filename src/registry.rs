//! Directive registry: which annotations exist, where they may appear, and
//! what they do.
//!
//! Each declared directive carries a [`DirectiveRole`]. The role table is the
//! only place the filter and decorator consult to interpret an annotation, so
//! a new directive is added by registering it, not by teaching the filter
//! about its name.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{PlacementIssue, SchemaError};
use crate::graph::{AnnotationSet, DirectiveDeclaration, SchemaGraph};
use crate::policy::check_conflicts;
use crate::types::{ElementKind, VisibilityClass};

/// Transform applied to the text result of a decorated resolver.
pub type TextTransform = fn(&str) -> String;

/// What a directive does when it is attached to an element.
#[derive(Clone, Copy)]
pub enum DirectiveRole {
    /// Metadata only; no effect on filtering or resolution.
    Marker,
    /// Restricts the element to modes granting this class.
    Visibility(VisibilityClass),
    /// Rewrites text results of the annotated field.
    Transform(TextTransform),
}

impl fmt::Debug for DirectiveRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectiveRole::Marker => f.write_str("Marker"),
            DirectiveRole::Visibility(class) => f.debug_tuple("Visibility").field(class).finish(),
            DirectiveRole::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

impl PartialEq for DirectiveRole {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DirectiveRole::Marker, DirectiveRole::Marker) => true,
            (DirectiveRole::Visibility(a), DirectiveRole::Visibility(b)) => a == b,
            (DirectiveRole::Transform(a), DirectiveRole::Transform(b)) => *a as usize == *b as usize,
            _ => false,
        }
    }
}

impl Eq for DirectiveRole {}

/// One registered directive.
#[derive(Debug, Clone)]
pub struct DirectiveDefinition {
    pub name: String,
    pub locations: BTreeSet<ElementKind>,
    pub role: DirectiveRole,
}

impl DirectiveDefinition {
    pub fn allows(&self, kind: ElementKind) -> bool {
        self.locations.contains(&kind)
    }
}

/// Table of declared directives, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct DirectiveRegistry {
    directives: BTreeMap<String, DirectiveDefinition>,
}

fn to_uppercase(s: &str) -> String {
    s.to_uppercase()
}

fn to_lowercase(s: &str) -> String {
    s.to_lowercase()
}

impl DirectiveRegistry {
    /// An empty registry: every annotation fails validation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the stock directives.
    ///
    /// - `@internal`, `@private`, `@public` on every element kind
    /// - `@uppercase`, `@lowercase` on fields
    pub fn standard() -> Self {
        let mut registry = Self::new();
        let everywhere = ElementKind::ALL;
        registry.declare_visibility("internal", everywhere, VisibilityClass::Internal);
        registry.declare_visibility("private", everywhere, VisibilityClass::Private);
        registry.declare_visibility("public", everywhere, VisibilityClass::Public);
        registry.declare_transform("uppercase", [ElementKind::Field], to_uppercase);
        registry.declare_transform("lowercase", [ElementKind::Field], to_lowercase);
        registry
    }

    /// Declare a marker directive.
    ///
    /// Redeclaring a name replaces its previous definition.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        locations: impl IntoIterator<Item = ElementKind>,
    ) -> &mut Self {
        self.insert(name.into(), locations, DirectiveRole::Marker)
    }

    /// Declare a directive that restricts visibility to `class`.
    pub fn declare_visibility(
        &mut self,
        name: impl Into<String>,
        locations: impl IntoIterator<Item = ElementKind>,
        class: VisibilityClass,
    ) -> &mut Self {
        self.insert(name.into(), locations, DirectiveRole::Visibility(class))
    }

    /// Declare a directive that transforms text results of a field.
    pub fn declare_transform(
        &mut self,
        name: impl Into<String>,
        locations: impl IntoIterator<Item = ElementKind>,
        transform: TextTransform,
    ) -> &mut Self {
        self.insert(name.into(), locations, DirectiveRole::Transform(transform))
    }

    fn insert(
        &mut self,
        name: String,
        locations: impl IntoIterator<Item = ElementKind>,
        role: DirectiveRole,
    ) -> &mut Self {
        let definition = DirectiveDefinition {
            name: name.clone(),
            locations: locations.into_iter().collect(),
            role,
        };
        self.directives.insert(name, definition);
        self
    }

    /// Merge directive declarations carried by a schema document.
    ///
    /// A known directive keeps its role and takes the declared locations;
    /// an unknown one is registered as a marker.
    pub fn extend(&mut self, declarations: &[DirectiveDeclaration]) -> &mut Self {
        for decl in declarations {
            let locations = decl.locations.iter().copied();
            match self.directives.get_mut(&decl.name) {
                Some(existing) => existing.locations = locations.collect(),
                None => {
                    self.declare(decl.name.clone(), locations);
                }
            }
        }
        self
    }

    /// Standard registry extended with the graph's own declarations.
    pub fn for_graph(graph: &SchemaGraph) -> Self {
        let mut registry = Self::standard();
        registry.extend(graph.directive_declarations());
        registry
    }

    pub fn get(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives.get(name)
    }

    pub fn role(&self, name: &str) -> Option<DirectiveRole> {
        self.directives.get(name).map(|d| d.role)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &DirectiveDefinition> {
        self.directives.values()
    }

    /// Visibility classes assigned by `annotations`, in annotation order.
    ///
    /// Undeclared names are ignored; [`validate`](Self::validate) rejects them.
    pub fn visibility_classes(&self, annotations: &AnnotationSet) -> Vec<VisibilityClass> {
        annotations
            .names()
            .filter_map(|name| match self.role(name) {
                Some(DirectiveRole::Visibility(class)) => Some(class),
                _ => None,
            })
            .collect()
    }

    /// Text transforms assigned by `annotations`, in annotation order.
    pub fn transforms<'a>(
        &'a self,
        annotations: &'a AnnotationSet,
    ) -> impl Iterator<Item = (&'a str, TextTransform)> + 'a {
        annotations
            .names()
            .filter_map(|name| match self.role(name) {
                Some(DirectiveRole::Transform(transform)) => Some((name, transform)),
                _ => None,
            })
    }

    /// Returns true if `name` is a visibility directive.
    pub fn is_visibility_directive(&self, name: &str) -> bool {
        matches!(self.role(name), Some(DirectiveRole::Visibility(_)))
    }

    /// Check a single element's annotations for placement.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidDirectivePlacement` for the first
    /// undeclared or misplaced annotation.
    pub fn check_placement(
        &self,
        path: &str,
        kind: ElementKind,
        annotations: &AnnotationSet,
    ) -> Result<(), SchemaError> {
        for name in annotations.names() {
            let issue = match self.get(name) {
                None => PlacementIssue::Undeclared,
                Some(def) if !def.allows(kind) => PlacementIssue::DisallowedOn(kind),
                Some(_) => continue,
            };
            return Err(SchemaError::InvalidDirectivePlacement {
                path: path.to_string(),
                directive: name.to_string(),
                issue,
            });
        }
        Ok(())
    }

    /// Validate every annotation in the graph.
    ///
    /// Runs once, before filtering. Checks placement of every annotation and
    /// rejects elements whose visibility annotations conflict.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidDirectivePlacement` or
    /// `SchemaError::ConflictingVisibilityAnnotations`.
    pub fn validate(&self, graph: &SchemaGraph) -> Result<(), SchemaError> {
        for element in graph.elements() {
            self.check_placement(&element.path, element.kind, element.annotations)?;
            check_conflicts(&element.path, element.annotations, self)?;
        }
        Ok(())
    }
}

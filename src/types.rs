//! Core types for schema visibility filtering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Scalars every schema provides without declaring them.
pub const BUILTIN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];

/// Environment variable holding the deployment mode.
pub const MODE_ENV_VAR: &str = "SCHEMA_DEPLOYMENT_MODE";

/// Legacy boolean switch: `PRIVATE_DEPLOYMENT=true` selects private mode.
pub const LEGACY_PRIVATE_ENV_VAR: &str = "PRIVATE_DEPLOYMENT";

/// Returns true if `name` is one of the built-in scalars.
pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

/// Kind of graph element an annotation is attached to.
///
/// Serialized with the GraphQL directive location names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    #[serde(rename = "OBJECT")]
    Object,
    #[serde(rename = "FIELD_DEFINITION")]
    Field,
    #[serde(rename = "ENUM")]
    Enum,
    #[serde(rename = "ENUM_VALUE")]
    EnumValue,
}

impl ElementKind {
    pub const ALL: [ElementKind; 4] = [
        ElementKind::Object,
        ElementKind::Field,
        ElementKind::Enum,
        ElementKind::EnumValue,
    ];

    /// Returns the GraphQL directive location name.
    pub fn location_name(&self) -> &'static str {
        match self {
            ElementKind::Object => "OBJECT",
            ElementKind::Field => "FIELD_DEFINITION",
            ElementKind::Enum => "ENUM",
            ElementKind::EnumValue => "ENUM_VALUE",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.location_name())
    }
}

/// Access class a visibility directive assigns to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityClass {
    /// Hidden unless the mode grants internal access.
    Internal,
    /// Hidden unless the mode grants private access.
    Private,
    /// Visible in every mode.
    Public,
}

/// Outcome of evaluating an element against a deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

impl Visibility {
    pub fn is_visible(&self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

/// Process-wide deployment mode, fixed when the schema is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    /// Only unannotated and `public` elements are exposed.
    #[default]
    Public,
    /// `private` elements are exposed as well.
    Private,
    /// Everything is exposed, including `internal` elements.
    Internal,
}

impl DeploymentMode {
    pub const ALL: [DeploymentMode; 3] = [
        DeploymentMode::Public,
        DeploymentMode::Private,
        DeploymentMode::Internal,
    ];

    /// Returns true if elements of `class` are visible under this mode.
    pub fn grants(&self, class: VisibilityClass) -> bool {
        match class {
            VisibilityClass::Public => true,
            VisibilityClass::Private => {
                matches!(self, DeploymentMode::Private | DeploymentMode::Internal)
            }
            VisibilityClass::Internal => matches!(self, DeploymentMode::Internal),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentMode::Public => "public",
            DeploymentMode::Private => "private",
            DeploymentMode::Internal => "internal",
        }
    }

    /// Read the mode from the process environment.
    ///
    /// `SCHEMA_DEPLOYMENT_MODE` wins; otherwise `PRIVATE_DEPLOYMENT=true`
    /// selects private mode; otherwise the mode is public.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownMode` if `SCHEMA_DEPLOYMENT_MODE` holds
    /// an unrecognized value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the mode through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(MODE_ENV_VAR) {
            if !value.trim().is_empty() {
                return value.parse();
            }
        }

        let legacy_private = lookup(LEGACY_PRIVATE_ENV_VAR)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(if legacy_private {
            DeploymentMode::Private
        } else {
            DeploymentMode::Public
        })
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(DeploymentMode::Public),
            "private" | "private-allowed" => Ok(DeploymentMode::Private),
            "internal" | "internal-visible" => Ok(DeploymentMode::Internal),
            _ => Err(ConfigError::UnknownMode {
                value: s.to_string(),
            }),
        }
    }
}

/// Options for schema filtering.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Deployment mode the schema is filtered for.
    pub mode: DeploymentMode,
    /// When true, visibility annotations are removed from surviving
    /// elements so the published schema does not advertise them.
    pub strip_annotations: bool,
}

impl FilterOptions {
    /// Create filter options that keep annotations on surviving elements.
    pub fn new(mode: DeploymentMode) -> Self {
        Self {
            mode,
            strip_annotations: false,
        }
    }

    /// Set whether visibility annotations are stripped from the output.
    pub fn strip_annotations(mut self, strip: bool) -> Self {
        self.strip_annotations = strip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn mode_grants() {
        assert!(DeploymentMode::Public.grants(VisibilityClass::Public));
        assert!(!DeploymentMode::Public.grants(VisibilityClass::Private));
        assert!(!DeploymentMode::Public.grants(VisibilityClass::Internal));

        assert!(DeploymentMode::Private.grants(VisibilityClass::Private));
        assert!(!DeploymentMode::Private.grants(VisibilityClass::Internal));

        assert!(DeploymentMode::Internal.grants(VisibilityClass::Internal));
        assert!(DeploymentMode::Internal.grants(VisibilityClass::Private));
    }

    #[test]
    fn mode_parse_accepts_aliases() {
        assert_eq!("public".parse::<DeploymentMode>().unwrap(), DeploymentMode::Public);
        assert_eq!("Private".parse::<DeploymentMode>().unwrap(), DeploymentMode::Private);
        assert_eq!(
            "private-allowed".parse::<DeploymentMode>().unwrap(),
            DeploymentMode::Private
        );
        assert_eq!(
            "internal-visible".parse::<DeploymentMode>().unwrap(),
            DeploymentMode::Internal
        );
    }

    #[test]
    fn mode_parse_rejects_unknown() {
        let err = "staging".parse::<DeploymentMode>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMode { value } if value == "staging"));
    }

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn mode_from_lookup_defaults_to_public() {
        let mode = DeploymentMode::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(mode, DeploymentMode::Public);
    }

    #[test]
    fn mode_from_lookup_legacy_private_flag() {
        let mode =
            DeploymentMode::from_lookup(lookup_from(&[(LEGACY_PRIVATE_ENV_VAR, "true")])).unwrap();
        assert_eq!(mode, DeploymentMode::Private);

        let mode =
            DeploymentMode::from_lookup(lookup_from(&[(LEGACY_PRIVATE_ENV_VAR, "false")])).unwrap();
        assert_eq!(mode, DeploymentMode::Public);
    }

    #[test]
    fn mode_from_lookup_explicit_mode_wins() {
        let mode = DeploymentMode::from_lookup(lookup_from(&[
            (MODE_ENV_VAR, "internal"),
            (LEGACY_PRIVATE_ENV_VAR, "true"),
        ]))
        .unwrap();
        assert_eq!(mode, DeploymentMode::Internal);
    }

    #[test]
    fn filter_options_builder() {
        let opts = FilterOptions::new(DeploymentMode::Private).strip_annotations(true);
        assert_eq!(opts.mode, DeploymentMode::Private);
        assert!(opts.strip_annotations);
    }

    #[test]
    fn element_kind_location_names() {
        assert_eq!(ElementKind::Field.to_string(), "FIELD_DEFINITION");
        assert_eq!(ElementKind::EnumValue.location_name(), "ENUM_VALUE");
    }
}

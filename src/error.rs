//! Error types for schema loading, filtering and resolver execution.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::ElementKind;

/// Why an annotation failed registry validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementIssue {
    /// The directive name was never declared.
    Undeclared,
    /// The directive is declared but not legal on this element kind.
    DisallowedOn(ElementKind),
}

impl fmt::Display for PlacementIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementIssue::Undeclared => f.write_str("directive is not declared"),
            PlacementIssue::DisallowedOn(kind) => write!(f, "directive is not allowed on {}", kind),
        }
    }
}

/// Structural schema defects, raised while building a schema.
///
/// All variants are fatal: the schema must not be served.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid placement of @{directive} at {path}: {issue}")]
    InvalidDirectivePlacement {
        path: String,
        directive: String,
        issue: PlacementIssue,
    },

    #[error("conflicting visibility annotations at {path}: {}", directives.iter().map(|d| format!("@{}", d)).collect::<Vec<_>>().join(", "))]
    ConflictingVisibilityAnnotations {
        path: String,
        directives: Vec<String>,
    },

    #[error("type {type_name} has no visible members after filtering")]
    EmptyTypeAfterFiltering { type_name: String },

    #[error("dangling reference at {path}: type {type_name} is not in the filtered schema")]
    DanglingTypeReference { path: String, type_name: String },

    #[error("root {operation} type {type_name} is hidden in this deployment mode")]
    RootOperationHidden {
        operation: String,
        type_name: String,
    },

    #[error("unknown type {type_name} referenced at {path}")]
    UnknownTypeReference { path: String, type_name: String },

    #[error("root {operation} type {type_name} is not defined")]
    UnknownRootType {
        operation: String,
        type_name: String,
    },

    #[error("root {operation} type {type_name} is not an object type")]
    RootNotObject {
        operation: String,
        type_name: String,
    },

    #[error("type {name} is defined more than once")]
    DuplicateType { name: String },

    #[error("{path} is defined more than once")]
    DuplicateMember { path: String },

    #[error("type {type_name} is {kind} but declares {member}")]
    MemberKindMismatch {
        type_name: String,
        kind: String,
        member: String,
    },

    #[error("type {type_name} declares no members")]
    EmptyType { type_name: String },

    #[error("type {name} shadows a built-in scalar")]
    ReservedTypeName { name: String },

    #[error("argument {path} has type {type_name}, which is not a scalar or enum")]
    InvalidArgumentType { path: String, type_name: String },

    #[error("resolver registered for unknown field {coordinate}")]
    UnknownResolverTarget { coordinate: String },
}

impl SchemaError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading a schema document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid schema document: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown deployment mode \"{value}\": expected public, private, or internal")]
    UnknownMode { value: String },
}

/// A type reference string that does not parse.
#[derive(Debug, Clone, Error)]
#[error("invalid type reference \"{value}\"")]
pub struct ParseTypeRefError {
    pub value: String,
}

/// Failures raised while a resolver runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolverError {
    #[error("{message}")]
    Failed { message: String },

    #[error("field {coordinate} is not part of the schema")]
    UnknownField { coordinate: String },
}

impl ResolverError {
    /// Shorthand for a resolver failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        ResolverError::Failed {
            message: message.into(),
        }
    }
}

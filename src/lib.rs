//! Schema Visibility
//!
//! Directive-driven visibility filtering for API schemas.
//!
//! One schema definition is annotated with visibility directives (`@public`,
//! `@private`, `@internal`); at build time it is filtered for the process's
//! deployment mode, so public deployments never expose private or internal
//! types, fields or enum values. Transform directives (`@uppercase`,
//! `@lowercase`) decorate field resolvers in the same build step.
//!
//! # Example
//!
//! ```
//! use schema_visibility::{filter, load_schema_value, DeploymentMode, DirectiveRegistry, FilterOptions};
//! use serde_json::json;
//!
//! let graph = load_schema_value(json!({
//!     "types": [
//!         { "kind": "object", "name": "Client", "fields": [
//!             { "name": "fullName", "type": "String" },
//!             { "name": "secretField", "type": "String", "directives": ["private"] }
//!         ] },
//!         { "kind": "object", "name": "Query", "fields": [
//!             { "name": "clients", "type": "[Client]" }
//!         ] }
//!     ]
//! }))
//! .unwrap();
//!
//! let registry = DirectiveRegistry::for_graph(&graph);
//! let public = filter(&graph, &registry, &FilterOptions::new(DeploymentMode::Public)).unwrap();
//!
//! // secretField is hidden in public deployments
//! let client = public.type_node("Client").unwrap();
//! assert!(client.field("fullName").is_some());
//! assert!(client.field("secretField").is_none());
//! ```
//!
//! # Visibility Rules
//!
//! | Annotation | `public` mode | `private` mode | `internal` mode |
//! |------------|---------------|----------------|-----------------|
//! | (none) | visible | visible | visible |
//! | `@public` | visible | visible | visible |
//! | `@private` | hidden | visible | visible |
//! | `@internal` | hidden | hidden | visible |
//!
//! Hiding cascades: a field whose return or argument type is hidden is
//! removed, and types no longer reachable from a root operation are dropped.
//! A reachable type left with no members is a build error.

mod decorator;
mod error;
mod executable;
mod filter;
mod graph;
mod linter;
mod loader;
mod policy;
mod registry;
mod render;
mod types;

pub use decorator::{decorate, decorate_schema, ResolveArgs, Resolver, ResolverFuture, ResolverTable};
pub use error::{ConfigError, LoadError, ParseTypeRefError, PlacementIssue, ResolverError, SchemaError};
pub use executable::{build_schema, ExecutableSchema};
pub use filter::{filter, is_filtered_for, reachable_types, strip_annotations};
pub use graph::{
    Annotation, AnnotationSet, ArgumentNode, DirectiveDeclaration, ElementRef, EnumValueNode,
    FieldCoordinate, FieldNode, RootOperations, SchemaDocument, SchemaGraph, TypeKind, TypeNode,
    TypeRef,
};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{is_url, load_schema, load_schema_auto, load_schema_str, load_schema_value};
pub use policy::{check_conflicts, evaluate, is_visible, VisibilityMarks};
pub use registry::{DirectiveDefinition, DirectiveRegistry, DirectiveRole, TextTransform};
pub use render::render_sdl;
pub use types::{
    is_builtin_scalar, DeploymentMode, ElementKind, FilterOptions, Visibility, VisibilityClass,
    BUILTIN_SCALARS, LEGACY_PRIVATE_ENV_VAR, MODE_ENV_VAR,
};

#[cfg(feature = "remote")]
pub use loader::load_schema_url;

//! Executable schema: filtered graph plus decorated resolvers.

use tracing::info;

use crate::decorator::{decorate_schema, ResolveArgs, Resolver, ResolverTable};
use crate::error::{ResolverError, SchemaError};
use crate::filter::filter;
use crate::graph::{FieldCoordinate, SchemaGraph};
use crate::registry::DirectiveRegistry;
use crate::types::{DeploymentMode, FilterOptions};

/// Read-only schema handed to the serving layer.
///
/// Holds only the fields visible in its deployment mode; resolvers of
/// filtered-out fields are gone with them.
#[derive(Debug, Clone)]
pub struct ExecutableSchema {
    mode: DeploymentMode,
    graph: SchemaGraph,
    resolvers: ResolverTable,
}

impl ExecutableSchema {
    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    /// Resolver for a field, or the default property resolver.
    ///
    /// Returns `None` if the field is not part of this schema.
    pub fn resolver(&self, coordinate: &FieldCoordinate) -> Option<Resolver> {
        self.graph.field(coordinate)?;
        Some(
            self.resolvers
                .get(coordinate)
                .cloned()
                .unwrap_or_else(|| Resolver::property(coordinate.field_name.as_str())),
        )
    }

    /// Run the resolver of one field.
    ///
    /// # Errors
    ///
    /// Returns `ResolverError::UnknownField` if the field was filtered out or
    /// never existed, otherwise whatever the resolver returns.
    pub async fn resolve_field(
        &self,
        coordinate: &FieldCoordinate,
        args: ResolveArgs,
    ) -> Result<serde_json::Value, ResolverError> {
        let resolver = self
            .resolver(coordinate)
            .ok_or_else(|| ResolverError::UnknownField {
                coordinate: coordinate.to_string(),
            })?;
        resolver.call(args).await
    }
}

/// Build an executable schema: validate, filter, then decorate.
///
/// # Errors
///
/// Returns `SchemaError::UnknownResolverTarget` if `resolvers` names a field
/// missing from the unfiltered schema, or any error from [`filter`].
pub fn build_schema(
    graph: &SchemaGraph,
    registry: &DirectiveRegistry,
    mut resolvers: ResolverTable,
    options: &FilterOptions,
) -> Result<ExecutableSchema, SchemaError> {
    let mut unknown: Vec<&FieldCoordinate> = resolvers
        .coordinates()
        .filter(|coordinate| graph.field(coordinate).is_none())
        .collect();
    unknown.sort();
    if let Some(coordinate) = unknown.first() {
        return Err(SchemaError::UnknownResolverTarget {
            coordinate: coordinate.to_string(),
        });
    }

    let filtered = filter(graph, registry, options)?;

    resolvers.retain_fields_of(&filtered);
    decorate_schema(&filtered, registry, &mut resolvers);

    info!(
        mode = %options.mode,
        types = filtered.type_count(),
        resolvers = resolvers.len(),
        "executable schema ready"
    );

    Ok(ExecutableSchema {
        mode: options.mode,
        graph: filtered,
        resolvers,
    })
}

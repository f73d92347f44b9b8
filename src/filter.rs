//! Schema filtering - derives the schema exposed in one deployment mode.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::SchemaError;
use crate::graph::{SchemaGraph, TypeKind, TypeNode};
use crate::policy::is_visible;
use crate::registry::DirectiveRegistry;
use crate::types::{is_builtin_scalar, DeploymentMode, FilterOptions};

/// Filter a schema for the deployment mode in `options`.
///
/// Validates annotations, removes hidden types, fields and enum values,
/// then removes every type no longer reachable from a root operation.
/// The result satisfies the same reference invariants as the input.
///
/// # Errors
///
/// Returns `SchemaError` if annotations are invalid or conflicting, if a
/// root type is hidden, if a reachable type is left without members, or if
/// the filtered graph would contain a dangling reference.
pub fn filter(
    graph: &SchemaGraph,
    registry: &DirectiveRegistry,
    options: &FilterOptions,
) -> Result<SchemaGraph, SchemaError> {
    registry.validate(graph)?;
    let mode = options.mode;

    let hidden_types: HashSet<String> = graph
        .types()
        .filter(|ty| !is_visible(&ty.annotations, registry, mode))
        .map(|ty| ty.name.clone())
        .collect();

    for (operation, name) in graph.roots().iter() {
        if hidden_types.contains(name) {
            return Err(SchemaError::RootOperationHidden {
                operation: operation.to_string(),
                type_name: name.to_string(),
            });
        }
    }

    let mut filtered = graph.clone();
    filtered.retain_types(|ty| {
        let keep = !hidden_types.contains(&ty.name);
        if !keep {
            debug!(type_name = %ty.name, "removing hidden type");
        }
        keep
    });

    // Graphs edited after construction may already hold memberless types
    let mut emptied = Vec::new();
    for ty in filtered.types_mut() {
        prune_members(ty, registry, mode, &hidden_types);
        if ty.member_count() == 0 {
            emptied.push(ty.name.clone());
        }
    }

    let reachable = reachable_types(&filtered);

    // An emptied type nothing visible points at is an orphan, not an error
    if let Some(name) = emptied.iter().find(|name| reachable.contains(name.as_str())) {
        return Err(SchemaError::EmptyTypeAfterFiltering {
            type_name: name.clone(),
        });
    }

    filtered.retain_types(|ty| {
        let keep = reachable.contains(&ty.name);
        if !keep {
            debug!(type_name = %ty.name, "removing unreachable type");
        }
        keep
    });

    if options.strip_annotations {
        strip_visibility(&mut filtered, registry);
    }

    if let Some((path, type_name)) = filtered.find_dangling_reference() {
        return Err(SchemaError::DanglingTypeReference { path, type_name });
    }

    info!(
        mode = %mode,
        types_before = graph.type_count(),
        types_after = filtered.type_count(),
        "schema filtered"
    );

    Ok(filtered)
}

/// Names of every type reachable from a root operation.
///
/// Follows field return types and argument types transitively.
pub fn reachable_types(graph: &SchemaGraph) -> HashSet<String> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: Vec<&str> = graph.roots().iter().map(|(_, name)| name).collect();

    while let Some(current) = queue.pop() {
        if visited.contains(current) {
            continue;
        }
        let Some(ty) = graph.type_node(current) else {
            continue;
        };
        visited.insert(current.to_string());

        for field in &ty.fields {
            let targets = std::iter::once(field.ty.named_type())
                .chain(field.arguments.iter().map(|arg| arg.ty.named_type()));
            for target in targets {
                if !is_builtin_scalar(target) && !visited.contains(target) {
                    queue.push(target);
                }
            }
        }
    }

    visited
}

/// Remove visibility annotations and their declarations from a graph.
///
/// Other annotations are left in place.
pub fn strip_annotations(graph: &SchemaGraph, registry: &DirectiveRegistry) -> SchemaGraph {
    let mut stripped = graph.clone();
    strip_visibility(&mut stripped, registry);
    stripped
}

/// Returns true if `graph` filters to itself under `mode`.
///
/// Useful as a sanity check on published schemas.
pub fn is_filtered_for(
    graph: &SchemaGraph,
    registry: &DirectiveRegistry,
    mode: DeploymentMode,
) -> bool {
    filter(graph, registry, &FilterOptions::new(mode))
        .map(|filtered| &filtered == graph)
        .unwrap_or(false)
}

// --- Internal implementation ---

fn prune_members(
    ty: &mut TypeNode,
    registry: &DirectiveRegistry,
    mode: DeploymentMode,
    hidden_types: &HashSet<String>,
) {
    match ty.kind {
        TypeKind::Object => {
            let type_name = ty.name.clone();
            ty.fields.retain(|field| {
                // A field is hidden by its own annotations or by any type it mentions
                let own = is_visible(&field.annotations, registry, mode);
                let returns_hidden = hidden_types.contains(field.ty.named_type());
                let takes_hidden = field
                    .arguments
                    .iter()
                    .any(|arg| hidden_types.contains(arg.ty.named_type()));

                let keep = own && !returns_hidden && !takes_hidden;
                if !keep {
                    debug!(
                        field = %format!("{}.{}", type_name, field.name),
                        annotated = !own,
                        returns_hidden,
                        takes_hidden,
                        "removing hidden field"
                    );
                }
                keep
            });
        }
        TypeKind::Enum => {
            let type_name = ty.name.clone();
            ty.values.retain(|value| {
                let keep = is_visible(&value.annotations, registry, mode);
                if !keep {
                    debug!(value = %format!("{}.{}", type_name, value.name), "removing hidden enum value");
                }
                keep
            });
        }
    }
}

fn strip_visibility(graph: &mut SchemaGraph, registry: &DirectiveRegistry) {
    let is_visibility = |name: &str| registry.is_visibility_directive(name);

    for ty in graph.types_mut() {
        ty.annotations.retain(|a| !is_visibility(a.name.as_str()));
        for field in &mut ty.fields {
            field.annotations.retain(|a| !is_visibility(a.name.as_str()));
        }
        for value in &mut ty.values {
            value.annotations.retain(|a| !is_visibility(a.name.as_str()));
        }
    }
    graph.retain_directive_declarations(|decl| !is_visibility(decl.name.as_str()));
}

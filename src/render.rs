//! SDL rendering of a schema graph.
//!
//! Output is deterministic: directive declarations first (the document's own,
//! then registry directives in use), types sorted by name, members in
//! declaration order.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::graph::{AnnotationSet, FieldNode, RootOperations, SchemaGraph, TypeKind, TypeNode};
use crate::registry::DirectiveRegistry;
use crate::types::ElementKind;

const INDENT: &str = "  ";

/// Render `graph` as GraphQL SDL.
///
/// Directives used in the graph but declared only in `registry` (such as the
/// stock `@private` or `@uppercase`) get a `directive` declaration too, so
/// the output is self-contained.
pub fn render_sdl(graph: &SchemaGraph, registry: &DirectiveRegistry) -> String {
    let mut out = String::new();

    if graph.roots() != &RootOperations::default() {
        out.push_str("schema {\n");
        for (operation, name) in graph.roots().iter() {
            out.push_str(&format!("{}{}: {}\n", INDENT, operation, name));
        }
        out.push_str("}\n\n");
    }

    let declarations = directive_declarations(graph, registry);
    for line in &declarations {
        out.push_str(line);
        out.push('\n');
    }
    if !declarations.is_empty() {
        out.push('\n');
    }

    let blocks: Vec<String> = graph.types().map(render_type).collect();
    out.push_str(&blocks.join("\n"));
    out
}

fn directive_declarations(graph: &SchemaGraph, registry: &DirectiveRegistry) -> Vec<String> {
    let declared = graph.directive_declarations();
    let mut lines: Vec<String> = declared
        .iter()
        .map(|decl| declaration_line(&decl.name, decl.locations.iter().copied()))
        .collect();

    let used: BTreeSet<&str> = graph
        .elements()
        .iter()
        .flat_map(|element| element.annotations.names())
        .collect();
    for name in used {
        if declared.iter().any(|decl| decl.name == name) {
            continue;
        }
        if let Some(def) = registry.get(name) {
            lines.push(declaration_line(name, def.locations.iter().copied()));
        }
    }
    lines
}

fn declaration_line(name: &str, locations: impl Iterator<Item = ElementKind>) -> String {
    let locations: Vec<&str> = locations.map(|k| k.location_name()).collect();
    format!("directive @{} on {}", name, locations.join(" | "))
}

fn render_type(ty: &TypeNode) -> String {
    let keyword = match ty.kind {
        TypeKind::Object => "type",
        TypeKind::Enum => "enum",
    };
    let mut out = format!("{} {}{} {{\n", keyword, ty.name, render_annotations(&ty.annotations));

    let members: Vec<String> = match ty.kind {
        TypeKind::Object => ty.fields.iter().map(render_field).collect(),
        TypeKind::Enum => ty
            .values
            .iter()
            .map(|value| format!("{}{}", value.name, render_annotations(&value.annotations)))
            .collect(),
    };
    for member in members {
        out.push_str(INDENT);
        out.push_str(&member);
        out.push('\n');
    }

    out.push_str("}\n");
    out
}

fn render_field(field: &FieldNode) -> String {
    let arguments = if field.arguments.is_empty() {
        String::new()
    } else {
        let args: Vec<String> = field
            .arguments
            .iter()
            .map(|arg| format!("{}: {}", arg.name, arg.ty))
            .collect();
        format!("({})", args.join(", "))
    };
    format!(
        "{}{}: {}{}",
        field.name,
        arguments,
        field.ty,
        render_annotations(&field.annotations)
    )
}

fn render_annotations(annotations: &AnnotationSet) -> String {
    annotations
        .iter()
        .map(|annotation| {
            if annotation.arguments.is_empty() {
                return format!(" @{}", annotation.name);
            }
            let args: Vec<String> = annotation
                .arguments
                .iter()
                .map(|(name, value)| format!("{}: {}", name, render_value(value)))
                .collect();
            format!(" @{}({})", annotation.name, args.join(", "))
        })
        .collect()
}

// GraphQL input values: object keys are bare names, everything else matches JSON
fn render_value(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, render_value(v)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        other => other.to_string(),
    }
}

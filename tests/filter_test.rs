//! Integration tests for schema filtering and executable schema builds.

use std::collections::HashSet;

use serde_json::{json, Value};
use schema_visibility::{
    build_schema, filter, load_schema_value, reachable_types, DeploymentMode, DirectiveRegistry,
    FieldCoordinate, FilterOptions, LoadError, ResolveArgs, Resolver, ResolverError,
    ResolverTable, SchemaError, SchemaGraph,
};

fn load(document: Value) -> SchemaGraph {
    load_schema_value(document).unwrap()
}

fn run(graph: &SchemaGraph, mode: DeploymentMode) -> Result<SchemaGraph, SchemaError> {
    let registry = DirectiveRegistry::for_graph(graph);
    filter(graph, &registry, &FilterOptions::new(mode))
}

fn has_field(graph: &SchemaGraph, type_name: &str, field_name: &str) -> bool {
    graph
        .field(&FieldCoordinate::new(type_name, field_name))
        .is_some()
}

fn clients() -> SchemaGraph {
    load(json!({
        "types": [
            { "kind": "object", "name": "Client", "fields": [
                { "name": "fullName", "type": "String" },
                { "name": "secretField", "type": "String", "directives": ["private"] }
            ] },
            { "kind": "object", "name": "Query", "fields": [
                { "name": "clients", "type": "[Client]" }
            ] }
        ]
    }))
}

/// A schema exercising every element kind and visibility class.
fn crm() -> SchemaGraph {
    load(json!({
        "directives": [
            { "name": "deprecated", "locations": ["FIELD_DEFINITION", "ENUM_VALUE"] }
        ],
        "types": [
            { "kind": "object", "name": "Client", "directives": ["public"], "fields": [
                { "name": "fullName", "type": "String!" },
                { "name": "secretField", "type": "String", "directives": ["private"] },
                { "name": "tier", "type": "Tier" },
                { "name": "notes", "type": "[Note!]!",
                  "arguments": [{ "name": "kind", "type": "NoteKind" }] }
            ] },
            { "kind": "object", "name": "Note", "directives": ["private"], "fields": [
                { "name": "body", "type": "String" },
                { "name": "author", "type": "Client" }
            ] },
            { "kind": "enum", "name": "NoteKind", "values": [
                "CALL", { "name": "STAFF", "directives": ["internal"] }
            ] },
            { "kind": "enum", "name": "Tier", "directives": ["private"], "values": ["GOLD", "SILVER"] },
            { "kind": "object", "name": "Audit", "directives": ["internal"], "fields": [
                { "name": "entries", "type": "[String]" }
            ] },
            { "kind": "enum", "name": "Orphan", "values": ["X"] },
            { "kind": "object", "name": "Query", "fields": [
                { "name": "clients", "type": "[Client]" },
                { "name": "audit", "type": "Audit" },
                { "name": "legacy", "type": "Int", "directives": ["deprecated"] }
            ] }
        ]
    }))
}

// === Deployment Scenarios ===

mod scenarios {
    use super::*;

    #[test]
    fn client_public_mode_hides_secret_field() {
        let filtered = run(&clients(), DeploymentMode::Public).unwrap();
        assert!(has_field(&filtered, "Client", "fullName"));
        assert!(!has_field(&filtered, "Client", "secretField"));
    }

    #[test]
    fn client_private_mode_exposes_secret_field() {
        let filtered = run(&clients(), DeploymentMode::Private).unwrap();
        assert!(has_field(&filtered, "Client", "fullName"));
        assert!(has_field(&filtered, "Client", "secretField"));
    }

    #[test]
    fn root_returning_only_private_type_fails_in_public_mode() {
        let graph = load(json!({
            "types": [
                { "kind": "object", "name": "SecretThing", "directives": ["private"], "fields": [
                    { "name": "shhh", "type": "String" }
                ] },
                { "kind": "object", "name": "Query", "fields": [
                    { "name": "secretThings", "type": "[SecretThing]" }
                ] }
            ]
        }));

        let result = run(&graph, DeploymentMode::Public);
        assert!(matches!(
            result,
            Err(SchemaError::EmptyTypeAfterFiltering { type_name }) if type_name == "Query"
        ));

        // Private deployments keep the whole schema
        let filtered = run(&graph, DeploymentMode::Private).unwrap();
        assert_eq!(filtered, graph);
    }

    #[test]
    fn crm_public_mode() {
        let filtered = run(&crm(), DeploymentMode::Public).unwrap();

        let names: HashSet<&str> = filtered.type_names().collect();
        assert_eq!(names, HashSet::from(["Client", "Query"]));
        assert!(has_field(&filtered, "Client", "fullName"));
        assert!(!has_field(&filtered, "Client", "tier"));
        assert!(!has_field(&filtered, "Client", "notes"));
        assert!(!has_field(&filtered, "Query", "audit"));
        assert!(has_field(&filtered, "Query", "legacy"));
    }

    #[test]
    fn crm_private_mode() {
        let filtered = run(&crm(), DeploymentMode::Private).unwrap();

        let names: HashSet<&str> = filtered.type_names().collect();
        assert_eq!(names, HashSet::from(["Client", "Note", "NoteKind", "Tier", "Query"]));
        assert!(has_field(&filtered, "Client", "notes"));
        assert!(!has_field(&filtered, "Query", "audit"));

        let kinds = filtered.type_node("NoteKind").unwrap();
        assert!(kinds.value("CALL").is_some());
        assert!(kinds.value("STAFF").is_none());
    }

    #[test]
    fn crm_internal_mode_keeps_all_reachable() {
        let filtered = run(&crm(), DeploymentMode::Internal).unwrap();

        assert!(filtered.contains_type("Audit"));
        assert!(filtered.type_node("NoteKind").unwrap().value("STAFF").is_some());
        // Orphan is unreachable in every mode
        assert!(!filtered.contains_type("Orphan"));
    }
}

// === Output Invariants ===

mod invariants {
    use super::*;

    #[test]
    fn filtering_is_idempotent() {
        for mode in DeploymentMode::ALL {
            let once = run(&crm(), mode).unwrap();
            let twice = run(&once, mode).unwrap();
            assert_eq!(once, twice, "mode {}", mode);
        }
    }

    #[test]
    fn every_surviving_type_is_reachable() {
        for mode in DeploymentMode::ALL {
            let filtered = run(&crm(), mode).unwrap();
            let reachable = reachable_types(&filtered);
            for name in filtered.type_names() {
                assert!(reachable.contains(name), "{} unreachable in {} mode", name, mode);
            }
        }
    }

    #[test]
    fn no_dangling_references() {
        for mode in DeploymentMode::ALL {
            let filtered = run(&crm(), mode).unwrap();
            assert_eq!(filtered.find_dangling_reference(), None, "mode {}", mode);
        }
    }

    #[test]
    fn input_graph_is_not_mutated() {
        let graph = crm();
        let before = graph.clone();
        run(&graph, DeploymentMode::Public).unwrap();
        assert_eq!(graph, before);
    }

    #[test]
    fn wider_modes_expose_supersets() {
        let public = run(&crm(), DeploymentMode::Public).unwrap();
        let private = run(&crm(), DeploymentMode::Private).unwrap();
        let internal = run(&crm(), DeploymentMode::Internal).unwrap();

        let coords = |g: &SchemaGraph| -> HashSet<FieldCoordinate> {
            g.field_coordinates().into_iter().collect()
        };
        assert!(coords(&public).is_subset(&coords(&private)));
        assert!(coords(&private).is_subset(&coords(&internal)));
    }
}

// === Cascading Removal ===

mod cascade {
    use super::*;

    fn nested() -> SchemaGraph {
        load(json!({
            "types": [
                { "kind": "object", "name": "Ledger", "directives": ["internal"], "fields": [
                    { "name": "balance", "type": "Float" }
                ] },
                { "kind": "object", "name": "Account", "fields": [
                    { "name": "ledger", "type": "Ledger" }
                ] },
                { "kind": "object", "name": "Query", "fields": [
                    { "name": "ok", "type": "Boolean" },
                    { "name": "account", "type": "Account", "directives": ["private"] }
                ] }
            ]
        }))
    }

    #[test]
    fn empty_root_is_rejected() {
        let result = load_schema_value(json!({
            "types": [{ "kind": "object", "name": "Query" }]
        }));
        assert!(matches!(
            result,
            Err(LoadError::Schema(SchemaError::EmptyType { type_name })) if type_name == "Query"
        ));
    }

    #[test]
    fn empty_reachable_enum_is_rejected() {
        let result = load_schema_value(json!({
            "types": [
                { "kind": "enum", "name": "NoVals" },
                { "kind": "object", "name": "Query", "fields": [
                    { "name": "v", "type": "NoVals" }
                ] }
            ]
        }));
        assert!(matches!(
            result,
            Err(LoadError::Schema(SchemaError::EmptyType { type_name })) if type_name == "NoVals"
        ));
    }

    #[test]
    fn edited_graph_with_empty_root_fails() {
        let mut graph = clients();
        graph.remove_field("Query", "clients");

        for mode in DeploymentMode::ALL {
            let result = run(&graph, mode);
            assert!(matches!(
                result,
                Err(SchemaError::EmptyTypeAfterFiltering { type_name }) if type_name == "Query"
            ));
        }
    }

    #[test]
    fn unreachable_emptied_type_is_removed() {
        // Query.account is hidden, so the emptied Account is an orphan
        let filtered = run(&nested(), DeploymentMode::Public).unwrap();
        assert!(!filtered.contains_type("Account"));
        assert!(!filtered.contains_type("Ledger"));
        assert!(has_field(&filtered, "Query", "ok"));
    }

    #[test]
    fn reachable_emptied_type_fails() {
        let result = run(&nested(), DeploymentMode::Private);
        assert!(matches!(
            result,
            Err(SchemaError::EmptyTypeAfterFiltering { type_name }) if type_name == "Account"
        ));
    }

    #[test]
    fn field_taking_hidden_enum_is_removed() {
        let graph = load(json!({
            "types": [
                { "kind": "enum", "name": "Region", "directives": ["private"], "values": ["EU"] },
                { "kind": "object", "name": "Query", "fields": [
                    { "name": "ok", "type": "Boolean" },
                    { "name": "count", "type": "Int", "arguments": [{ "name": "region", "type": "Region!" }] }
                ] }
            ]
        }));

        let filtered = run(&graph, DeploymentMode::Public).unwrap();
        assert!(!has_field(&filtered, "Query", "count"));
        assert!(!filtered.contains_type("Region"));
    }

    #[test]
    fn emptied_reachable_enum_fails() {
        let graph = load(json!({
            "types": [
                { "kind": "enum", "name": "Flag", "values": [
                    { "name": "A", "directives": ["internal"] },
                    { "name": "B", "directives": ["private"] }
                ] },
                { "kind": "object", "name": "Query", "fields": [
                    { "name": "flag", "type": "Flag" }
                ] }
            ]
        }));

        let result = run(&graph, DeploymentMode::Public);
        assert!(matches!(
            result,
            Err(SchemaError::EmptyTypeAfterFiltering { type_name }) if type_name == "Flag"
        ));
    }

    #[test]
    fn hidden_mutation_root_fails() {
        let graph = load(json!({
            "schema": { "query": "Query", "mutation": "Mutation" },
            "types": [
                { "kind": "object", "name": "Mutation", "directives": ["private"], "fields": [
                    { "name": "reset", "type": "Boolean" }
                ] },
                { "kind": "object", "name": "Query", "fields": [{ "name": "ok", "type": "Boolean" }] }
            ]
        }));

        let result = run(&graph, DeploymentMode::Public);
        assert!(matches!(
            result,
            Err(SchemaError::RootOperationHidden { operation, type_name })
                if operation == "mutation" && type_name == "Mutation"
        ));
        assert!(run(&graph, DeploymentMode::Private).is_ok());
    }
}

// === Annotation Validation ===

mod validation {
    use super::*;

    fn annotated(directives: Value) -> SchemaGraph {
        load(json!({
            "types": [
                { "kind": "object", "name": "Query", "fields": [
                    { "name": "name", "type": "String", "directives": directives },
                    { "name": "ok", "type": "Boolean" }
                ] }
            ]
        }))
    }

    #[test]
    fn public_with_private_conflicts() {
        let result = run(&annotated(json!(["public", "private"])), DeploymentMode::Internal);
        assert!(matches!(
            result,
            Err(SchemaError::ConflictingVisibilityAnnotations { path, directives })
                if path == "Query.name" && directives == vec!["public", "private"]
        ));
    }

    #[test]
    fn public_with_internal_conflicts() {
        let result = run(&annotated(json!(["internal", "public"])), DeploymentMode::Public);
        assert!(matches!(
            result,
            Err(SchemaError::ConflictingVisibilityAnnotations { .. })
        ));
    }

    #[test]
    fn private_with_internal_means_internal() {
        let graph = annotated(json!(["private", "internal"]));
        assert!(!has_field(&run(&graph, DeploymentMode::Private).unwrap(), "Query", "name"));
        assert!(has_field(&run(&graph, DeploymentMode::Internal).unwrap(), "Query", "name"));
    }

    #[test]
    fn public_is_visible_in_every_mode() {
        let graph = annotated(json!(["public"]));
        for mode in DeploymentMode::ALL {
            assert!(has_field(&run(&graph, mode).unwrap(), "Query", "name"));
        }
    }

    #[test]
    fn undeclared_directive_rejected() {
        let result = run(&annotated(json!(["confidential"])), DeploymentMode::Internal);
        assert!(matches!(
            result,
            Err(SchemaError::InvalidDirectivePlacement { directive, .. }) if directive == "confidential"
        ));
    }

    #[test]
    fn declaration_narrowing_rejects_placement() {
        let graph = load(json!({
            "directives": [{ "name": "private", "locations": ["OBJECT"] }],
            "types": [
                { "kind": "object", "name": "Query", "fields": [
                    { "name": "name", "type": "String", "directives": ["private"] }
                ] }
            ]
        }));
        let result = run(&graph, DeploymentMode::Private);
        assert!(matches!(
            result,
            Err(SchemaError::InvalidDirectivePlacement { path, .. }) if path == "Query.name"
        ));
    }
}

// === Annotation Stripping ===

mod stripping {
    use super::*;

    #[test]
    fn strip_removes_visibility_directives_only() {
        let graph = load(json!({
            "directives": [
                { "name": "private", "locations": ["OBJECT", "FIELD_DEFINITION"] },
                { "name": "deprecated", "locations": ["FIELD_DEFINITION"] }
            ],
            "types": [
                { "kind": "object", "name": "Query", "fields": [
                    { "name": "name", "type": "String", "directives": ["private", "uppercase"] },
                    { "name": "old", "type": "Int", "directives": ["deprecated"] }
                ] }
            ]
        }));
        let registry = DirectiveRegistry::for_graph(&graph);
        let options = FilterOptions::new(DeploymentMode::Private).strip_annotations(true);
        let filtered = filter(&graph, &registry, &options).unwrap();

        let query = filtered.type_node("Query").unwrap();
        let name: Vec<&str> = query.field("name").unwrap().annotations.names().collect();
        assert_eq!(name, vec!["uppercase"]);
        assert!(query.field("old").unwrap().annotations.has("deprecated"));

        let declared: Vec<&str> = filtered
            .directive_declarations()
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(declared, vec!["deprecated"]);
    }
}

// === Executable Schema ===

mod executable {
    use super::*;

    fn library() -> SchemaGraph {
        load(json!({
            "types": [
                { "kind": "object", "name": "Book", "fields": [
                    { "name": "title", "type": "String" },
                    { "name": "author", "type": "String" },
                    { "name": "upperAuthor", "type": "String", "directives": ["uppercase"] },
                    { "name": "password", "type": "String", "directives": ["internal"] }
                ] },
                { "kind": "object", "name": "Secret", "directives": ["internal"], "fields": [
                    { "name": "value", "type": "String" }
                ] },
                { "kind": "object", "name": "Query", "fields": [
                    { "name": "books", "type": "[Book]",
                      "arguments": [{ "name": "author", "type": "String" }] },
                    { "name": "secret", "type": "Secret" }
                ] }
            ]
        }))
    }

    fn books() -> Value {
        json!([
            { "title": "The Awakening", "author": "kate chopin", "password": "p1" },
            { "title": "City of Glass", "author": "paul auster", "password": "p2" }
        ])
    }

    fn resolvers() -> ResolverTable {
        ResolverTable::new()
            .with(
                "Query",
                "books",
                Resolver::new(|args: ResolveArgs| async move {
                    let all = books();
                    let Some(author) = args.arguments.get("author").and_then(Value::as_str) else {
                        return Ok(all);
                    };
                    let matching: Vec<Value> = all
                        .as_array()
                        .into_iter()
                        .flatten()
                        .filter(|b| b["author"] == author)
                        .cloned()
                        .collect();
                    Ok(Value::Array(matching))
                }),
            )
            .with(
                "Book",
                "upperAuthor",
                Resolver::new(|args: ResolveArgs| async move {
                    Ok(args.parent.get("author").cloned().unwrap_or(Value::Null))
                }),
            )
    }

    fn build(mode: DeploymentMode, table: ResolverTable) -> schema_visibility::ExecutableSchema {
        let graph = library();
        let registry = DirectiveRegistry::for_graph(&graph);
        build_schema(&graph, &registry, table, &FilterOptions::new(mode)).unwrap()
    }

    #[tokio::test]
    async fn uppercase_author() {
        let schema = build(DeploymentMode::Public, resolvers());

        let books = schema
            .resolve_field(
                &FieldCoordinate::new("Query", "books"),
                ResolveArgs::new(Value::Null).with_argument("author", json!("kate chopin")),
            )
            .await
            .unwrap();
        let book = books[0].clone();
        assert_eq!(book["title"], "The Awakening");

        let upper = schema
            .resolve_field(&FieldCoordinate::new("Book", "upperAuthor"), ResolveArgs::new(book.clone()))
            .await
            .unwrap();
        assert_eq!(upper, json!("KATE CHOPIN"));

        // Undecorated field is untouched
        let author = schema
            .resolve_field(&FieldCoordinate::new("Book", "author"), ResolveArgs::new(book))
            .await
            .unwrap();
        assert_eq!(author, json!("kate chopin"));
    }

    #[tokio::test]
    async fn public_schema_drops_internal_elements() {
        let schema = build(DeploymentMode::Public, resolvers());

        assert_eq!(schema.mode(), DeploymentMode::Public);
        assert!(!schema.graph().contains_type("Secret"));
        assert!(!has_field(schema.graph(), "Book", "password"));

        let result = schema
            .resolve_field(
                &FieldCoordinate::new("Book", "password"),
                ResolveArgs::new(books()[0].clone()),
            )
            .await;
        assert!(matches!(result, Err(ResolverError::UnknownField { .. })));
    }

    #[tokio::test]
    async fn internal_schema_serves_internal_fields() {
        let schema = build(DeploymentMode::Internal, resolvers());

        let password = schema
            .resolve_field(
                &FieldCoordinate::new("Book", "password"),
                ResolveArgs::new(books()[1].clone()),
            )
            .await
            .unwrap();
        assert_eq!(password, json!("p2"));
    }

    #[tokio::test]
    async fn decorated_resolver_propagates_errors() {
        let table = ResolverTable::new().with(
            "Book",
            "upperAuthor",
            Resolver::new(|_| async { Err::<Value, _>(ResolverError::failed("catalog unavailable")) }),
        );
        let schema = build(DeploymentMode::Public, table);

        let result = schema
            .resolve_field(&FieldCoordinate::new("Book", "upperAuthor"), ResolveArgs::default())
            .await;
        assert_eq!(result, Err(ResolverError::failed("catalog unavailable")));
    }

    #[tokio::test]
    async fn decorated_resolver_passes_non_text_through() {
        let table = ResolverTable::new().with("Book", "upperAuthor", Resolver::constant(json!(7)));
        let schema = build(DeploymentMode::Public, table);

        let value = schema
            .resolve_field(&FieldCoordinate::new("Book", "upperAuthor"), ResolveArgs::default())
            .await
            .unwrap();
        assert_eq!(value, json!(7));
    }

    #[test]
    fn resolver_for_unknown_field_rejected() {
        let graph = library();
        let registry = DirectiveRegistry::for_graph(&graph);
        let table = ResolverTable::new().with("Book", "isbn", Resolver::constant(json!("x")));

        let result = build_schema(&graph, &registry, table, &FilterOptions::new(DeploymentMode::Internal));
        assert!(matches!(
            result,
            Err(SchemaError::UnknownResolverTarget { coordinate }) if coordinate == "Book.isbn"
        ));
    }
}

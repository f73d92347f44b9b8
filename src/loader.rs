//! Schema loading from various sources.
//!
//! Handles loading schema documents from files, strings, JSON values and
//! HTTP URLs, and checking them into a [`SchemaGraph`].

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;
use crate::graph::{SchemaDocument, SchemaGraph};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a schema from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// `LoadError::InvalidJson` if the file isn't a schema document, or
/// `LoadError::Schema` if the document violates a graph invariant.
pub fn load_schema(path: &Path) -> Result<SchemaGraph, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_schema_str(&content)
}

/// Load a schema from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't a schema document,
/// or `LoadError::Schema` if the document violates a graph invariant.
pub fn load_schema_str(content: &str) -> Result<SchemaGraph, LoadError> {
    let document: SchemaDocument =
        serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })?;
    Ok(document.into_graph()?)
}

/// Load a schema from an already-parsed JSON value.
///
/// # Errors
///
/// Same as [`load_schema_str`].
pub fn load_schema_value(value: Value) -> Result<SchemaGraph, LoadError> {
    let document: SchemaDocument =
        serde_json::from_value(value).map_err(|source| LoadError::InvalidJson { source })?;
    Ok(document.into_graph()?)
}

/// Load a schema from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails,
/// or the errors of [`load_schema_value`] for the response body.
#[cfg(feature = "remote")]
pub fn load_schema_url(url: &str) -> Result<SchemaGraph, LoadError> {
    let network_error = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    // Non-2xx responses fail before the body is parsed
    let body = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network_error)?;

    tracing::debug!(url, bytes = body.len(), "fetched schema");
    load_schema_str(&body)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a schema from a file path or URL.
///
/// Automatically detects whether the source is a URL or file path.
/// URL loading requires the `remote` feature.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub fn load_schema_auto(source: &str) -> Result<SchemaGraph, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_schema_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_schema(Path::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::graph::TypeKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CLIENTS: &str = r#"{
        "types": [
            { "kind": "object", "name": "Client", "directives": ["public"],
              "fields": [
                { "name": "fullName", "type": "String" },
                { "name": "secretField", "type": "String", "directives": ["private"] }
              ] },
            { "kind": "enum", "name": "SecretEnum", "directives": ["private"],
              "values": ["ONE", { "name": "TWO", "directives": ["internal"] }] },
            { "kind": "object", "name": "Query",
              "fields": [ { "name": "clients", "type": "[Client]" } ] }
        ]
    }"#;

    #[test]
    fn load_schema_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", CLIENTS).unwrap();

        let graph = load_schema(file.path()).unwrap();
        assert_eq!(graph.roots().query, "Query");
        assert!(graph.contains_type("Client"));
    }

    #[test]
    fn load_schema_file_not_found() {
        let result = load_schema(Path::new("/nonexistent/path.json"));
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn load_schema_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_schema(file.path());
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_schema_str_parses_shorthands() {
        let graph = load_schema_str(CLIENTS).unwrap();

        let secret = graph.type_node("SecretEnum").unwrap();
        assert_eq!(secret.kind, TypeKind::Enum);
        assert!(secret.annotations.has("private"));
        assert!(secret.value("ONE").unwrap().annotations.is_empty());
        assert!(secret.value("TWO").unwrap().annotations.has("internal"));

        let field = graph.type_node("Client").unwrap().field("secretField").unwrap();
        assert!(field.annotations.has("private"));
    }

    #[test]
    fn load_schema_str_invalid_type_reference() {
        let result = load_schema_str(
            r#"{"types": [{"kind": "object", "name": "Query",
                "fields": [{"name": "x", "type": "[String"}]}]}"#,
        );
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_schema_str_unknown_type() {
        let result = load_schema_str(
            r#"{"types": [{"kind": "object", "name": "Query",
                "fields": [{"name": "x", "type": "Missing"}]}]}"#,
        );
        assert!(matches!(
            result,
            Err(LoadError::Schema(SchemaError::UnknownTypeReference { .. }))
        ));
    }

    #[test]
    fn load_schema_value_custom_roots() {
        let graph = load_schema_value(serde_json::json!({
            "schema": { "query": "Root", "mutation": "Mutation" },
            "types": [
                { "kind": "object", "name": "Root", "fields": [{ "name": "ok", "type": "Boolean" }] },
                { "kind": "object", "name": "Mutation", "fields": [{ "name": "ping", "type": "String!" }] }
            ]
        }))
        .unwrap();
        assert_eq!(graph.roots().mutation.as_deref(), Some("Mutation"));
    }

    #[test]
    fn is_url_https() {
        assert!(is_url("https://example.com/schema.json"));
    }

    #[test]
    fn is_url_file_path() {
        assert!(!is_url("/path/to/schema.json"));
        assert!(!is_url("./schema.json"));
        assert!(!is_url("schema.json"));
    }

    #[test]
    fn load_schema_auto_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", CLIENTS).unwrap();

        let graph = load_schema_auto(file.path().to_str().unwrap()).unwrap();
        assert!(graph.contains_type("Query"));
    }

    #[test]
    fn document_round_trip_preserves_graph() {
        let graph = load_schema_str(CLIENTS).unwrap();
        let text = serde_json::to_string(&graph).unwrap();
        assert_eq!(load_schema_str(&text).unwrap(), graph);
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_schema_url_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/schema.json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(CLIENTS)
                .create();

            let graph = load_schema_url(&format!("{}/schema.json", server.url())).unwrap();
            assert!(graph.contains_type("Client"));
            mock.assert();
        }

        #[test]
        fn load_schema_url_404() {
            let mut server = mockito::Server::new();
            let _mock = server.mock("GET", "/missing.json").with_status(404).create();

            let result = load_schema_url(&format!("{}/missing.json", server.url()));
            assert!(matches!(result, Err(LoadError::NetworkError { .. })));
        }

        #[test]
        fn load_schema_auto_url() {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock("GET", "/schema.json")
                .with_status(200)
                .with_body(CLIENTS)
                .create();

            let result = load_schema_auto(&format!("{}/schema.json", server.url()));
            assert!(result.is_ok());
        }
    }
}

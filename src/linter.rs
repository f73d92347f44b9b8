//! Schema linting - static analysis of schema documents.
//!
//! Checks schema documents for:
//! - JSON syntax errors and references to undefined types
//! - Undeclared or misplaced directives
//! - Conflicting visibility annotations
//! - Deployment modes the schema cannot be filtered for
//! - Unreachable types and transforms on non-text fields (warnings)

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{LoadError, SchemaError};
use crate::filter::{filter, reachable_types};
use crate::graph::SchemaGraph;
use crate::loader::load_schema;
use crate::policy::VisibilityMarks;
use crate::registry::DirectiveRegistry;
use crate::types::{DeploymentMode, FilterOptions};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// Schema coordinate of the issue (e.g., "Client.secretField")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_schema_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += file_result.count(Severity::Error);
        total_warnings += file_result.count(Severity::Warning);
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

impl FileResult {
    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Lint a single schema file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut sink = Sink {
        file,
        diagnostics: Vec::new(),
    };

    match load_schema(file) {
        Ok(graph) => lint_graph(&graph, &mut sink),
        Err(LoadError::Schema(SchemaError::UnknownTypeReference { path, type_name })) => {
            sink.error("E002", path, format!("unknown type {}", type_name));
        }
        Err(e) => sink.error("E001", "/", format!("cannot load schema: {}", e)),
    }

    let diagnostics = sink.diagnostics;
    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics,
    }
}

/// Diagnostics collected for one file.
struct Sink<'a> {
    file: &'a Path,
    diagnostics: Vec<Diagnostic>,
}

impl Sink<'_> {
    fn push(&mut self, severity: Severity, code: &str, path: impl Into<String>, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.to_path_buf(),
            path: path.into(),
            message,
        });
    }

    fn error(&mut self, code: &str, path: impl Into<String>, message: String) {
        self.push(Severity::Error, code, path, message);
    }

    fn warning(&mut self, code: &str, path: impl Into<String>, message: String) {
        self.push(Severity::Warning, code, path, message);
    }

    fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

fn lint_graph(graph: &SchemaGraph, sink: &mut Sink<'_>) {
    let registry = DirectiveRegistry::for_graph(graph);

    check_annotations(graph, &registry, sink);

    // Filtering re-validates; only run it once annotations are clean
    if !sink.has_errors() {
        check_modes(graph, &registry, sink);
    }

    check_reachability(graph, sink);
    check_transforms(graph, &registry, sink);
}

fn check_annotations(graph: &SchemaGraph, registry: &DirectiveRegistry, sink: &mut Sink<'_>) {
    for element in graph.elements() {
        for name in element.annotations.names() {
            match registry.get(name) {
                None => sink.error(
                    "E003",
                    element.path.as_str(),
                    format!("undeclared directive @{}", name),
                ),
                Some(def) if !def.allows(element.kind) => sink.error(
                    "E004",
                    element.path.as_str(),
                    format!("@{} is not allowed on {}", name, element.kind),
                ),
                Some(_) => {}
            }
        }

        if VisibilityMarks::collect(element.annotations, registry).is_conflicting() {
            let names: Vec<String> = element
                .annotations
                .names()
                .filter(|name| registry.is_visibility_directive(name))
                .map(|name| format!("@{}", name))
                .collect();
            sink.error(
                "E005",
                element.path.as_str(),
                format!("conflicting visibility annotations: {}", names.join(", ")),
            );
        }
    }
}

fn check_modes(graph: &SchemaGraph, registry: &DirectiveRegistry, sink: &mut Sink<'_>) {
    for mode in DeploymentMode::ALL {
        if let Err(e) = filter(graph, registry, &FilterOptions::new(mode)) {
            sink.error(
                "E006",
                failing_path(&e),
                format!("schema cannot be filtered for {} mode: {}", mode, e),
            );
        }
    }
}

fn failing_path(error: &SchemaError) -> String {
    match error {
        SchemaError::EmptyTypeAfterFiltering { type_name }
        | SchemaError::RootOperationHidden { type_name, .. } => type_name.clone(),
        SchemaError::DanglingTypeReference { path, .. } => path.clone(),
        _ => "/".to_string(),
    }
}

fn check_reachability(graph: &SchemaGraph, sink: &mut Sink<'_>) {
    let reachable = reachable_types(graph);
    for name in graph.type_names() {
        if !reachable.contains(name) {
            sink.warning(
                "W001",
                name,
                format!("type {} is not reachable from any root operation", name),
            );
        }
    }
}

fn check_transforms(graph: &SchemaGraph, registry: &DirectiveRegistry, sink: &mut Sink<'_>) {
    for ty in graph.types() {
        for field in &ty.fields {
            let named = field.ty.named_type();
            if named == "String" || named == "ID" {
                continue;
            }
            for (name, _) in registry.transforms(&field.annotations) {
                sink.warning(
                    "W002",
                    format!("{}.{}", ty.name, field.name),
                    format!("@{} has no effect on a field of type {}", name, field.ty),
                );
            }
        }
    }
}

/// Collect all .json files in a path (file or directory).
fn collect_schema_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

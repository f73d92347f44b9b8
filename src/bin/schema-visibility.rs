//! Schema Visibility CLI
//!
//! Command-line interface for filtering and linting annotated schemas.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use schema_visibility::{
    filter, lint, load_schema_auto, render_sdl, DeploymentMode, DirectiveRegistry, FileStatus,
    FilterOptions, LintResult, Severity,
};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "schema-visibility")]
#[command(about = "Filter and lint schemas annotated with visibility directives")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a schema for a deployment mode
    Filter {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Deployment mode: public, private or internal
        /// (default: $SCHEMA_DEPLOYMENT_MODE, then $PRIVATE_DEPLOYMENT, then public)
        #[arg(long, short)]
        mode: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output format: json (default) or sdl
        #[arg(long, default_value = "json", value_parser = ["json", "sdl"])]
        format: String,

        /// Remove visibility directives from the filtered schema
        #[arg(long)]
        strip_annotations: bool,
    },

    /// Lint schema files for errors (syntax, unknown types, directive misuse)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Filter {
            schema,
            mode,
            output,
            pretty,
            format,
            strip_annotations,
        } => run_filter(FilterArgs {
            schema,
            mode,
            output,
            pretty,
            format,
            strip_annotations,
        }),
        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Log to stderr so stdout stays clean for schema output.
///
/// `RUST_LOG` sets the filter (default `warn`); `LOG_FORMAT=json` switches
/// to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .flatten_event(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .init();
    }
}

struct FilterArgs {
    schema: String,
    mode: Option<String>,
    output: Option<PathBuf>,
    pretty: bool,
    format: String,
    strip_annotations: bool,
}

fn run_filter(args: FilterArgs) -> Result<(), u8> {
    // Explicit flag > environment
    let mode = match &args.mode {
        Some(value) => value.parse::<DeploymentMode>(),
        None => DeploymentMode::from_env(),
    }
    .map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    let graph = load_schema_auto(&args.schema).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let registry = DirectiveRegistry::for_graph(&graph);
    let options = FilterOptions::new(mode).strip_annotations(args.strip_annotations);
    let filtered = filter(&graph, &registry, &options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    info!(mode = %mode, "schema filtered in {} mode", mode);

    let rendered = if args.format == "sdl" {
        render_sdl(&filtered, &registry)
    } else if args.pretty {
        serde_json::to_string_pretty(&filtered).map_err(serialize_error)?
    } else {
        serde_json::to_string(&filtered).map_err(serialize_error)?
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, &rendered).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", rendered);
        }
    }

    Ok(())
}

fn serialize_error(e: serde_json::Error) -> u8 {
    eprintln!("Error serializing output: {}", e);
    2
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(3);
    }

    let result = lint(path, strict);

    if format == "json" {
        let json = serde_json::to_string_pretty(&result).map_err(serialize_error)?;
        println!("{}", json);
    } else {
        print_lint_report(path, &result, strict, quiet);
    }

    if lint_passed(&result, strict) {
        Ok(())
    } else {
        Err(1)
    }
}

fn lint_passed(result: &LintResult, strict: bool) -> bool {
    result.is_ok() && (!strict || result.warnings == 0)
}

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

// Quiet mode keeps only failing files and their errors
fn print_lint_report(path: &Path, result: &LintResult, strict: bool, quiet: bool) {
    if !quiet {
        println!("Linting {}\n", path.display());
    }

    for file_result in &result.results {
        if quiet && file_result.status == FileStatus::Ok {
            continue;
        }
        let (color, tag) = match file_result.status {
            FileStatus::Ok => (GREEN, "ok"),
            FileStatus::Warning => (YELLOW, "warn"),
            FileStatus::Error => (RED, "fail"),
        };
        println!("{}{:<4}{} {}", color, tag, RESET, file_result.file.display());

        let shown = file_result
            .diagnostics
            .iter()
            .filter(|diag| !quiet || diag.severity == Severity::Error);
        for diag in shown {
            let color = match diag.severity {
                Severity::Error => RED,
                Severity::Warning => YELLOW,
            };
            println!("     {}{}{} {}: {}", color, diag.code, RESET, diag.path, diag.message);
        }
    }

    println!();
    if lint_passed(result, strict) {
        println!("{}{} files checked, all passed{}", GREEN, result.files_checked, RESET);
    } else {
        println!(
            "{}{} of {} files failed ({} errors, {} warnings){}",
            RED, result.failed, result.files_checked, result.errors, result.warnings, RESET
        );
    }
}

//! Binary entry point for the onto CLI.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use ontograph::{run_build, BuildConfig, OntoError};

// ============================================================================
// CLI Structure
// ============================================================================

/// Compile structural code facts into a queryable ontology.
#[derive(Parser, Debug)]
#[command(name = "onto", version, about = "Compile code facts into a queryable graph")]
struct Cli {
    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the fact graph for one repository commit.
    Build(BuildArgs),
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Path to the repository root.
    #[arg(long)]
    repo: PathBuf,

    /// Commit SHA to attribute facts (default: resolve HEAD).
    #[arg(long)]
    commit: Option<String>,

    /// Comma-separated languages to extract.
    #[arg(long, default_value = "ts")]
    langs: String,

    /// Enable the Next.js rule pack, framework pass, and shapes.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    nextjs: bool,

    /// Output directory, relative to the repo unless absolute.
    #[arg(long, default_value = ".ontology")]
    out_dir: PathBuf,

    /// Run the rule pipeline and write inferred statements.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    emit_inferred: bool,

    /// Emit the mount.json manifest.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    emit_mount: bool,

    /// Emit the ontology_meta.json summary.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    emit_meta: bool,

    /// Execute shape validation.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    validate: bool,

    /// Ignore pattern over repo-relative paths (repeatable).
    #[arg(long = "ignore")]
    ignore: Vec<String>,

    /// External extractor script (default: in-process fallback).
    #[arg(long = "extractor")]
    extractor_script: Option<PathBuf>,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::from(err.exit_code().code())
        }
    }
}

fn execute(command: Command) -> Result<(), OntoError> {
    match command {
        Command::Build(args) => {
            let config = BuildConfig {
                repo: args.repo,
                commit: args.commit,
                langs: args
                    .langs
                    .split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect(),
                nextjs: args.nextjs,
                out_dir: args.out_dir,
                emit_inferred: args.emit_inferred,
                emit_mount: args.emit_mount,
                emit_meta: args.emit_meta,
                run_validation: args.validate,
                ignore: args.ignore,
                extractor_script: args.extractor_script,
            };
            let summary = run_build(&config)?;
            info!(
                "compiled {} files into {} fact and {} inferred statements at {}",
                summary.files,
                summary.fact_triples,
                summary.inferred_triples,
                summary.commit_dir.display()
            );
            Ok(())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

// crates/erosita-xref-cli/src/main.rs
// ============================================================================
// Module: eROSITA XREF CLI Entry Point
// Description: Command dispatcher for cross-reference runs and config tools.
// Purpose: Run NED/SIMBAD cross-matches of a source catalog into SQLite.
// Dependencies: clap, erosita-xref-*, thiserror, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! `erosita-xref run` loads the configuration, reads a JSON-lines source
//! catalog, and cross-references it against each requested database, writing
//! `XREF_<DB>` tables into the configured `SQLite` file. Failed sources are
//! reported but do not fail the command; aborted database phases do.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use erosita_xref_cli::build_registry;
use erosita_xref_cli::catalog::MAX_CATALOG_BYTES;
use erosita_xref_cli::phase_line;
use erosita_xref_cli::read_catalog;
use erosita_xref_config::XrefConfig;
use erosita_xref_config::config_toml_example;
use erosita_xref_core::Angle;
use erosita_xref_core::QueryCoordinator;
use erosita_xref_core::XrefSession;
use erosita_xref_core::search_radii;
use erosita_xref_store_sqlite::SqliteXrefStore;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "erosita-xref", version, disable_help_subcommand = true)]
struct Cli {
    /// Log filter directive (overrides `RUST_LOG`), e.g. `debug`.
    #[arg(long, value_name = "FILTER", global = true)]
    log_level: Option<String>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Cross-reference a source catalog against reference databases.
    Run(RunCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
struct RunCommand {
    /// Optional config file path (defaults to erosita-xref.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// JSON-lines source catalog.
    #[arg(long, value_name = "PATH")]
    catalog: PathBuf,
    /// Database to query; repeat for several (defaults to all configured).
    #[arg(long = "database", value_name = "NAME")]
    databases: Vec<String>,
    /// Output `SQLite` file (overrides `store.path`).
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Replace existing `XREF_<DB>` tables.
    #[arg(long, action = ArgAction::SetTrue)]
    overwrite: bool,
    /// Sources per query group (overrides `run.group_size`).
    #[arg(long, value_name = "N")]
    group_size: Option<usize>,
    /// Requested worker count (overrides `run.max_workers`).
    #[arg(long, value_name = "N")]
    workers: Option<usize>,
    /// Single search radius in arcminutes applied to every source.
    #[arg(long, value_name = "ARCMIN")]
    radius_arcmin: Option<f64>,
    /// Also write the source catalog to the `EROSITA` table.
    #[arg(long, action = ArgAction::SetTrue)]
    export_sources: bool,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file.
    Validate(ConfigValidateCommand),
    /// Print the built-in configuration as TOML.
    Example,
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to erosita-xref.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;
    match cli.command {
        Commands::Run(command) => command_run(command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Installs the `fmt` subscriber on stderr.
fn init_tracing(level: Option<&str>) -> CliResult<()> {
    let filter = match level {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|err| CliError::new(format!("invalid log filter: {err}")))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| CliError::new(format!("failed to install logging: {err}")))
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let mut config = XrefConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    if let Some(output) = command.output {
        config.store.path = output;
    }
    if let Some(group_size) = command.group_size {
        config.run.group_size = group_size;
    }
    if let Some(workers) = command.workers {
        config.run.max_workers = workers;
    }
    config.run.overwrite |= command.overwrite;
    config.validate().map_err(|err| CliError::new(format!("invalid run options: {err}")))?;

    let sources = read_catalog(&command.catalog, MAX_CATALOG_BYTES)
        .map_err(|err| CliError::new(format!("failed to read catalog: {err}")))?;
    let radii = match command.radius_arcmin {
        Some(arcmin) if arcmin.is_finite() && arcmin > 0.0 => vec![Angle::from_arcmin(arcmin)],
        Some(arcmin) => {
            return Err(CliError::new(format!("radius must be positive, got {arcmin}")));
        }
        None => search_radii(&sources),
    };

    let registry = build_registry(&config).map_err(|err| CliError::new(err.to_string()))?;
    let databases: Vec<&str> = if command.databases.is_empty() {
        config.database_names()
    } else {
        command.databases.iter().map(String::as_str).collect()
    };
    if !databases.is_empty() && databases.iter().all(|name| registry.lookup(name).is_err()) {
        return Err(CliError::new(format!(
            "no configured database matches: {} (configured: {})",
            databases.join(", "),
            registry.names().join(", ")
        )));
    }

    let store = Arc::new(
        SqliteXrefStore::open(config.store.clone())
            .map_err(|err| CliError::new(format!("failed to open store: {err}")))?,
    );
    if command.export_sources {
        let written = store
            .write_source_table(&sources)
            .map_err(|err| CliError::new(format!("failed to export sources: {err}")))?;
        info!(rows = written, "source catalog exported");
    }

    let session = XrefSession::new(registry, QueryCoordinator::new(store));

    info!(
        sources = sources.len(),
        databases = databases.len(),
        store = %config.store.path.display(),
        "starting cross-reference"
    );
    let report = session.cross_reference(&databases, &sources, &radii, config.run);
    for phase in &report.phases {
        write_stdout_line(&phase_line(phase))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    write_stdout_line(&format!(
        "total failed sources: {}, aborted databases: {}",
        report.total_errors(),
        report.aborted_phases()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;

    if report.aborted_phases() > 0 { Ok(ExitCode::FAILURE) } else { Ok(ExitCode::SUCCESS) }
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => command_config_example(),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = XrefConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line(&format!(
        "config ok: {} databases ({})",
        config.databases.len(),
        config.database_names().join(", ")
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the built-in configuration.
fn command_config_example() -> CliResult<ExitCode> {
    let example = config_toml_example()
        .map_err(|err| CliError::new(format!("failed to render config: {err}")))?;
    write_stdout_line(example.trim_end())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

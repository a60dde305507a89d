// local-agent-cli/src/main.rs
// ============================================================================
// Module: Local Agent CLI Entry Point
// Description: Command dispatcher for the local agent binary.
// Purpose: Start the agent and inspect its configuration and capability set.
// Dependencies: clap, local-agent-config, local-agent-core, local-agent-server, tokio
// ============================================================================

//! ## Overview
//! `local-agent serve` loads `local-agent.toml`, applies the loopback bind
//! policy, and runs the HTTP agent until the process is stopped. The `config`
//! and `tools` subcommands are offline helpers. All output goes through the
//! write helpers at the bottom of this file.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use local_agent_cli::serve_policy::ALLOW_NON_LOOPBACK_ENV;
use local_agent_cli::serve_policy::BindOutcome;
use local_agent_cli::serve_policy::enforce_local_only;
use local_agent_cli::serve_policy::resolve_allow_non_loopback;
use local_agent_config::AgentConfig;
use local_agent_config::config_toml_example;
use local_agent_core::ToolName;
use local_agent_server::AgentServer;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "local-agent", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the local agent HTTP server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Capability set utilities.
    Tools {
        /// Selected tools subcommand.
        #[command(subcommand)]
        command: ToolsCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to local-agent.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Allow binding to non-loopback addresses (requires an agent token).
    #[arg(long, action = ArgAction::SetTrue)]
    allow_non_loopback: bool,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a local agent configuration file.
    Validate(ConfigValidateCommand),
    /// Print an example configuration file.
    Example,
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to local-agent.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Tools subcommands.
#[derive(Subcommand, Debug)]
enum ToolsCommand {
    /// List every tool with its safety class.
    List(ToolsListCommand),
}

/// Arguments for `tools list`.
#[derive(Args, Debug)]
struct ToolsListCommand {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Output formats for listing commands.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// One `name<TAB>class` line per tool.
    Text,
    /// A JSON array of `{ name, class }` objects.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a human-readable message.
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
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Tools {
            command: ToolsCommand::List(command),
        } => command_tools_list(&command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = AgentConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let allow_non_loopback = resolve_allow_non_loopback(command.allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    let outcome = enforce_local_only(&config, allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    if outcome.network_exposed {
        warn_network_exposure(&outcome)?;
    }
    let server = AgentServer::from_config(&config)
        .map_err(|err| CliError::new(format!("failed to initialize agent: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("agent stopped: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Emits a warning banner when the agent listens beyond loopback.
fn warn_network_exposure(outcome: &BindOutcome) -> CliResult<()> {
    let message = format!(
        "WARNING: local agent exposed on {} ({ALLOW_NON_LOOPBACK_ENV} opt-in); anyone holding \
         the agent token can run host tools.",
        outcome.bind_addr
    );
    write_stderr_line(&message).map_err(|err| CliError::new(output_error("stderr", &err)))
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => {
            write_stdout_bytes(config_toml_example().as_bytes())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes `config validate`.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = AgentConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config invalid: {err}")))?;
    write_stdout_line(&validation_summary(&config))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Describes a validated config in one line.
fn validation_summary(config: &AgentConfig) -> String {
    let source = config
        .source_path
        .as_ref()
        .map_or_else(|| "built-in defaults".to_string(), |path| path.display().to_string());
    format!(
        "config valid: {source} (bind {}, {} sandbox roots, {} apps, {} urls, {} projects)",
        config.server.bind,
        config.sandbox.roots.len(),
        config.apps.len(),
        config.urls.len(),
        config.projects.len()
    )
}

// ============================================================================
// SECTION: Tools Command
// ============================================================================

/// Executes `tools list`.
fn command_tools_list(command: &ToolsListCommand) -> CliResult<ExitCode> {
    write_stdout_bytes(render_tools_list(command.format)?.as_bytes())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Renders the capability set in the requested format.
fn render_tools_list(format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(ToolName::all()
            .iter()
            .map(|tool| format!("{}\t{}\n", tool.as_str(), tool.class().as_str()))
            .collect()),
        OutputFormat::Json => {
            let tools: Vec<Value> = ToolName::all()
                .iter()
                .map(|tool| json!({"name": tool.as_str(), "class": tool.class().as_str()}))
                .collect();
            let mut rendered = serde_json::to_string_pretty(&tools)
                .map_err(|err| CliError::new(format!("failed to render tools: {err}")))?;
            rendered.push('\n');
            Ok(rendered)
        }
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
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

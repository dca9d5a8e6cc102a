//! docgraph CLI binary entry point.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use docgraph::cli::{run_ids, run_resolve, OutputFormat};
use docgraph::error::{DocGraphError, OutputErrorCode};
use docgraph::output::{emit_response, ErrorResponse};
use docgraph::resolve::ResolveOptions;

/// Resolve `<inheritdoc>` documentation across a type hierarchy.
#[derive(Parser, Debug)]
#[command(name = "docgraph", version, about, long_about = None)]
struct Cli {
    /// Log level for tracing output (RUST_LOG overrides).
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve documentation for every type and member.
    Resolve {
        #[command(flatten)]
        inputs: Inputs,

        /// Output format.
        #[arg(long, value_enum, default_value = "json")]
        format: Format,

        /// Leave elements without documentation empty instead of inheriting.
        #[arg(long)]
        no_inherit_missing: bool,

        /// Keep searching transitive ancestors when no direct parent has content.
        #[arg(long)]
        search_ancestors: bool,

        /// Resolve on a single thread.
        #[arg(long)]
        sequential: bool,
    },
    /// List the identifier of every type and member.
    Ids {
        #[command(flatten)]
        inputs: Inputs,
    },
}

/// Input files shared by all subcommands.
#[derive(Args, Debug)]
struct Inputs {
    /// Model file (JSON) describing declared types and members.
    #[arg(long)]
    model: PathBuf,

    /// Documentation file; repeat to merge several (later files win).
    #[arg(long = "docs")]
    docs: Vec<PathBuf>,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
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

/// Output format for `resolve`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum Format {
    /// JSON response envelope (default).
    #[default]
    Json,
    /// Documentation file.
    Xml,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Xml => OutputFormat::Xml,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => return report_error(&usage_error(&err)),
    };

    init_tracing(cli.log_level);

    match execute(cli.command) {
        Ok(output) => {
            let mut stdout = io::stdout();
            if writeln!(stdout, "{}", output.trim_end()).is_err() {
                return ExitCode::from(OutputErrorCode::InternalError.code());
            }
            ExitCode::SUCCESS
        }
        Err(err) => report_error(&err),
    }
}

/// Convert a clap parse failure into an invalid-arguments error.
fn usage_error(err: &clap::Error) -> DocGraphError {
    let rendered = err.to_string();
    let message = rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string();
    DocGraphError::invalid_args(message)
}

/// Print the JSON error envelope and pick the exit status.
fn report_error(err: &DocGraphError) -> ExitCode {
    let response = ErrorResponse::from_error(err);

    // Errors go to stdout as JSON, like every other response
    let _ = emit_response(&response, &mut io::stdout());

    ExitCode::from(OutputErrorCode::from(err).code())
}

fn execute(command: Command) -> Result<String, DocGraphError> {
    match command {
        Command::Resolve {
            inputs,
            format,
            no_inherit_missing,
            search_ancestors,
            sequential,
        } => {
            let options = ResolveOptions::default()
                .with_inherit_missing(!no_inherit_missing)
                .with_search_ancestors(search_ancestors)
                .with_parallel(!sequential);
            run_resolve(&inputs.model, &inputs.docs, format.into(), options)
        }
        Command::Ids { inputs } => run_ids(&inputs.model, &inputs.docs),
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

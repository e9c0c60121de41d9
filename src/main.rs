//! Binary entry point for the commentator CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Annotate a file in place
//! commentator src/geometry.py
//!
//! # Preview changes for a whole package as a unified diff
//! commentator --dry-run src/
//!
//! # Bilingual docstrings, machine-readable report
//! commentator --translate Spanish --json src/
//! ```

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use commentator::annotate::AnnotateOptions;
use commentator::cli::{render_text_report, run_annotate, RunOptions};
use commentator::files::collect_input_files;
use commentator::generate::prompt::translation_directive;
use commentator::generate::OpenAiGenerator;
use commentator_core::config::Config;
use commentator_core::diagnostics::{FanoutSink, LogFileSink, TracingSink};
use commentator_core::error::{CommentatorError, OutputErrorCode};
use commentator_core::output::{emit_response, ErrorResponse};

/// Environment variable holding the generation API key.
const API_KEY_ENV: &str = "OPENAI_API_KEY";

// ============================================================================
// CLI Structure
// ============================================================================

/// Add docstrings and type annotations to Python functions.
///
/// Every rewrite is checked to be the same program as before, apart from
/// documentation and annotations, before it is written back.
#[derive(Parser, Debug)]
#[command(
    name = "commentator",
    version,
    about = "Add docstrings and type annotations to Python functions"
)]
struct Cli {
    /// Files or directories to annotate. Directories are searched for `.py`
    /// files.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// API key for the generation service (default: $OPENAI_API_KEY).
    #[arg(long)]
    api_key: Option<String>,

    /// Also write documentation in this human language.
    #[arg(long, value_name = "LANGUAGE")]
    translate: Option<String>,

    /// Generation attempts per function.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: Option<u32>,

    /// Model name to request.
    #[arg(long)]
    model: Option<String>,

    /// Configuration file (default: ./commentator.toml, then the user
    /// config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a unified diff instead of writing files.
    #[arg(long)]
    dry_run: bool,

    /// File receiving rejected candidates (default: commentator.log).
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Format of tracing output on stderr.
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Emit the run report as JSON on stdout.
    #[arg(long)]
    json: bool,
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

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level, cli.log_format);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON so scripted callers see one format
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Resolve configuration, build collaborators, and run.
fn execute(cli: Cli) -> Result<(), CommentatorError> {
    let cwd = env::current_dir()
        .map_err(|e| CommentatorError::internal(format!("cannot read current directory: {}", e)))?;
    let (mut config, loaded_from) = Config::discover(cli.config.as_deref(), &cwd)?;
    if let Some(path) = &loaded_from {
        tracing::debug!(config = %path.display(), "loaded configuration");
    }
    apply_overrides(&mut config, &cli);

    let api_key = cli
        .api_key
        .clone()
        .or_else(|| env::var(API_KEY_ENV).ok());
    let mut generator = OpenAiGenerator::new(&config.generation, api_key);

    let log_file = config.annotate.log_file.clone();
    let log_sink = LogFileSink::open(&log_file).map_err(|e| {
        CommentatorError::apply(
            format!("cannot open log file: {}", e),
            log_file.display().to_string(),
        )
    })?;
    let mut sink = FanoutSink::new().with(TracingSink).with(log_sink);

    let files = collect_input_files(&cli.paths)?;
    let options = RunOptions {
        annotate: AnnotateOptions {
            max_attempts: config.annotate.max_attempts,
            translation: translation_directive(config.annotate.translate.as_deref()),
        },
        dry_run: cli.dry_run,
    };

    let report = run_annotate(&files, &options, &mut generator, &mut sink)?;

    let mut stdout = io::stdout();
    if cli.json {
        emit_response(&report, &mut stdout)
            .map_err(|e| CommentatorError::internal(format!("failed to write report: {}", e)))?;
    } else {
        write!(stdout, "{}", render_text_report(&report))
            .map_err(|e| CommentatorError::internal(format!("failed to write report: {}", e)))?;
    }
    let _ = stdout.flush();
    Ok(())
}

/// Command-line flags win over the configuration file.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.generation.model = model.clone();
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.annotate.max_attempts = max_attempts;
    }
    if let Some(log_file) = &cli.log_file {
        config.annotate.log_file = log_file.clone();
    }
    if let Some(language) = &cli.translate {
        config.annotate.translate = Some(language.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["commentator", "src/"]).unwrap();
        assert_eq!(cli.paths, vec![PathBuf::from("src/")]);
        assert!(!cli.dry_run);
        assert!(!cli.json);
        assert!(cli.max_attempts.is_none());
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn paths_are_required() {
        assert!(Cli::try_parse_from(["commentator"]).is_err());
    }

    #[test]
    fn zero_attempts_is_rejected() {
        assert!(Cli::try_parse_from(["commentator", "--max-attempts", "0", "a.py"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "commentator",
            "--model",
            "gpt-4o",
            "--max-attempts",
            "5",
            "--translate",
            "German",
            "--log-file",
            "run.log",
            "a.py",
        ])
        .unwrap();
        let mut config = Config::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.generation.model, "gpt-4o");
        assert_eq!(config.annotate.max_attempts, 5);
        assert_eq!(config.annotate.translate.as_deref(), Some("German"));
        assert_eq!(config.annotate.log_file, PathBuf::from("run.log"));
    }
}

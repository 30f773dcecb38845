// taxgrid: payroll tax reconciliation, headless

mod config;
mod exit_codes;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

/// Environment variable holding a tracing filter directive, e.g. `taxgrid_engine=debug`.
const LOG_ENV: &str = "TAXGRID_LOG";

#[derive(Parser)]
#[command(name = "taxgrid")]
#[command(about = "Recompute payroll income tax and report deviations from the reported figures")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log pipeline progress to stderr (TAXGRID_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the deviation report workbook from a payroll sheet
    #[command(after_help = "\
Examples:
  taxgrid report payroll.xlsx
  taxgrid report payroll.xlsx -o out/svod.xlsx
  taxgrid report payroll.csv --delimiter ';' --json
  TAXGRID_CONFIG=taxgrid.toml taxgrid report payroll.xls")]
    Report {
        /// Payroll sheet (xlsx, xlsm, xlsb, xls, ods, csv, tsv)
        input: PathBuf,

        /// Report path [default: output.file_name from config, in the current directory]
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,

        /// Print the run summary as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Recompute tax and list every record by deviation, without writing a report
    #[command(after_help = "\
Examples:
  taxgrid check payroll.xlsx
  taxgrid check payroll.xlsx --json
  taxgrid check payroll.xlsx --strict-exit   # exit 1 on any deviation")]
    Check {
        /// Payroll sheet (xlsx, xlsm, xlsb, xls, ods, csv, tsv)
        input: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        /// Print summary and records as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Exit 1 when any record deviates
        #[arg(long)]
        strict_exit: bool,
    },

    /// Configuration file commands
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

/// Options shared by commands that read a payroll sheet.
#[derive(clap::Args)]
struct SourceArgs {
    /// TOML config file
    #[arg(long, env = "TAXGRID_CONFIG")]
    config: Option<PathBuf>,

    /// CSV field delimiter (single character, or `tab`); overrides the config
    #[arg(long)]
    delimiter: Option<String>,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  taxgrid-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

/// stderr subscriber for the pipeline. Nothing is installed globally.
fn log_dispatch(verbose: bool) -> tracing::Dispatch {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::Dispatch::new(subscriber)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let dispatch = log_dispatch(cli.verbose);

    let result = match cli.command {
        Commands::Report { input, output, source, json } => {
            report::cmd_report(input, output, source.config, source.delimiter, json, dispatch)
        }
        Commands::Check { input, source, json, strict_exit } => {
            report::cmd_check(input, source.config, source.delimiter, json, strict_exit, dispatch)
        }
        Commands::Config(cmd) => config::cmd_config(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

//! `taxgrid config`: config file handling shared by all commands.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use taxgrid_recon::config::parse_delimiter;
use taxgrid_recon::ReconConfig;

use crate::exit_codes::EXIT_INVALID_CONFIG;
use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Parse and validate a config file without running anything
    #[command(after_help = "\
Examples:
  taxgrid config validate taxgrid.toml")]
    Validate {
        /// Path to the TOML config file
        file: PathBuf,
    },
}

pub fn cmd_config(cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Validate { file } => cmd_config_validate(&file),
    }
}

fn cmd_config_validate(path: &Path) -> Result<(), CliError> {
    let config = ReconConfig::load(path).map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))?;
    let s = &config.schedule;
    eprintln!(
        "valid: threshold {}, rates {} / {}, report '{}' (sheet '{}')",
        s.threshold, s.lower_rate, s.upper_rate, config.output.file_name, config.output.sheet_name,
    );
    Ok(())
}

/// Config from `path`, or built-in defaults. A `--delimiter` flag wins over
/// the file's `input.csv_delimiter`.
pub fn load_config(path: Option<&Path>, delimiter: Option<&str>) -> Result<ReconConfig, CliError> {
    let mut config = match path {
        Some(p) => ReconConfig::load(p).map_err(|e| {
            CliError::new(EXIT_INVALID_CONFIG, e.to_string())
                .with_hint("run `taxgrid config validate <FILE>` for details")
        })?,
        None => ReconConfig::default(),
    };

    if let Some(d) = delimiter {
        parse_delimiter(d).map_err(|e| CliError::args(format!("--delimiter: {e}")))?;
        config.input.csv_delimiter = Some(d.to_string());
    }

    Ok(config)
}

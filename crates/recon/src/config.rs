use std::path::Path;

use serde::Deserialize;
use taxgrid_engine::TaxSchedule;
use taxgrid_io::{ReadOptions, WriteOptions, REPORT_FILE_NAME};

use crate::error::ConfigError;

/// Characters Excel refuses in worksheet names.
const SHEET_NAME_FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];
const SHEET_NAME_MAX_CHARS: usize = 31;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration. Every section and field is optional; an empty file
/// reproduces the built-in defaults.
///
/// ```toml
/// [schedule]
/// threshold = 5000000
/// lower_rate = 0.13
/// upper_rate = 0.15
///
/// [input]
/// max_rows = 100000
/// max_cols = 256
/// csv_delimiter = ";"
///
/// [output]
/// file_name = "report.xlsx"
/// sheet_name = "Sheet1"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconConfig {
    pub schedule: TaxSchedule,
    pub input: InputConfig,
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Input + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub max_rows: usize,
    pub max_cols: usize,
    /// Single ASCII character. Unset means sniff from the file.
    pub csv_delimiter: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        let limits = ReadOptions::default();
        Self {
            max_rows: limits.max_rows,
            max_cols: limits.max_cols,
            csv_delimiter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub file_name: String,
    pub sheet_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_name: REPORT_FILE_NAME.to_string(),
            sheet_name: WriteOptions::default().sheet_name,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing + validation
// ---------------------------------------------------------------------------

impl ReconConfig {
    /// Parse and validate a TOML config string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule
            .validate()
            .map_err(|e| ConfigError::Validation(format!("schedule: {e}")))?;

        // A valid sheet needs two header rows, one data row and six columns.
        if self.input.max_rows < 3 {
            return Err(ConfigError::Validation(format!(
                "input.max_rows must be at least 3, got {}",
                self.input.max_rows
            )));
        }
        if self.input.max_cols < 6 {
            return Err(ConfigError::Validation(format!(
                "input.max_cols must be at least 6, got {}",
                self.input.max_cols
            )));
        }
        if let Some(ref d) = self.input.csv_delimiter {
            parse_delimiter(d)?;
        }

        let file_name = &self.output.file_name;
        let stem_ok = file_name
            .to_ascii_lowercase()
            .strip_suffix(".xlsx")
            .is_some_and(|stem| !stem.is_empty());
        if !stem_ok {
            return Err(ConfigError::Validation(format!(
                "output.file_name must end in .xlsx, got '{file_name}'"
            )));
        }
        if file_name.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "output.file_name must be a bare file name, got '{file_name}'"
            )));
        }

        let sheet = &self.output.sheet_name;
        let len = sheet.chars().count();
        if len == 0 || len > SHEET_NAME_MAX_CHARS {
            return Err(ConfigError::Validation(format!(
                "output.sheet_name must be 1-{SHEET_NAME_MAX_CHARS} characters, got {len}"
            )));
        }
        if let Some(c) = sheet.chars().find(|c| SHEET_NAME_FORBIDDEN.contains(c)) {
            return Err(ConfigError::Validation(format!(
                "output.sheet_name contains forbidden character '{c}'"
            )));
        }

        Ok(())
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            max_rows: self.input.max_rows,
            max_cols: self.input.max_cols,
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            sheet_name: self.output.sheet_name.clone(),
        }
    }

    /// Configured CSV delimiter as a byte. `None` when unset or invalid
    /// (invalid values are rejected by [`validate`](Self::validate)).
    pub fn csv_delimiter(&self) -> Option<u8> {
        self.input.csv_delimiter.as_deref().and_then(|d| parse_delimiter(d).ok())
    }
}

/// Accepts a single ASCII character; `\t` and `tab` name the tab character.
pub fn parse_delimiter(s: &str) -> Result<u8, ConfigError> {
    match s {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' && c != '\r' => Ok(c as u8),
        _ => Err(ConfigError::Validation(format!(
            "delimiter must be a single ASCII character, got '{s}'"
        ))),
    }
}

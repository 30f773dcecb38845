// Source file → RawGrid
//
// Workbook formats (xlsx, xlsm, xlsb, xls, ods) go through calamine, delimited
// text through the csv crate. Only the first worksheet is read.

use std::fmt;
use std::path::Path;

use taxgrid_engine::RawGrid;

/// How to interpret the source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Any spreadsheet format calamine can detect.
    Workbook,
    /// Delimited text. `None` sniffs the delimiter from the first lines.
    Csv { delimiter: Option<u8> },
}

impl InputFormat {
    /// Pick a format from the file extension. Unknown extensions are treated as workbooks.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Self::Csv { delimiter: None },
            "tsv" | "tab" => Self::Csv { delimiter: Some(b'\t') },
            _ => Self::Workbook,
        }
    }

    /// Override the delimiter for CSV input. No effect on workbooks.
    pub fn with_delimiter(self, delimiter: Option<u8>) -> Self {
        match (self, delimiter) {
            (Self::Csv { .. }, Some(d)) => Self::Csv { delimiter: Some(d) },
            (other, _) => other,
        }
    }
}

/// Upper bounds on the grid held in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    pub max_rows: usize,
    pub max_cols: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_rows: 100_000,
            max_cols: 256,
        }
    }
}

impl ReadOptions {
    pub(crate) fn check(&self, rows: usize, cols: usize) -> Result<(), GridError> {
        if rows > self.max_rows || cols > self.max_cols {
            return Err(GridError::TooLarge {
                rows,
                cols,
                max_rows: self.max_rows,
                max_cols: self.max_cols,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// File could not be read from disk.
    Io(String),
    /// Not a readable spreadsheet.
    Open(String),
    /// Workbook has no worksheets.
    NoSheets,
    /// First worksheet could not be read.
    Sheet(String),
    /// Malformed delimited text.
    Csv(String),
    /// Grid exceeds the configured limits.
    TooLarge {
        rows: usize,
        cols: usize,
        max_rows: usize,
        max_cols: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "cannot read file: {msg}"),
            Self::Open(msg) => write!(f, "failed to open spreadsheet: {msg}"),
            Self::NoSheets => write!(f, "spreadsheet contains no sheets"),
            Self::Sheet(msg) => write!(f, "failed to read first sheet: {msg}"),
            Self::Csv(msg) => write!(f, "CSV parse error: {msg}"),
            Self::TooLarge { rows, cols, max_rows, max_cols } => write!(
                f,
                "grid of {rows}x{cols} exceeds the {max_rows}x{max_cols} limit"
            ),
        }
    }
}

impl std::error::Error for GridError {}

/// Read the first sheet of the file at `path`.
pub fn read_grid(path: &Path, options: &ReadOptions) -> Result<RawGrid, GridError> {
    let bytes = std::fs::read(path).map_err(|e| GridError::Io(format!("{}: {e}", path.display())))?;
    read_grid_from_bytes(&bytes, InputFormat::from_path(path), options)
}

/// Read the first sheet from in-memory file contents.
pub fn read_grid_from_bytes(
    bytes: &[u8],
    format: InputFormat,
    options: &ReadOptions,
) -> Result<RawGrid, GridError> {
    let grid = match format {
        InputFormat::Workbook => crate::xlsx::read_first_sheet(bytes, options)?,
        InputFormat::Csv { delimiter } => crate::csv::read_grid(bytes, delimiter, options)?,
    };
    tracing::debug!(rows = grid.height(), cols = grid.width(), ?format, "read source grid");
    Ok(grid)
}

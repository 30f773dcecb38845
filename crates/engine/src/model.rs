use serde::Serialize;

use crate::tax::TaxSchedule;

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// A single untyped cell as it came out of the source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellData {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellData {
    /// True for empty cells and for text that is blank after trimming.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// String form used for header comparison and text fields.
    /// Empty cells become "".
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(*n),
        }
    }
}

impl From<&str> for CellData {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }
}

impl From<f64> for CellData {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Row-major grid of untyped cells. Rows may be ragged; missing trailing
/// cells read as `CellData::Empty`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    pub rows: Vec<Vec<CellData>>,
}

static EMPTY_CELL: CellData = CellData::Empty;

impl RawGrid {
    pub fn new(rows: Vec<Vec<CellData>>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellData {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// First `len` cells of a row as header strings, padded with "".
    pub fn header_prefix(&self, row: usize, len: usize) -> Vec<String> {
        (0..len).map(|col| self.cell(row, col).to_text()).collect()
    }
}

// ---------------------------------------------------------------------------
// Typed records
// ---------------------------------------------------------------------------

/// One validated payroll row. Only built by the extractor, with every field present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayrollRecord {
    pub branch: String,
    pub employee: String,
    pub tax_base: f64,
    pub reported_tax: f64,
}

/// A payroll record plus the recomputed tax and its deviation from the reported figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: PayrollRecord,
    pub calculated_tax: f64,
    pub deviation: f64,
}

impl EnrichedRecord {
    pub fn new(record: PayrollRecord, schedule: &TaxSchedule) -> Self {
        let calculated_tax = schedule.tax(record.tax_base);
        let deviation = crate::tax::deviation(record.reported_tax, calculated_tax);
        Self {
            record,
            calculated_tax,
            deviation,
        }
    }

    /// Reported and recomputed figures agree exactly.
    pub fn is_match(&self) -> bool {
        self.deviation == 0.0
    }
}

/// Format a number the way spreadsheets show it: integers without decimals.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

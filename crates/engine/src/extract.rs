//! Structural validation of the two-row-header payroll layout and
//! conversion of the data rows into [`PayrollRecord`]s.
//!
//! Checks run in a fixed order and the first failure wins:
//! row count, column count, header rows, then per-row filtering.

use crate::error::ExtractionError;
use crate::model::{CellData, PayrollRecord, RawGrid};

/// Expected first header row (first six cells).
pub const HEADER_ROW_1: [&str; 6] = [
    "Филиал",
    "Сотрудник",
    "Доход",
    "Вычеты",
    "Налоговая база",
    "Налог",
];

/// Expected second header row (first seven cells).
pub const HEADER_ROW_2: [&str; 7] = [
    "",
    "",
    "Начислено",
    "Вычеты всего",
    "",
    "Исчислено всего",
    "Удержано всего",
];

pub const MIN_COLUMNS: usize = 6;
pub const HEADER_ROWS: usize = 2;

/// Source column for each record field.
const BRANCH_COL: usize = 0;
const EMPLOYEE_COL: usize = 1;
const TAX_BASE_COL: usize = 4;
const REPORTED_TAX_COL: usize = 5;

const TAX_BASE_FIELD: &str = "Налоговая база";
const REPORTED_TAX_FIELD: &str = "Исчислено всего";

/// Counters for a successful extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub data_rows: usize,
    pub dropped_rows: usize,
}

/// Validate `grid` and return one record per complete data row.
pub fn extract(grid: &RawGrid) -> Result<Vec<PayrollRecord>, ExtractionError> {
    extract_with_stats(grid).map(|(records, _)| records)
}

/// Same as [`extract`], also reporting how many rows were dropped.
pub fn extract_with_stats(
    grid: &RawGrid,
) -> Result<(Vec<PayrollRecord>, ExtractStats), ExtractionError> {
    validate_structure(grid)?;

    let mut records = Vec::new();
    let mut stats = ExtractStats::default();

    for offset in HEADER_ROWS..grid.height() {
        stats.data_rows += 1;

        let pick = |col: usize| grid.cell(offset, col);
        let branch = pick(BRANCH_COL);
        let employee = pick(EMPLOYEE_COL);
        let tax_base = pick(TAX_BASE_COL);
        let reported_tax = pick(REPORTED_TAX_COL);

        if [branch, employee, tax_base, reported_tax].iter().any(|c| c.is_missing()) {
            stats.dropped_rows += 1;
            continue;
        }

        let sheet_row = offset + 1;
        records.push(PayrollRecord {
            branch: branch.to_text(),
            employee: employee.to_text(),
            tax_base: to_number(tax_base, sheet_row, TAX_BASE_FIELD)?,
            reported_tax: to_number(reported_tax, sheet_row, REPORTED_TAX_FIELD)?,
        });
    }

    if stats.dropped_rows > 0 {
        tracing::warn!(dropped = stats.dropped_rows, "dropped rows with missing required fields");
    }

    if records.is_empty() {
        return Err(ExtractionError::EmptyAfterFiltering);
    }

    tracing::info!(records = records.len(), data_rows = stats.data_rows, "extracted payroll records");
    Ok((records, stats))
}

fn validate_structure(grid: &RawGrid) -> Result<(), ExtractionError> {
    if grid.height() <= HEADER_ROWS {
        return Err(ExtractionError::EmptyFile);
    }

    let width = grid.width();
    if width < MIN_COLUMNS {
        return Err(ExtractionError::TooFewColumns { found: width });
    }

    let row_1 = grid.header_prefix(0, HEADER_ROW_1.len());
    let row_2 = grid.header_prefix(1, HEADER_ROW_2.len());
    if row_1 != HEADER_ROW_1 || row_2 != HEADER_ROW_2 {
        tracing::debug!(?row_1, ?row_2, "header mismatch");
        return Err(ExtractionError::HeaderMismatch);
    }

    Ok(())
}

/// Read a tax figure. Text is accepted when it is a plain number, optionally
/// with space-grouped digits and a decimal comma.
fn to_number(cell: &CellData, row: usize, field: &'static str) -> Result<f64, ExtractionError> {
    let parsed = match cell {
        CellData::Number(n) => Some(*n),
        CellData::Text(s) => parse_numeric_text(s),
        CellData::Empty => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(ExtractionError::Numeric {
            row,
            field,
            value: cell.to_text(),
        }),
    }
}

fn parse_numeric_text(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse().ok()
}

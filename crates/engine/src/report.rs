//! Report layout.
//!
//! [`build`] assembles the complete output table (values, styles, merges,
//! column widths) in memory. The table is immutable once built; turning it
//! into a workbook file is a separate, format-specific step.

use std::cmp::Ordering;

use crate::error::BuildError;
use crate::model::{format_number, EnrichedRecord};

/// 0xRRGGBB color.
pub type Rgb = u32;

pub const HEADER_FILL: Rgb = 0xCBE4E5;
pub const MATCH_FILL: Rgb = 0x00FF00;
pub const MISMATCH_FILL: Rgb = 0xFF0000;

pub const COLUMNS: usize = 6;
pub const HEADER_ROWS: usize = 2;
pub const DEVIATION_COL: usize = 5;

/// Extra character units added to the longest value in a column.
const WIDTH_PADDING: f64 = 2.0;

const HEADER_TOP: [&str; COLUMNS] = [
    "Филиал",
    "Сотрудник",
    "Налоговая база",
    "Налог",
    "",
    "Отклонения",
];

const HEADER_BOTTOM: [&str; COLUMNS] = [
    "",
    "",
    "",
    "Исчислено всего",
    "Исчислено всего по формуле",
    "",
];

const HEADER_MERGES: [MergeRange; 5] = [
    MergeRange::new(0, 0, 1, 0),
    MergeRange::new(0, 1, 1, 1),
    MergeRange::new(0, 2, 1, 2),
    MergeRange::new(0, 3, 0, 4),
    MergeRange::new(0, 5, 1, 5),
];

// ---------------------------------------------------------------------------
// Table types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellStyle {
    /// Solid background fill.
    pub fill: Option<Rgb>,
    /// Thin border on all four sides.
    pub border: bool,
    /// Centered horizontally and vertically.
    pub centered: bool,
}

impl CellStyle {
    pub const PLAIN: CellStyle = CellStyle {
        fill: None,
        border: false,
        centered: false,
    };

    pub const HEADER: CellStyle = CellStyle {
        fill: Some(HEADER_FILL),
        border: true,
        centered: true,
    };

    fn deviation(is_match: bool) -> Self {
        Self {
            fill: Some(if is_match { MATCH_FILL } else { MISMATCH_FILL }),
            border: true,
            centered: false,
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::PLAIN
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReportValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl ReportValue {
    /// Length in characters of the displayed value, `None` for empty cells.
    pub fn display_len(&self) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::Text(s) if s.is_empty() => None,
            Self::Text(s) => Some(s.chars().count()),
            Self::Number(n) => Some(format_number(*n).chars().count()),
        }
    }

    fn label(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportCell {
    pub value: ReportValue,
    pub style: CellStyle,
}

/// Inclusive, zero-based merged range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRange {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl MergeRange {
    pub const fn new(first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Self {
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    /// Excel-style reference, e.g. "D1:E1".
    pub fn a1(&self) -> String {
        format!(
            "{}{}:{}{}",
            col_to_letter(self.first_col),
            self.first_row + 1,
            col_to_letter(self.last_col),
            self.last_row + 1
        )
    }
}

/// Fully specified output table. Row 0-1 are the header, data starts at row 2.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    cells: Vec<Vec<ReportCell>>,
    merges: Vec<MergeRange>,
    column_widths: Vec<f64>,
    records: Vec<EnrichedRecord>,
}

impl ReportTable {
    pub fn cells(&self) -> &[Vec<ReportCell>] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&ReportCell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    pub fn merges(&self) -> &[MergeRange] {
        &self.merges
    }

    /// Column widths in character units, one per column.
    pub fn column_widths(&self) -> &[f64] {
        &self.column_widths
    }

    /// Records in output order (deviation, descending).
    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn width(&self) -> usize {
        COLUMNS
    }

    /// Cells of the data rows, in output order.
    pub fn data_rows(&self) -> &[Vec<ReportCell>] {
        &self.cells[HEADER_ROWS..]
    }

    /// True when a merge covers (row, col) without starting there.
    pub fn is_merge_hidden(&self, row: usize, col: usize) -> bool {
        self.merges
            .iter()
            .any(|m| m.contains(row, col) && (m.first_row, m.first_col) != (row, col))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Lay out the report for `records`. Fails on empty input rather than
/// producing a headers-only table.
pub fn build(records: &[EnrichedRecord]) -> Result<ReportTable, BuildError> {
    if records.is_empty() {
        return Err(BuildError::EmptyInput);
    }

    let mut sorted = records.to_vec();
    // Stable: equal deviations keep their input order.
    sorted.sort_by(|a, b| b.deviation.partial_cmp(&a.deviation).unwrap_or(Ordering::Equal));

    let mut cells: Vec<Vec<ReportCell>> = Vec::with_capacity(HEADER_ROWS + sorted.len());
    for labels in [HEADER_TOP, HEADER_BOTTOM] {
        cells.push(
            labels
                .iter()
                .map(|label| ReportCell {
                    value: ReportValue::label(label),
                    style: CellStyle::HEADER,
                })
                .collect(),
        );
    }

    for rec in &sorted {
        let plain = |value| ReportCell {
            value,
            style: CellStyle::PLAIN,
        };
        cells.push(vec![
            plain(ReportValue::Text(rec.record.branch.clone())),
            plain(ReportValue::Text(rec.record.employee.clone())),
            plain(ReportValue::Number(rec.record.tax_base)),
            plain(ReportValue::Number(rec.record.reported_tax)),
            plain(ReportValue::Number(rec.calculated_tax)),
            ReportCell {
                value: ReportValue::Number(rec.deviation),
                style: CellStyle::deviation(rec.is_match()),
            },
        ]);
    }

    let column_widths = autosize(&cells);
    let mismatches = sorted.iter().filter(|r| !r.is_match()).count();
    tracing::info!(rows = sorted.len(), mismatches, "built report table");

    Ok(ReportTable {
        cells,
        merges: HEADER_MERGES.to_vec(),
        column_widths,
        records: sorted,
    })
}

/// Longest displayed value per column plus padding.
fn autosize(cells: &[Vec<ReportCell>]) -> Vec<f64> {
    (0..COLUMNS)
        .map(|col| {
            let longest = cells
                .iter()
                .filter_map(|row| row.get(col).and_then(|c| c.value.display_len()))
                .max()
                .unwrap_or(0);
            longest as f64 + WIDTH_PADDING
        })
        .collect()
}

/// Convert column index to letter (0 -> A, 1 -> B, 26 -> AA, etc.)
pub fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PayrollRecord;
    use crate::tax::TaxSchedule;

    fn enriched(branch: &str, employee: &str, base: f64, reported: f64) -> EnrichedRecord {
        EnrichedRecord::new(
            PayrollRecord {
                branch: branch.into(),
                employee: employee.into(),
                tax_base: base,
                reported_tax: reported,
            },
            &TaxSchedule::default(),
        )
    }

    fn text_at(table: &ReportTable, a1: (usize, usize)) -> Option<&str> {
        match &table.cell(a1.0, a1.1)?.value {
            ReportValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn numbers(row: &[ReportCell]) -> Vec<f64> {
        row.iter()
            .filter_map(|c| match c.value {
                ReportValue::Number(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn two_matching_records() {
        let table = build(&[
            enriched("Филиал 1", "Сотрудник 1", 5_000_000.0, 650_000.0),
            enriched("Филиал 2", "Сотрудник 2", 6_000_000.0, 800_000.0),
        ])
        .unwrap();

        assert_eq!(table.height(), 4);
        let rows = table.data_rows();
        assert_eq!(rows[0][0].value, ReportValue::Text("Филиал 1".into()));
        assert_eq!(rows[0][1].value, ReportValue::Text("Сотрудник 1".into()));
        assert_eq!(numbers(&rows[0]), vec![5_000_000.0, 650_000.0, 650_000.0, 0.0]);
        assert_eq!(rows[1][0].value, ReportValue::Text("Филиал 2".into()));
        assert_eq!(numbers(&rows[1]), vec![6_000_000.0, 800_000.0, 800_000.0, 0.0]);

        for row in rows {
            assert_eq!(row[DEVIATION_COL].style.fill, Some(MATCH_FILL));
            assert!(row[DEVIATION_COL].style.border);
        }
    }

    #[test]
    fn header_labels_and_merges() {
        let table = build(&[enriched("Ф", "С", 1.0, 0.13)]).unwrap();

        assert_eq!(text_at(&table, (0, 0)), Some("Филиал"));
        assert_eq!(text_at(&table, (0, 1)), Some("Сотрудник"));
        assert_eq!(text_at(&table, (0, 2)), Some("Налоговая база"));
        assert_eq!(text_at(&table, (0, 3)), Some("Налог"));
        assert_eq!(text_at(&table, (1, 3)), Some("Исчислено всего"));
        assert_eq!(text_at(&table, (1, 4)), Some("Исчислено всего по формуле"));
        assert_eq!(text_at(&table, (0, 5)), Some("Отклонения"));
        assert_eq!(table.cell(1, 0).unwrap().value, ReportValue::Empty);

        let refs: Vec<String> = table.merges().iter().map(MergeRange::a1).collect();
        assert_eq!(refs, vec!["A1:A2", "B1:B2", "C1:C2", "D1:E1", "F1:F2"]);

        assert!(table.is_merge_hidden(1, 0));
        assert!(table.is_merge_hidden(0, 4));
        assert!(!table.is_merge_hidden(0, 3));
        assert!(!table.is_merge_hidden(1, 3));
    }

    #[test]
    fn every_header_cell_is_styled() {
        let table = build(&[enriched("Ф", "С", 1.0, 0.13)]).unwrap();
        for row in 0..HEADER_ROWS {
            for col in 0..COLUMNS {
                assert_eq!(table.cell(row, col).unwrap().style, CellStyle::HEADER, "({row}, {col})");
            }
        }
    }

    #[test]
    fn sorted_by_deviation_descending() {
        let table = build(&[
            enriched("a", "1", 1_000_000.0, 130_000.0),
            enriched("b", "2", 1_000_000.0, 140_000.0),
            enriched("c", "3", 1_000_000.0, 100_000.0),
            enriched("d", "4", 1_000_000.0, 135_000.0),
        ])
        .unwrap();

        let devs: Vec<f64> = table.records().iter().map(|r| r.deviation).collect();
        assert!(devs.windows(2).all(|w| w[0] >= w[1]), "{devs:?}");
        let branches: Vec<&str> = table.records().iter().map(|r| r.record.branch.as_str()).collect();
        assert_eq!(branches, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let table = build(&[
            enriched("first", "1", 100.0, 13.0),
            enriched("second", "2", 200.0, 26.0),
            enriched("third", "3", 300.0, 39.0),
        ])
        .unwrap();
        let branches: Vec<&str> = table.records().iter().map(|r| r.record.branch.as_str()).collect();
        assert_eq!(branches, vec!["first", "second", "third"]);
    }

    #[test]
    fn deviation_fill_green_only_on_zero() {
        let table = build(&[
            enriched("over", "1", 1_000_000.0, 130_001.0),
            enriched("exact", "2", 1_000_000.0, 130_000.0),
            enriched("under", "3", 1_000_000.0, 129_999.0),
        ])
        .unwrap();

        for (rec, row) in table.records().iter().zip(table.data_rows()) {
            let style = row[DEVIATION_COL].style;
            let expected = if rec.deviation == 0.0 { MATCH_FILL } else { MISMATCH_FILL };
            assert_eq!(style.fill, Some(expected), "{}", rec.record.branch);
            assert!(style.border);
        }
        // Other data cells stay unstyled.
        assert!(table.data_rows()[0][..DEVIATION_COL].iter().all(|c| c.style.is_plain()));
    }

    #[test]
    fn column_widths_fit_longest_value() {
        let table = build(&[
            enriched("Филиал 1", "Очень длинное имя сотрудника", 5_000_001.0, 650_000.0),
        ])
        .unwrap();
        let widths = table.column_widths();
        assert_eq!(widths.len(), COLUMNS);
        // "Филиал 1" = 8 chars, beats header "Филиал"
        assert_eq!(widths[0], 10.0);
        // 28 chars
        assert_eq!(widths[1], 30.0);
        // "Налоговая база" = 14
        assert_eq!(widths[2], 16.0);
        // "Исчислено всего по формуле" = 26
        assert_eq!(widths[4], 28.0);
        // the fractional deviation prints longer than "Отклонения"
        let dev_len = format_number(table.records()[0].deviation).chars().count();
        assert_eq!(widths[5], dev_len.max(10) as f64 + 2.0);
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = build(&[]).unwrap_err();
        assert_eq!(err, BuildError::EmptyInput);
    }

    #[test]
    fn column_letters() {
        assert_eq!(col_to_letter(0), "A");
        assert_eq!(col_to_letter(5), "F");
        assert_eq!(col_to_letter(26), "AA");
    }
}

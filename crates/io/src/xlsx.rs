// Spreadsheet import (calamine) and report export (rust_xlsxwriter)

use std::fmt;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use rust_xlsxwriter::{
    Color, DocProperties, ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, Worksheet,
};

use taxgrid_engine::report::{CellStyle, ReportCell, ReportValue};
use taxgrid_engine::{CellData, RawGrid, ReportTable};

use crate::grid::{GridError, ReadOptions};

// ============================================================================
// Import
// ============================================================================

/// Read the first worksheet of an xlsx/xlsm/xlsb/xls/ods file held in memory.
///
/// calamine trims leading empty rows and columns from the range it returns;
/// they are padded back so grid coordinates match sheet coordinates.
pub fn read_first_sheet(bytes: &[u8], options: &ReadOptions) -> Result<RawGrid, GridError> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| GridError::Open(e.to_string()))?;
    grid_from_first_sheet(workbook, options)
}

fn grid_from_first_sheet<RS: Read + Seek>(
    mut workbook: Sheets<RS>,
    options: &ReadOptions,
) -> Result<RawGrid, GridError> {
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(GridError::NoSheets)?
        .map_err(|e| GridError::Sheet(e.to_string()))?;

    let (height, width) = range.get_size();
    if height == 0 || width == 0 {
        return Ok(RawGrid::default());
    }

    let (start_row, start_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));
    options.check(start_row + height, start_col + width)?;

    let mut rows: Vec<Vec<CellData>> = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut cells = vec![CellData::Empty; start_col];
        cells.extend(row.iter().map(cell_from_data));
        rows.push(cells);
    }

    Ok(RawGrid::new(rows))
}

fn cell_from_data(cell: &Data) -> CellData {
    match cell {
        Data::Empty => CellData::Empty,
        Data::String(s) => CellData::from(s.as_str()),
        Data::Float(n) => CellData::Number(*n),
        Data::Int(n) => CellData::Number(*n as f64),
        Data::Bool(b) => CellData::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => CellData::Text(format!("#{:?}", e)),
        // Serial number, same as Excel shows with a General format
        Data::DateTime(dt) => CellData::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellData::from(s.as_str()),
    }
}

// ============================================================================
// Export
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub sheet_name: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteError {
    /// The workbook writer rejected the content.
    Xlsx(String),
    /// The finished workbook could not be written to disk.
    Io(String),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xlsx(msg) => write!(f, "failed to write workbook: {msg}"),
            Self::Io(msg) => write!(f, "failed to save report: {msg}"),
        }
    }
}

impl std::error::Error for WriteError {}

fn xlsx_err(context: impl fmt::Display) -> impl FnOnce(rust_xlsxwriter::XlsxError) -> WriteError {
    move |e| WriteError::Xlsx(format!("{context}: {e}"))
}

/// Serialize a report table to xlsx bytes.
///
/// Output is byte-for-byte reproducible: the document creation time is pinned
/// instead of taken from the clock.
pub fn write_report(table: &ReportTable, options: &WriteOptions) -> Result<Vec<u8>, WriteError> {
    let mut workbook = Workbook::new();
    let created = ExcelDateTime::from_ymd(2000, 1, 1).map_err(xlsx_err("creation date"))?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

    let worksheet = workbook
        .add_worksheet()
        .set_name(&options.sheet_name)
        .map_err(xlsx_err(format!("sheet name '{}'", options.sheet_name)))?;

    // merge_range() writes the origin value and blanks the rest of the range,
    // so cells covered by a merge are not written again below.
    for merge in table.merges() {
        let origin = table.cell(merge.first_row, merge.first_col).cloned().unwrap_or_default();
        let text = match &origin.value {
            ReportValue::Text(s) => s.clone(),
            ReportValue::Number(n) => taxgrid_engine::model::format_number(*n),
            ReportValue::Empty => String::new(),
        };
        worksheet
            .merge_range(
                merge.first_row as u32,
                merge.first_col as u16,
                merge.last_row as u32,
                merge.last_col as u16,
                &text,
                &build_format(&origin.style),
            )
            .map_err(xlsx_err(format!("merge {}", merge.a1())))?;
    }

    for (row, cells) in table.cells().iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            if table.merges().iter().any(|m| m.contains(row, col)) {
                continue;
            }
            write_cell(worksheet, row, col, cell)?;
        }
    }

    for (col, width) in table.column_widths().iter().enumerate() {
        worksheet
            .set_column_width(col as u16, *width)
            .map_err(xlsx_err(format!("width of column {col}")))?;
    }

    let bytes = workbook.save_to_buffer().map_err(xlsx_err("serialize"))?;
    tracing::debug!(bytes = bytes.len(), rows = table.height(), "wrote report workbook");
    Ok(bytes)
}

/// Write the report to `path`. Returns the number of bytes written.
pub fn save_report(table: &ReportTable, path: &Path, options: &WriteOptions) -> Result<usize, WriteError> {
    let bytes = write_report(table, options)?;
    std::fs::write(path, &bytes).map_err(|e| WriteError::Io(format!("{}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "saved report");
    Ok(bytes.len())
}

fn write_cell(worksheet: &mut Worksheet, row: usize, col: usize, cell: &ReportCell) -> Result<(), WriteError> {
    let (r, c) = (row as u32, col as u16);

    let result = if cell.style.is_plain() {
        match &cell.value {
            ReportValue::Empty => return Ok(()),
            ReportValue::Text(s) => worksheet.write_string(r, c, s),
            ReportValue::Number(n) => worksheet.write_number(r, c, *n),
        }
    } else {
        let format = build_format(&cell.style);
        match &cell.value {
            ReportValue::Empty => worksheet.write_blank(r, c, &format),
            ReportValue::Text(s) => worksheet.write_string_with_format(r, c, s, &format),
            ReportValue::Number(n) => worksheet.write_number_with_format(r, c, *n, &format),
        }
    };

    result
        .map(|_| ())
        .map_err(|e| WriteError::Xlsx(format!("cell ({row}, {col}): {e}")))
}

fn build_format(style: &CellStyle) -> Format {
    let mut format = Format::new();

    if let Some(rgb) = style.fill {
        format = format.set_background_color(Color::RGB(rgb));
    }
    if style.border {
        format = format.set_border(FormatBorder::Thin);
    }
    if style.centered {
        format = format
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
    }

    format
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxgrid_engine::report::build;
    use taxgrid_engine::{EnrichedRecord, PayrollRecord, TaxSchedule};
    use tempfile::tempdir;

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

    fn sample_table() -> ReportTable {
        build(&[
            enriched("Север", "Иванов", 1_000_000.0, 130_000.0),
            enriched("Юг", "Петров", 6_000_000.0, 800_000.0),
        ])
        .unwrap()
    }

    fn read_back(bytes: Vec<u8>) -> RawGrid {
        read_first_sheet(&bytes, &ReadOptions::default()).unwrap()
    }

    fn zip_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut xml = String::new();
        entry.read_to_string(&mut xml).unwrap();
        xml
    }

    fn text(s: &str) -> CellData {
        CellData::Text(s.to_string())
    }

    #[test]
    fn report_round_trips_through_calamine() {
        let bytes = write_report(&sample_table(), &WriteOptions::default()).unwrap();
        let grid = read_back(bytes);

        assert_eq!(grid.height(), 4);
        assert_eq!(grid.cell(0, 0), &text("Филиал"));
        assert_eq!(grid.cell(0, 3), &text("Налог"));
        assert_eq!(grid.cell(0, 4), &CellData::Empty);
        assert_eq!(grid.cell(0, 5), &text("Отклонения"));
        assert_eq!(grid.cell(1, 0), &CellData::Empty);
        assert_eq!(grid.cell(1, 3), &text("Исчислено всего"));
        assert_eq!(grid.cell(1, 4), &text("Исчислено всего по формуле"));

        // Both rows match exactly, so input order is kept.
        assert_eq!(grid.cell(2, 1), &text("Иванов"));
        assert_eq!(grid.cell(2, 2), &CellData::Number(1_000_000.0));
        assert_eq!(grid.cell(3, 1), &text("Петров"));
        assert_eq!(grid.cell(3, 4), &CellData::Number(800_000.0));
        assert_eq!(grid.cell(3, 5), &CellData::Number(0.0));
    }

    #[test]
    fn merges_and_fills_are_written() {
        let bytes = write_report(&sample_table(), &WriteOptions::default()).unwrap();

        let sheet = zip_entry(&bytes, "xl/worksheets/sheet1.xml");
        for range in ["A1:A2", "B1:B2", "C1:C2", "D1:E1", "F1:F2"] {
            assert!(sheet.contains(&format!("<mergeCell ref=\"{range}\"/>")), "missing merge {range}");
        }

        let styles = zip_entry(&bytes, "xl/styles.xml");
        assert!(styles.contains("FFCBE4E5"));
        assert!(styles.contains("FF00FF00"));
        assert!(!styles.contains("FFFF0000"), "no mismatches in sample");
        assert!(styles.contains("thin"));
    }

    #[test]
    fn mismatch_fill_present_when_deviating() {
        let table = build(&[enriched("Север", "Иванов", 100.0, 100.0)]).unwrap();
        let bytes = write_report(&table, &WriteOptions::default()).unwrap();
        assert!(zip_entry(&bytes, "xl/styles.xml").contains("FFFF0000"));
    }

    #[test]
    fn output_is_reproducible() {
        let table = sample_table();
        let a = write_report(&table, &WriteOptions::default()).unwrap();
        let b = write_report(&table, &WriteOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn custom_sheet_name() {
        let opts = WriteOptions { sheet_name: "Сверка".into() };
        let bytes = write_report(&sample_table(), &opts).unwrap();
        let sheets = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.as_slice())).unwrap();
        assert_eq!(sheets.sheet_names(), vec!["Сверка".to_string()]);
    }

    #[test]
    fn invalid_sheet_name_rejected() {
        let opts = WriteOptions { sheet_name: "bad[name]".into() };
        let err = write_report(&sample_table(), &opts).unwrap_err();
        assert!(matches!(err, WriteError::Xlsx(_)));
    }

    #[test]
    fn save_report_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let written = save_report(&sample_table(), &path, &WriteOptions::default()).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, written);

        let missing = dir.path().join("no/such/dir/report.xlsx");
        let err = save_report(&sample_table(), &missing, &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, WriteError::Io(_)));
    }

    #[test]
    fn import_pads_leading_empty_rows_and_columns() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 1, "Филиал").unwrap();
        sheet.write_number(3, 2, 42.5).unwrap();
        sheet.write_boolean(3, 3, true).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let grid = read_back(bytes);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.cell(0, 0), &CellData::Empty);
        assert_eq!(grid.cell(2, 1), &text("Филиал"));
        assert_eq!(grid.cell(3, 2), &CellData::Number(42.5));
        assert_eq!(grid.cell(3, 3), &text("TRUE"));
    }

    #[test]
    fn import_enforces_limits() {
        let bytes = write_report(&sample_table(), &WriteOptions::default()).unwrap();
        let opts = ReadOptions { max_rows: 3, max_cols: 256 };
        let err = read_first_sheet(&bytes, &opts).unwrap_err();
        assert!(matches!(err, GridError::TooLarge { rows: 4, cols: 6, .. }));
    }

    #[test]
    fn import_rejects_garbage() {
        let err = read_first_sheet(b"not a spreadsheet", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, GridError::Open(_)));
    }

    #[test]
    fn empty_sheet_is_empty_grid() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        let grid = read_back(workbook.save_to_buffer().unwrap());
        assert_eq!(grid.height(), 0);
    }
}

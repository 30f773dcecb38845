// File I/O: source grids in, report workbooks out

pub mod csv;
pub mod grid;
pub mod xlsx;

pub use grid::{read_grid, read_grid_from_bytes, GridError, InputFormat, ReadOptions};
pub use xlsx::{save_report, write_report, WriteError, WriteOptions};

/// Default file name of the generated report.
pub const REPORT_FILE_NAME: &str = "report.xlsx";

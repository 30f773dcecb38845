//! `taxgrid-engine`: payroll tax reconciliation core.
//!
//! Pure crate: receives an untyped cell grid, returns typed records and an
//! immutable report table. No file or workbook I/O.

pub mod error;
pub mod extract;
pub mod model;
pub mod report;
pub mod tax;

pub use error::{BuildError, ErrorKind, ExtractionError};
pub use extract::extract;
pub use model::{CellData, EnrichedRecord, PayrollRecord, RawGrid};
pub use report::ReportTable;
pub use tax::{calculate_tax, deviation, TaxSchedule};

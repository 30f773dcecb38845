//! `taxgrid-recon`: payroll tax reconciliation pipeline.
//!
//! Wires extraction, tax recomputation and report layout into a single call
//! and serializes the result. Callers own file upload and download.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod summary;

pub use config::ReconConfig;
pub use error::{ConfigError, PipelineError};
pub use pipeline::{Pipeline, ReportArtifact};
pub use summary::{compute_summary, ReconSummary};

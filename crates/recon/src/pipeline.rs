//! Extract → recompute → lay out → serialize.
//!
//! A [`Pipeline`] holds only immutable configuration and the log sink, so one
//! instance can serve any number of runs, including concurrent ones.

use std::path::Path;

use tracing::Dispatch;

use taxgrid_engine::extract::extract_with_stats;
use taxgrid_engine::{report, EnrichedRecord, RawGrid};
use taxgrid_io::{read_grid_from_bytes, write_report, GridError, InputFormat, WriteError};

use crate::config::ReconConfig;
use crate::error::PipelineError;
use crate::summary::{compute_summary, ReconSummary};

/// Finished report, ready to hand to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    /// Suggested download name.
    pub file_name: String,
    /// xlsx workbook.
    pub bytes: Vec<u8>,
    pub summary: ReconSummary,
}

impl ReportArtifact {
    /// Persist the workbook. Storage is the caller's choice; this is a convenience.
    pub fn write_to(&self, path: &Path) -> Result<(), PipelineError> {
        std::fs::write(path, &self.bytes)
            .map_err(|e| PipelineError::Write(WriteError::Io(format!("{}: {e}", path.display()))))?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "report written");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ReconConfig,
    dispatch: Dispatch,
}

impl Pipeline {
    /// Pipeline that discards its log events.
    pub fn new(config: ReconConfig) -> Self {
        Self::with_dispatch(config, Dispatch::none())
    }

    /// Pipeline whose stages log to `dispatch`. No global subscriber is
    /// installed or consulted.
    pub fn with_dispatch(config: ReconConfig, dispatch: Dispatch) -> Self {
        Self { config, dispatch }
    }

    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// Validate the grid, extract records and recompute their tax.
    pub fn enrich(&self, grid: &RawGrid) -> Result<Vec<EnrichedRecord>, PipelineError> {
        self.in_scope(|| self.enrich_records(grid))
    }

    /// Full run over an already-read grid. The first failing stage ends the
    /// run and its error is returned unchanged.
    pub fn run(&self, grid: &RawGrid) -> Result<ReportArtifact, PipelineError> {
        self.in_scope(|| self.run_grid(grid))
    }

    /// Read the first sheet of `bytes`, then [`run`](Self::run).
    pub fn run_bytes(&self, bytes: &[u8], format: InputFormat) -> Result<ReportArtifact, PipelineError> {
        let grid = self.read_bytes(bytes, format)?;
        self.run(&grid)
    }

    /// Read the file at `path`, then [`run`](Self::run). The format follows the extension.
    pub fn run_path(&self, path: &Path) -> Result<ReportArtifact, PipelineError> {
        let grid = self.read_path(path)?;
        self.run(&grid)
    }

    /// Grid-reading step on its own, with the configured delimiter and size limits.
    pub fn read_bytes(&self, bytes: &[u8], format: InputFormat) -> Result<RawGrid, PipelineError> {
        self.in_scope(|| {
            let format = format.with_delimiter(self.config.csv_delimiter());
            Ok(read_grid_from_bytes(bytes, format, &self.config.read_options())?)
        })
    }

    pub fn read_path(&self, path: &Path) -> Result<RawGrid, PipelineError> {
        let bytes = std::fs::read(path)
            .map_err(|e| GridError::Io(format!("{}: {e}", path.display())))?;
        self.in_scope(|| tracing::info!(path = %path.display(), bytes = bytes.len(), "read source file"));
        self.read_bytes(&bytes, InputFormat::from_path(path))
    }

    fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    fn enrich_records(&self, grid: &RawGrid) -> Result<Vec<EnrichedRecord>, PipelineError> {
        let (records, stats) = extract_with_stats(grid)?;
        let schedule = &self.config.schedule;
        let enriched: Vec<EnrichedRecord> = records
            .into_iter()
            .map(|record| EnrichedRecord::new(record, schedule))
            .collect();
        tracing::debug!(
            records = enriched.len(),
            dropped = stats.dropped_rows,
            threshold = schedule.threshold,
            "recomputed tax"
        );
        Ok(enriched)
    }

    fn run_grid(&self, grid: &RawGrid) -> Result<ReportArtifact, PipelineError> {
        let _span = tracing::info_span!("reconcile", rows = grid.height()).entered();

        let records = self.enrich_records(grid)?;
        let summary = compute_summary(&records);
        let table = report::build(&records)?;
        let bytes = write_report(&table, &self.config.write_options())?;

        tracing::info!(
            records = summary.records,
            matched = summary.matched,
            net_deviation = summary.net_deviation,
            bytes = bytes.len(),
            "report ready"
        );

        Ok(ReportArtifact {
            file_name: self.config.output.file_name.clone(),
            bytes,
            summary,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(ReconConfig::default())
    }
}

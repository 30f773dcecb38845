//! `taxgrid report` and `taxgrid check`.

use std::path::PathBuf;

use serde::Serialize;
use taxgrid_engine::model::format_number;
use taxgrid_engine::{report, EnrichedRecord, ErrorKind};
use taxgrid_recon::{compute_summary, Pipeline, PipelineError, ReconSummary};

use crate::config::load_config;
use crate::exit_codes::{EXIT_DEVIATIONS, EXIT_REJECTED, EXIT_UNREADABLE, EXIT_WRITE_FAILED};
use crate::CliError;

const CHECK_COLUMNS: [&str; 6] = [
    "Филиал",
    "Сотрудник",
    "Налоговая база",
    "Исчислено всего",
    "По формуле",
    "Отклонение",
];

/// Map a pipeline failure to an exit code. Rejections keep their message verbatim.
fn pipeline_err(err: PipelineError) -> CliError {
    let message = err.to_string();
    match err.kind() {
        Some(ErrorKind::Structural) => CliError::new(EXIT_REJECTED, message).with_hint(
            "expected two header rows: Филиал | Сотрудник | Доход | Вычеты | Налоговая база | Налог",
        ),
        Some(_) => CliError::new(EXIT_REJECTED, message),
        None => match err {
            PipelineError::Write(_) => CliError::new(EXIT_WRITE_FAILED, message),
            _ => CliError::new(EXIT_UNREADABLE, message),
        },
    }
}

pub fn cmd_report(
    input: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    delimiter: Option<String>,
    json: bool,
    dispatch: tracing::Dispatch,
) -> Result<(), CliError> {
    let config = load_config(config.as_deref(), delimiter.as_deref())?;
    let pipeline = Pipeline::with_dispatch(config, dispatch);

    let artifact = pipeline.run_path(&input).map_err(pipeline_err)?;
    let out_path = output.unwrap_or_else(|| PathBuf::from(&artifact.file_name));
    artifact.write_to(&out_path).map_err(pipeline_err)?;

    if json {
        let json_str = serde_json::to_string_pretty(&artifact.summary)
            .map_err(|e| CliError::new(EXIT_WRITE_FAILED, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // Human summary to stderr
    print_summary(&artifact.summary);
    eprintln!("wrote {} ({} bytes)", out_path.display(), artifact.bytes.len());
    Ok(())
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    summary: &'a ReconSummary,
    records: &'a [EnrichedRecord],
}

pub fn cmd_check(
    input: PathBuf,
    config: Option<PathBuf>,
    delimiter: Option<String>,
    json: bool,
    strict_exit: bool,
    dispatch: tracing::Dispatch,
) -> Result<(), CliError> {
    let config = load_config(config.as_deref(), delimiter.as_deref())?;
    let pipeline = Pipeline::with_dispatch(config, dispatch);

    let grid = pipeline.read_path(&input).map_err(pipeline_err)?;
    let records = pipeline.enrich(&grid).map_err(pipeline_err)?;
    let summary = compute_summary(&records);
    // Same ordering as the report
    let table = report::build(&records).map_err(|e| pipeline_err(e.into()))?;
    let sorted = table.records();

    if json {
        let out = CheckOutput { summary: &summary, records: sorted };
        let json_str = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::new(EXIT_WRITE_FAILED, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        print!("{}", render_table(sorted));
    }

    print_summary(&summary);

    if strict_exit && summary.has_deviations() {
        return Err(CliError::new(
            EXIT_DEVIATIONS,
            format!(
                "{} of {} record(s) deviate from the recomputed tax",
                summary.records - summary.matched,
                summary.records
            ),
        ));
    }
    Ok(())
}

fn print_summary(s: &ReconSummary) {
    eprintln!(
        "{} records: {} matched, {} over-reported, {} under-reported (net deviation {}, max {})",
        s.records,
        s.matched,
        s.over_reported,
        s.under_reported,
        format_number(s.net_deviation),
        format_number(s.max_abs_deviation),
    );
}

/// Plain-text table: text columns left-aligned, numbers right-aligned.
fn render_table(records: &[EnrichedRecord]) -> String {
    let rows: Vec<[String; 6]> = records
        .iter()
        .map(|r| {
            [
                r.record.branch.clone(),
                r.record.employee.clone(),
                format_number(r.record.tax_base),
                format_number(r.record.reported_tax),
                format_number(r.calculated_tax),
                format_number(r.deviation),
            ]
        })
        .collect();

    let mut widths = CHECK_COLUMNS.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: [String; 6] = CHECK_COLUMNS.map(str::to_string);
    for row in std::iter::once(&header).chain(rows.iter()) {
        let line: Vec<String> = row
            .iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(col, (cell, &w))| {
                let pad = " ".repeat(w - cell.chars().count());
                if col < 2 { format!("{cell}{pad}") } else { format!("{pad}{cell}") }
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

use serde::Serialize;
use taxgrid_engine::EnrichedRecord;

/// Aggregate view of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconSummary {
    pub records: usize,
    /// Deviation exactly zero.
    pub matched: usize,
    /// Reported tax above the recomputed figure.
    pub over_reported: usize,
    pub under_reported: usize,
    /// Sum of all deviations.
    pub net_deviation: f64,
    pub max_abs_deviation: f64,
}

impl ReconSummary {
    pub fn has_deviations(&self) -> bool {
        self.matched != self.records
    }
}

pub fn compute_summary(records: &[EnrichedRecord]) -> ReconSummary {
    let mut summary = ReconSummary {
        records: records.len(),
        ..Default::default()
    };

    for r in records {
        if r.deviation > 0.0 {
            summary.over_reported += 1;
        } else if r.deviation < 0.0 {
            summary.under_reported += 1;
        } else {
            summary.matched += 1;
        }
        summary.net_deviation += r.deviation;
        summary.max_abs_deviation = summary.max_abs_deviation.max(r.deviation.abs());
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxgrid_engine::{PayrollRecord, TaxSchedule};

    fn record(base: f64, reported: f64) -> EnrichedRecord {
        EnrichedRecord::new(
            PayrollRecord {
                branch: "Филиал 1".into(),
                employee: "Сотрудник".into(),
                tax_base: base,
                reported_tax: reported,
            },
            &TaxSchedule::default(),
        )
    }

    #[test]
    fn summary_counts() {
        let records = vec![
            record(5_000_000.0, 650_000.0),
            record(6_000_000.0, 800_000.0),
            record(1_000_000.0, 130_100.0),
            record(1_000_000.0, 129_000.0),
            record(1_000_000.0, 129_500.0),
        ];
        let summary = compute_summary(&records);
        assert_eq!(summary.records, 5);
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.over_reported, 1);
        assert_eq!(summary.under_reported, 2);
        assert_eq!(summary.net_deviation, 100.0 - 1_000.0 - 500.0);
        assert_eq!(summary.max_abs_deviation, 1_000.0);
        assert!(summary.has_deviations());
    }

    #[test]
    fn all_matched() {
        let summary = compute_summary(&[record(0.0, 0.0)]);
        assert_eq!(summary.matched, 1);
        assert!(!summary.has_deviations());
        assert_eq!(summary.max_abs_deviation, 0.0);
    }

    #[test]
    fn empty() {
        assert_eq!(compute_summary(&[]), ReconSummary::default());
    }
}

use serde::Deserialize;

/// Two-bracket progressive schedule: `lower_rate` up to and including
/// `threshold`, `upper_rate` on the part above it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaxSchedule {
    pub threshold: f64,
    pub lower_rate: f64,
    pub upper_rate: f64,
}

impl Default for TaxSchedule {
    fn default() -> Self {
        Self {
            threshold: 5_000_000.0,
            lower_rate: 0.13,
            upper_rate: 0.15,
        }
    }
}

impl TaxSchedule {
    /// Tax owed on `base`. No rounding.
    pub fn tax(&self, base: f64) -> f64 {
        let tax = if base <= self.threshold {
            base * self.lower_rate
        } else {
            self.threshold * self.lower_rate + (base - self.threshold) * self.upper_rate
        };
        tracing::debug!(base, tax, "calculated tax");
        tax
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(format!("threshold must be a non-negative number, got {}", self.threshold));
        }
        for (name, rate) in [("lower_rate", self.lower_rate), ("upper_rate", self.upper_rate)] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(format!("{name} must be within [0, 1], got {rate}"));
            }
        }
        Ok(())
    }
}

/// Tax on `base` under the default 13% / 15% schedule.
pub fn calculate_tax(base: f64) -> f64 {
    TaxSchedule::default().tax(base)
}

/// Reported minus calculated. Positive means over-reported.
pub fn deviation(reported_tax: f64, calculated_tax: f64) -> f64 {
    reported_tax - calculated_tax
}

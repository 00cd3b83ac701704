// crates/yumasim-economics/src/rewards.rs
//
// Total dividends over a run and their spread against a base validator.
//
// The base validator is the "reference behaviour" of a scenario (e.g. the
// eager validator that moves with consensus first). Every other validator's
// total is reported as a percentage difference from it.

use std::collections::HashMap;

use serde::Serialize;

/// Floor used in place of a zero or missing base total.
const BASE_DIVIDEND_FLOOR: f64 = 1e-6;

/// Per-validator totals for one simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct TotalDividends {
    /// Sum of per-epoch dividends, keyed by validator.
    pub totals: HashMap<String, f64>,
    /// (total - base) / base * 100, keyed by validator; 0.0 for the base itself.
    pub percentage_diff_vs_base: HashMap<String, f64>,
}

impl TotalDividends {
    /// Total for `validator`, 0.0 if it never appeared.
    pub fn total(&self, validator: &str) -> f64 {
        self.totals.get(validator).copied().unwrap_or(0.0)
    }
}

/// Sum the first `num_epochs` dividends of every validator and compare
/// against `base_validator`.
///
/// # Arguments
/// - `validators` — Validators to report, in display order.
/// - `dividends_per_validator` — Per-epoch dividend series keyed by validator.
/// - `base_validator` — Reference validator for the percentage column.
/// - `num_epochs` — Number of leading epochs to include.
pub fn total_dividends(
    validators: &[String],
    dividends_per_validator: &HashMap<String, Vec<f64>>,
    base_validator: &str,
    num_epochs: usize,
) -> TotalDividends {
    let totals: HashMap<String, f64> = validators
        .iter()
        .map(|v| {
            let total = dividends_per_validator
                .get(v)
                .map(|series| series.iter().take(num_epochs).sum())
                .unwrap_or(0.0);
            (v.clone(), total)
        })
        .collect();

    let base_dividend = match totals.get(base_validator) {
        Some(&d) if d != 0.0 => d,
        _ => {
            tracing::warn!(
                "Base validator '{}' has zero or missing total dividends",
                base_validator
            );
            BASE_DIVIDEND_FLOOR
        }
    };

    let percentage_diff_vs_base = totals
        .iter()
        .map(|(v, &total)| {
            let diff = if v == base_validator {
                0.0
            } else {
                (total - base_dividend) / base_dividend * 100.0
            };
            (v.clone(), diff)
        })
        .collect();

    TotalDividends {
        totals,
        percentage_diff_vs_base,
    }
}

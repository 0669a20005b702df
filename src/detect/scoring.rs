//! Shared statistics, suspicion scoring and dominance tiers.
//!
//! The weights and cutoffs live in plain config structs so a run can
//! re-score the same table with different heuristics.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::{AuditError, DominanceLevel};

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Sum of a set of prices, saturating at `Decimal::MAX`.
pub fn total(values: &[Decimal]) -> Decimal {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .unwrap_or(Decimal::MAX)
}

/// Arithmetic mean of a set of prices. Zero for an empty set.
pub fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    match values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
    {
        Some(sum) => sum / Decimal::from(values.len()),
        None => Decimal::from_f64(f64_mean(&sorted_f64(values))).unwrap_or(Decimal::MAX),
    }
}

/// Sample (n - 1) standard deviation. `None` with fewer than two values.
///
/// Squared deviations are summed exactly in `Decimal` when they fit; wider
/// spreads fall back to `f64` over the sorted values. Either way the result
/// does not depend on the order of `values`.
pub fn sample_std_dev(values: &[Decimal]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let exact = values.iter().try_fold(Decimal::ZERO, |acc, v| {
        let d = v.checked_sub(m)?;
        acc.checked_add(d.checked_mul(d)?)
    });
    let variance = match exact {
        Some(squares) => (squares / Decimal::from(values.len() - 1)).to_f64()?,
        None => f64_variance(&sorted_f64(values)),
    };
    Some(variance.sqrt())
}

fn sorted_f64(values: &[Decimal]) -> Vec<f64> {
    let mut xs: Vec<f64> = values.iter().filter_map(|v| v.to_f64()).collect();
    xs.sort_by(f64::total_cmp);
    xs
}

fn f64_mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn f64_variance(xs: &[f64]) -> f64 {
    let m = f64_mean(xs);
    xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (xs.len() - 1) as f64
}

/// Coefficient of variation in percent.
///
/// Zero when the mean is zero or the deviation is undefined.
pub fn coefficient_of_variation_pct(values: &[Decimal]) -> f64 {
    let m = mean(values);
    if m <= Decimal::ZERO {
        return 0.0;
    }
    match (sample_std_dev(values), m.to_f64()) {
        (Some(std), Some(m)) if m > 0.0 => std / m * 100.0,
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Suspicion score
// ---------------------------------------------------------------------------

/// Weights for the additive circular-purchase suspicion index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspicionWeights {
    /// Points per repeat purchase.
    pub per_purchase: f64,
    /// Multiplier on purchases-per-week.
    pub frequency_weight: f64,
    /// Mean bid count below which competition counts as low.
    pub competition_ceiling: f64,
    /// Points per bid short of the ceiling.
    pub competition_weight: f64,
    /// Price CV (percent) below which prices count as fixed.
    pub stability_cutoff_pct: f64,
    /// Flat bonus for fixed prices.
    pub stability_bonus: f64,
}

impl Default for SuspicionWeights {
    fn default() -> Self {
        Self {
            per_purchase: 15.0,
            frequency_weight: 10.0,
            competition_ceiling: 5.0,
            competition_weight: 5.0,
            stability_cutoff_pct: 10.0,
            stability_bonus: 20.0,
        }
    }
}

impl SuspicionWeights {
    /// Reject negative or non-finite weights.
    pub fn validate(&self) -> Result<(), AuditError> {
        let fields = [
            ("per_purchase", self.per_purchase),
            ("frequency_weight", self.frequency_weight),
            ("competition_ceiling", self.competition_ceiling),
            ("competition_weight", self.competition_weight),
            ("stability_cutoff_pct", self.stability_cutoff_pct),
            ("stability_bonus", self.stability_bonus),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(AuditError::Config(format!(
                    "scoring.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Additive suspicion index for a repeat-purchase group.
///
/// ```text
/// score = count * per_purchase
///       + (count / weeks) * frequency_weight            if weeks > 0
///       + (ceiling - competition) * competition_weight  if competition < ceiling
///       + stability_bonus                               if price_cv < cutoff
/// ```
pub fn suspicion_score(
    weights: &SuspicionWeights,
    count: usize,
    week_span: f64,
    mean_competition: f64,
    price_cv: f64,
) -> f64 {
    let count = count as f64;
    let mut score = count * weights.per_purchase;

    if week_span > 0.0 {
        score += count / week_span * weights.frequency_weight;
    }

    if mean_competition < weights.competition_ceiling {
        score += (weights.competition_ceiling - mean_competition) * weights.competition_weight;
    }

    if price_cv < weights.stability_cutoff_pct {
        score += weights.stability_bonus;
    }

    score
}

// ---------------------------------------------------------------------------
// Dominance tiers
// ---------------------------------------------------------------------------

/// Lower bounds (inclusive) on wins-per-auction for each tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DominanceTiers {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
}

impl Default for DominanceTiers {
    fn default() -> Self {
        Self {
            critical: 10.0,
            high: 5.0,
            medium: 2.0,
        }
    }
}

impl DominanceTiers {
    /// Cutoffs must be finite, positive and strictly descending.
    pub fn validate(&self) -> Result<(), AuditError> {
        let ordered = self.critical > self.high && self.high > self.medium && self.medium > 0.0;
        if !(self.critical.is_finite() && ordered) {
            return Err(AuditError::Config(format!(
                "tiers must satisfy critical > high > medium > 0, got {} / {} / {}",
                self.critical, self.high, self.medium
            )));
        }
        Ok(())
    }

    /// First matching tier from the top wins.
    pub fn classify(&self, wins_per_auction: f64) -> DominanceLevel {
        if wins_per_auction >= self.critical {
            DominanceLevel::Critical
        } else if wins_per_auction >= self.high {
            DominanceLevel::High
        } else if wins_per_auction >= self.medium {
            DominanceLevel::Medium
        } else {
            DominanceLevel::Normal
        }
    }
}

/// Reject a minimum-count threshold below one.
pub fn require_positive(name: &str, value: usize) -> Result<(), AuditError> {
    if value < 1 {
        return Err(AuditError::Config(format!("{name} must be at least 1, got {value}")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Circular-buyer detection.
//!
//! Finds buyers who keep winning the exact same item description, the
//! pattern left behind when a seller re-acquires unsold stock under a
//! buyer account.

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::scoring::{self, SuspicionWeights};
use crate::types::{AuditError, CircularPurchaseFinding, LotRecord, LotTable};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CircularConfig {
    /// Minimum wins of one description by one buyer to report.
    pub min_purchases: usize,
    pub weights: SuspicionWeights,
}

impl Default for CircularConfig {
    fn default() -> Self {
        Self {
            min_purchases: 3,
            weights: SuspicionWeights::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

pub struct CircularBuyerDetector {
    config: CircularConfig,
}

impl CircularBuyerDetector {
    /// Validates the threshold and weights before any scan can run.
    pub fn new(config: CircularConfig) -> Result<Self, AuditError> {
        scoring::require_positive("min_purchases", config.min_purchases)?;
        config.weights.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CircularConfig {
        &self.config
    }

    /// Score every (buyer, description) group at or above the threshold,
    /// most suspicious first.
    pub fn detect(&self, table: &LotTable) -> Vec<CircularPurchaseFinding> {
        let mut groups: BTreeMap<(&str, &str), Vec<&LotRecord>> = BTreeMap::new();
        for (login, lot) in table.sold() {
            groups
                .entry((login, lot.item_description.as_str()))
                .or_default()
                .push(lot);
        }

        let mut findings: Vec<CircularPurchaseFinding> = groups
            .into_iter()
            .filter(|(_, lots)| lots.len() >= self.config.min_purchases)
            .map(|((login, description), lots)| self.score_group(login, description, &lots))
            .collect();

        findings.sort_by(rank);

        info!(
            min_purchases = self.config.min_purchases,
            findings = findings.len(),
            "Circular-buyer scan complete"
        );

        findings
    }

    fn score_group(
        &self,
        login: &str,
        description: &str,
        lots: &[&LotRecord],
    ) -> CircularPurchaseFinding {
        let prices: Vec<Decimal> = lots.iter().map(|l| l.winning_bid).collect();
        let count = lots.len();

        let week_span = week_span(lots);
        let total_spent = scoring::total(&prices);
        let mean_price = scoring::mean(&prices);
        let mean_competition =
            lots.iter().map(|l| u64::from(l.bids_count)).sum::<u64>() as f64 / count as f64;
        let price_cv = scoring::coefficient_of_variation_pct(&prices);

        let suspicion_score = scoring::suspicion_score(
            &self.config.weights,
            count,
            week_span,
            mean_competition,
            price_cv,
        );

        debug!(
            winner = login,
            purchases = count,
            weeks = %format!("{week_span:.1}"),
            cv = %format!("{price_cv:.1}%"),
            score = %format!("{suspicion_score:.1}"),
            "Repeat-purchase group scored"
        );

        CircularPurchaseFinding {
            winner_login: login.to_string(),
            item_description: description.to_string(),
            purchase_count: count,
            week_span,
            mean_price,
            total_spent,
            mean_competition,
            price_cv,
            suspicion_score,
        }
    }
}

/// Whole days between the earliest and latest win, in weeks.
fn week_span(lots: &[&LotRecord]) -> f64 {
    let first = lots.iter().map(|l| l.auction_end_date).min();
    let last = lots.iter().map(|l| l.auction_end_date).max();
    match (first, last) {
        (Some(first), Some(last)) => ((last - first).num_days() as f64 / 7.0).max(0.0),
        _ => 0.0,
    }
}

/// Score desc, then purchase count desc, then login and description asc.
fn rank(a: &CircularPurchaseFinding, b: &CircularPurchaseFinding) -> Ordering {
    b.suspicion_score
        .total_cmp(&a.suspicion_score)
        .then_with(|| b.purchase_count.cmp(&a.purchase_count))
        .then_with(|| a.winner_login.cmp(&b.winner_login))
        .then_with(|| a.item_description.cmp(&b.item_description))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

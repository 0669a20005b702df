//! Single-auction concentration detection.
//!
//! Flags buyers sweeping many lots inside one auction event.

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

use super::scoring;
use crate::types::{AuditError, ConcentrationEvent, LotRecord, LotTable};

#[derive(Debug, Clone)]
pub struct ConcentrationConfig {
    /// Minimum lots won by one buyer in one auction.
    pub min_lots: usize,
}

impl Default for ConcentrationConfig {
    fn default() -> Self {
        Self { min_lots: 5 }
    }
}

pub struct ConcentrationDetector {
    config: ConcentrationConfig,
}

impl ConcentrationDetector {
    pub fn new(config: ConcentrationConfig) -> Result<Self, AuditError> {
        scoring::require_positive("min_lots", config.min_lots)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConcentrationConfig {
        &self.config
    }

    /// Events ranked by lots won, then auction number and login.
    pub fn detect(&self, table: &LotTable) -> Vec<ConcentrationEvent> {
        let mut groups: BTreeMap<(&str, &str), Vec<&LotRecord>> = BTreeMap::new();
        for (login, lot) in table.sold() {
            groups
                .entry((lot.auction_number.as_str(), login))
                .or_default()
                .push(lot);
        }

        let mut events: Vec<ConcentrationEvent> = groups
            .into_iter()
            .filter(|(_, lots)| lots.len() >= self.config.min_lots)
            .map(|((auction, login), lots)| {
                let prices: Vec<Decimal> = lots.iter().map(|l| l.winning_bid).collect();
                let categories: HashSet<&str> =
                    lots.iter().filter_map(|l| l.category.as_deref()).collect();
                ConcentrationEvent {
                    auction_number: auction.to_string(),
                    winner_login: login.to_string(),
                    lots_won: lots.len(),
                    total_spent: scoring::total(&prices),
                    mean_price: scoring::mean(&prices),
                    categories: categories.len(),
                }
            })
            .collect();

        events.sort_by(|a, b| {
            b.lots_won
                .cmp(&a.lots_won)
                .then_with(|| cmp_auction_ids(&a.auction_number, &b.auction_number))
                .then_with(|| a.winner_login.cmp(&b.winner_login))
        });

        info!(
            min_lots = self.config.min_lots,
            events = events.len(),
            "Concentration scan complete"
        );

        events
    }
}

/// Numeric auction ids in numeric order, then any non-numeric ids as text.
fn cmp_auction_ids(a: &str, b: &str) -> Ordering {
    let key = |id: &str| match id.trim().parse::<u64>() {
        Ok(n) => (false, n),
        Err(_) => (true, 0),
    };
    key(a).cmp(&key(b)).then_with(|| a.cmp(b))
}

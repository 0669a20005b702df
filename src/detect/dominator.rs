//! Dominating-winner detection.
//!
//! Profiles every buyer across all auctions and tiers them by how many
//! lots they take per auction they appear in.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

use super::scoring::{self, DominanceTiers};
use crate::types::{AuditError, DominanceLevel, DominatorProfile, LotRecord, LotTable};

#[derive(Debug, Clone)]
pub struct DominatorConfig {
    /// Minimum total wins for a buyer to be profiled.
    pub min_wins: usize,
    pub tiers: DominanceTiers,
}

impl Default for DominatorConfig {
    fn default() -> Self {
        Self {
            min_wins: 10,
            tiers: DominanceTiers::default(),
        }
    }
}

pub struct DominatorDetector {
    config: DominatorConfig,
}

impl DominatorDetector {
    pub fn new(config: DominatorConfig) -> Result<Self, AuditError> {
        scoring::require_positive("min_wins", config.min_wins)?;
        config.tiers.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DominatorConfig {
        &self.config
    }

    /// Profiles ranked by total wins, then login.
    pub fn detect(&self, table: &LotTable) -> Vec<DominatorProfile> {
        let mut by_winner: BTreeMap<&str, Vec<&LotRecord>> = BTreeMap::new();
        for (login, lot) in table.sold() {
            by_winner.entry(login).or_default().push(lot);
        }

        let mut profiles: Vec<DominatorProfile> = by_winner
            .into_iter()
            .filter(|(_, lots)| lots.len() >= self.config.min_wins)
            .map(|(login, lots)| self.profile(login, &lots))
            .collect();

        // Stable sort keeps the BTreeMap's login order among equal win counts.
        profiles.sort_by(|a, b| b.total_wins.cmp(&a.total_wins));

        let critical = profiles
            .iter()
            .filter(|p| p.level == DominanceLevel::Critical)
            .count();
        info!(
            min_wins = self.config.min_wins,
            profiles = profiles.len(),
            critical,
            "Dominator scan complete"
        );

        profiles
    }

    fn profile(&self, login: &str, lots: &[&LotRecord]) -> DominatorProfile {
        let total_wins = lots.len();
        let auctions: HashSet<&str> = lots.iter().map(|l| l.auction_number.as_str()).collect();
        let categories: HashSet<&str> = lots.iter().filter_map(|l| l.category.as_deref()).collect();
        let prices: Vec<Decimal> = lots.iter().map(|l| l.winning_bid).collect();

        // Every sold lot belongs to an auction, so this is never zero.
        let auctions_participated = auctions.len().max(1);
        let wins_per_auction = total_wins as f64 / auctions_participated as f64;

        DominatorProfile {
            winner_login: login.to_string(),
            total_wins,
            auctions_participated,
            mean_winning_bid: scoring::mean(&prices),
            total_spent: scoring::total(&prices),
            mean_competition: lots.iter().map(|l| u64::from(l.bids_count)).sum::<u64>() as f64
                / total_wins as f64,
            categories_won: categories.len(),
            wins_per_auction,
            level: self.config.tiers.classify(wins_per_auction),
        }
    }
}

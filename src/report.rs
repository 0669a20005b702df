//! Plain-text report rendering.
//!
//! Pure formatting over an `AnalysisOutcome`; nothing here feeds back into
//! detection. Values are rounded for display only.

use std::fmt;
use std::path::Path;
use tracing::info;

use crate::detect::AnalysisOutcome;
use crate::types::{truncate_for_display, AuditError, DominanceLevel};

const WIDE_RULE: usize = 70;
const DESCRIPTION_WIDTH: usize = 80;

/// The text report for one run.
///
/// `top_n` caps the circular and concentration sections; every CRITICAL
/// dominator is listed.
pub struct Report<'a> {
    outcome: &'a AnalysisOutcome,
    top_n: usize,
}

impl<'a> Report<'a> {
    pub fn new(outcome: &'a AnalysisOutcome, top_n: usize) -> Self {
        Self { outcome, top_n }
    }

    fn write_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.outcome;
        let heavy = "=".repeat(WIDE_RULE);
        writeln!(f, "{heavy}")?;
        writeln!(f, "WOLMAR AUCTION MANIPULATION REPORT")?;
        writeln!(f, "{heavy}\n")?;

        writeln!(f, "Run: {}", outcome.run_id)?;
        writeln!(f, "Generated: {}", outcome.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "Dataset: {}", outcome.summary)?;
        writeln!(
            f,
            "Thresholds: min_purchases={} min_wins={} min_lots={}\n",
            outcome.thresholds.min_purchases, outcome.thresholds.min_wins, outcome.thresholds.min_lots,
        )
    }

    fn write_circular(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let light = "-".repeat(WIDE_RULE);
        let circular = &self.outcome.circular;
        writeln!(f, "{light}\n1. CIRCULAR PURCHASES\n{light}")?;
        if circular.is_empty() {
            return writeln!(f, "\nNo suspicious patterns found.");
        }
        writeln!(f, "\nFound: {} suspicious patterns\n", circular.len())?;
        writeln!(f, "TOP-{}:", self.top_n)?;
        writeln!(
            f,
            "{:<20} {:>5} {:>7} {:>12} {:>12} {:>6} {:>7} {:>7}  description",
            "winner", "count", "weeks", "avg_price", "total", "bids", "cv_%", "score"
        )?;
        for c in circular.iter().take(self.top_n) {
            writeln!(
                f,
                "{:<20} {:>5} {:>7.1} {:>12} {:>12} {:>6.1} {:>7.1} {:>7.1}  {}",
                c.winner_login,
                c.purchase_count,
                c.week_span,
                c.mean_price.round_dp(2),
                c.total_spent.round_dp(2),
                c.mean_competition,
                c.price_cv,
                c.suspicion_score,
                truncate_for_display(&c.item_description, DESCRIPTION_WIDTH),
            )?;
        }
        Ok(())
    }

    fn write_dominators(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let light = "-".repeat(WIDE_RULE);
        let dominators = &self.outcome.dominators;
        writeln!(f, "\n{light}\n2. DOMINATING WINNERS\n{light}")?;
        let critical: Vec<_> = dominators
            .iter()
            .filter(|p| p.level == DominanceLevel::Critical)
            .collect();
        writeln!(f, "\nActive winners: {}", dominators.len())?;
        if critical.is_empty() {
            return writeln!(f, "No critical dominators.");
        }
        writeln!(f, "Critical: {}\n", critical.len())?;
        writeln!(
            f,
            "{:<20} {:>6} {:>8} {:>12} {:>14} {:>6} {:>5} {:>8}",
            "winner", "wins", "auctions", "avg_bid", "total", "bids", "cats", "per_auc"
        )?;
        for p in critical {
            writeln!(
                f,
                "{:<20} {:>6} {:>8} {:>12} {:>14} {:>6.1} {:>5} {:>8.2}",
                p.winner_login,
                p.total_wins,
                p.auctions_participated,
                p.mean_winning_bid.round_dp(2),
                p.total_spent.round_dp(2),
                p.mean_competition,
                p.categories_won,
                p.wins_per_auction,
            )?;
        }
        Ok(())
    }

    fn write_concentration(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let light = "-".repeat(WIDE_RULE);
        let events = &self.outcome.concentration;
        writeln!(f, "\n{light}\n3. CONCENTRATION WITHIN AUCTIONS\n{light}")?;
        if events.is_empty() {
            return writeln!(f, "\nNo bulk purchases found.");
        }
        writeln!(f, "\nBulk purchases: {}\n", events.len())?;
        writeln!(
            f,
            "{:<10} {:<20} {:>5} {:>14} {:>12} {:>5}",
            "auction", "winner", "lots", "total", "avg_price", "cats"
        )?;
        for e in events.iter().take(self.top_n) {
            writeln!(
                f,
                "{:<10} {:<20} {:>5} {:>14} {:>12} {:>5}",
                e.auction_number,
                e.winner_login,
                e.lots_won,
                e.total_spent.round_dp(2),
                e.mean_price.round_dp(2),
                e.categories,
            )?;
        }
        Ok(())
    }

    fn write_recommendations(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(WIDE_RULE);
        writeln!(f, "\n{heavy}\nRECOMMENDATIONS\n{heavy}\n")?;
        writeln!(f, "FOR BUYERS:")?;
        writeln!(f, "1. Check the winner's history in the archive")?;
        writeln!(
            f,
            "2. A participant buying the same coin {}+ times is likely the seller",
            self.outcome.thresholds.min_purchases
        )?;
        writeln!(f, "3. Bid in the final seconds rather than early")?;
        writeln!(f, "4. Fix a hard price limit before bidding starts\n")?;
        writeln!(f, "FOR THE PLATFORM:")?;
        writeln!(f, "1. Show winner statistics on the lot page")?;
        writeln!(f, "2. Flag users with 5+ purchases of the same coin")?;
        writeln!(f, "3. Require verification at 10+ wins per month")?;
        writeln!(f, "4. Cap the number of wins per auction")
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_header(f)?;
        self.write_circular(f)?;
        self.write_dominators(f)?;
        self.write_concentration(f)?;
        self.write_recommendations(f)
    }
}

/// Render the full report as a string.
pub fn render(outcome: &AnalysisOutcome, top_n: usize) -> String {
    Report::new(outcome, top_n).to_string()
}

/// Render and write the report to `path`.
pub fn write_report(outcome: &AnalysisOutcome, top_n: usize, path: &Path) -> Result<(), AuditError> {
    std::fs::write(path, render(outcome, top_n)).map_err(|source| AuditError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), "Report saved");
    Ok(())
}

//! Detection engine: circular buyers, dominators, and concentration.

pub mod circular;
pub mod concentration;
pub mod dominator;
pub mod scoring;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::types::{
    AuditError, CircularPurchaseFinding, ConcentrationEvent, DatasetSummary, DominatorProfile,
    LotTable,
};
use circular::{CircularBuyerDetector, CircularConfig};
use concentration::{ConcentrationConfig, ConcentrationDetector};
use dominator::{DominatorConfig, DominatorDetector};
use scoring::{DominanceTiers, SuspicionWeights};

// ---------------------------------------------------------------------------
// Run parameters
// ---------------------------------------------------------------------------

/// Per-run minimum counts for the three detectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub min_purchases: usize,
    pub min_wins: usize,
    pub min_lots: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_purchases: 3,
            min_wins: 10,
            min_lots: 5,
        }
    }
}

/// Ranked output of one run over one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub summary: DatasetSummary,
    pub thresholds: Thresholds,
    pub circular: Vec<CircularPurchaseFinding>,
    pub dominators: Vec<DominatorProfile>,
    pub concentration: Vec<ConcentrationEvent>,
}

// ---------------------------------------------------------------------------
// Suite
// ---------------------------------------------------------------------------

/// The three detectors, configured once and run against a shared table.
///
/// Every detector is validated at construction, so a misconfigured suite
/// never touches data. Detectors hold no state between runs; the same
/// suite can be re-run on any number of tables.
pub struct DetectionSuite {
    thresholds: Thresholds,
    circular: Arc<CircularBuyerDetector>,
    dominators: Arc<DominatorDetector>,
    concentration: Arc<ConcentrationDetector>,
}

impl DetectionSuite {
    pub fn new(
        thresholds: Thresholds,
        weights: SuspicionWeights,
        tiers: DominanceTiers,
    ) -> Result<Self, AuditError> {
        let circular = CircularBuyerDetector::new(CircularConfig {
            min_purchases: thresholds.min_purchases,
            weights,
        })?;
        let dominators = DominatorDetector::new(DominatorConfig {
            min_wins: thresholds.min_wins,
            tiers,
        })?;
        let concentration = ConcentrationDetector::new(ConcentrationConfig {
            min_lots: thresholds.min_lots,
        })?;

        Ok(Self {
            thresholds,
            circular: Arc::new(circular),
            dominators: Arc::new(dominators),
            concentration: Arc::new(concentration),
        })
    }

    /// Suite with every default threshold, weight, and tier.
    pub fn with_defaults() -> Result<Self, AuditError> {
        Self::new(
            Thresholds::default(),
            SuspicionWeights::default(),
            DominanceTiers::default(),
        )
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Run all three detectors on the calling thread.
    pub fn run_blocking(&self, table: &LotTable) -> AnalysisOutcome {
        let summary = self.log_shape(table);
        AnalysisOutcome {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            summary,
            thresholds: self.thresholds.clone(),
            circular: self.circular.detect(table),
            dominators: self.dominators.detect(table),
            concentration: self.concentration.detect(table),
        }
    }

    /// Run the three detectors concurrently on blocking worker threads.
    ///
    /// The detectors only read the table, so they share it without locks.
    pub async fn run(&self, table: Arc<LotTable>) -> Result<AnalysisOutcome, AuditError> {
        let summary = self.log_shape(&table);

        let circular = {
            let (detector, table) = (Arc::clone(&self.circular), Arc::clone(&table));
            tokio::task::spawn_blocking(move || detector.detect(&table))
        };
        let dominators = {
            let (detector, table) = (Arc::clone(&self.dominators), Arc::clone(&table));
            tokio::task::spawn_blocking(move || detector.detect(&table))
        };
        let concentration = {
            let (detector, table) = (Arc::clone(&self.concentration), Arc::clone(&table));
            tokio::task::spawn_blocking(move || detector.detect(&table))
        };

        let (circular, dominators, concentration) =
            futures::try_join!(circular, dominators, concentration)
                .map_err(|e| AuditError::Task(e.to_string()))?;

        info!(
            circular = circular.len(),
            dominators = dominators.len(),
            concentration = concentration.len(),
            "Analysis complete"
        );

        Ok(AnalysisOutcome {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            summary,
            thresholds: self.thresholds.clone(),
            circular,
            dominators,
            concentration,
        })
    }

    fn log_shape(&self, table: &LotTable) -> DatasetSummary {
        let summary = table.summary();
        info!(
            lots = summary.total_lots,
            sold = summary.sold_lots,
            auctions = summary.auctions,
            winners = summary.winners,
            "Starting analysis"
        );
        if summary.sold_lots == 0 {
            warn!("No lots with a winner; every result table will be empty");
        }
        summary
    }
}

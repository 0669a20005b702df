//! Wolmar auditor — entry point.
//!
//! Loads configuration, initialises structured logging, loads the lot
//! table, runs the three detectors, then writes the ranked result tables
//! and the text report.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use wolmar_audit::config::AppConfig;
use wolmar_audit::detect::AnalysisOutcome;
use wolmar_audit::report;
use wolmar_audit::source::{self, JsonFileSource, LotSource};
use wolmar_audit::storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let cfg = AppConfig::load(&config_path)?;

    cfg.logging.init();

    info!(
        config = %config_path,
        min_purchases = cfg.thresholds.min_purchases,
        min_wins = cfg.thresholds.min_wins,
        min_lots = cfg.thresholds.min_lots,
        "Wolmar audit starting"
    );

    // Thresholds are checked here, before any data is read.
    let suite = cfg.detection_suite().context("Invalid detector configuration")?;

    let lots: Box<dyn LotSource> = Box::new(JsonFileSource::new(&cfg.input.lots_path));
    let table = lots
        .load()
        .await
        .with_context(|| format!("Failed to load lots from {}", lots.name()))?;
    let table = source::within_lookback(&table, cfg.input.lookback_months, Utc::now());

    let outcome = suite.run(Arc::new(table)).await?;
    log_outcome(&outcome);

    report::write_report(&outcome, cfg.output.top_n, &cfg.output.report_path)
        .context("Failed to write report")?;
    let saved = storage::save_results(&outcome, &cfg.output.results_dir)
        .context("Failed to save result tables")?;

    info!(
        report = %cfg.output.report_path.display(),
        circular = %saved.circular.display(),
        dominators = %saved.dominators.display(),
        concentration = %saved.concentration.display(),
        "Audit complete"
    );

    Ok(())
}

/// Log the headline of each result table.
fn log_outcome(outcome: &AnalysisOutcome) {
    if let Some(top) = outcome.circular.first() {
        info!(top = %top, total = outcome.circular.len(), "Most suspicious repeat buyer");
    }
    if let Some(top) = outcome.dominators.first() {
        info!(top = %top, total = outcome.dominators.len(), "Most active winner");
    }
    if let Some(top) = outcome.concentration.first() {
        info!(top = %top, total = outcome.concentration.len(), "Largest single-auction sweep");
    }
}

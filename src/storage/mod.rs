//! Result persistence.
//!
//! Writes the three ranked result tables to a results directory, one
//! pretty-printed JSON array per table, and reads them back for
//! downstream tooling.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::detect::AnalysisOutcome;
use crate::types::{AuditError, CircularPurchaseFinding, ConcentrationEvent, DominatorProfile};

pub const CIRCULAR_FILE: &str = "circular_buyers.json";
pub const DOMINATORS_FILE: &str = "dominators.json";
pub const CONCENTRATION_FILE: &str = "concentration.json";

/// Paths of the files written by `save_results`.
#[derive(Debug, Clone)]
pub struct SavedResults {
    pub circular: PathBuf,
    pub dominators: PathBuf,
    pub concentration: PathBuf,
}

/// Write all three result tables under `dir`, creating it if needed.
pub fn save_results(outcome: &AnalysisOutcome, dir: &Path) -> Result<SavedResults, AuditError> {
    std::fs::create_dir_all(dir).map_err(|source| io_error(dir, source))?;

    let saved = SavedResults {
        circular: write_table(dir, CIRCULAR_FILE, &outcome.circular)?,
        dominators: write_table(dir, DOMINATORS_FILE, &outcome.dominators)?,
        concentration: write_table(dir, CONCENTRATION_FILE, &outcome.concentration)?,
    };

    info!(
        dir = %dir.display(),
        run_id = %outcome.run_id,
        "Results saved"
    );
    Ok(saved)
}

pub fn load_circular(dir: &Path) -> Result<Vec<CircularPurchaseFinding>, AuditError> {
    read_table(&dir.join(CIRCULAR_FILE))
}

pub fn load_dominators(dir: &Path) -> Result<Vec<DominatorProfile>, AuditError> {
    read_table(&dir.join(DOMINATORS_FILE))
}

pub fn load_concentration(dir: &Path) -> Result<Vec<ConcentrationEvent>, AuditError> {
    read_table(&dir.join(CONCENTRATION_FILE))
}

fn write_table<T: Serialize>(dir: &Path, file: &str, rows: &[T]) -> Result<PathBuf, AuditError> {
    let path = dir.join(file);
    let json = serde_json::to_string_pretty(rows)?;
    std::fs::write(&path, json).map_err(|source| io_error(&path, source))?;
    debug!(path = %path.display(), rows = rows.len(), "Table written");
    Ok(path)
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AuditError> {
    let json = std::fs::read_to_string(path).map_err(|source| io_error(path, source))?;
    Ok(serde_json::from_str(&json)?)
}

fn io_error(path: &Path, source: std::io::Error) -> AuditError {
    AuditError::Io {
        path: path.display().to_string(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

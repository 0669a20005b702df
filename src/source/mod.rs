//! Lot sources.
//!
//! Defines the `LotSource` trait the binary loads its input through, with
//! two implementations:
//! - `JsonFileSource` — a JSON array exported from the auction archive
//! - `MemorySource` — rows already in memory (tests, embedding callers)
//!
//! A source hands back either a fully validated table or an error; the
//! detectors never see a partially loaded table.

use async_trait::async_trait;
use chrono::{DateTime, Months, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::{AuditError, LotRecord, LotTable};

/// Abstraction over wherever completed lots come from.
#[async_trait]
pub trait LotSource: Send + Sync {
    /// Load and validate the full lot table.
    async fn load(&self) -> Result<LotTable, AuditError>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// Reads a JSON array of lot objects from disk.
pub struct JsonFileSource {
    path: PathBuf,
    label: String,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let label = format!("json:{}", path.display());
        Self { path, label }
    }
}

#[async_trait]
impl LotSource for JsonFileSource {
    async fn load(&self) -> Result<LotTable, AuditError> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| AuditError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        debug!(path = %self.path.display(), bytes = json.len(), "Lot file read");

        let table = LotTable::from_json_str(&json)?;
        info!(path = %self.path.display(), lots = table.len(), "Lots loaded");
        Ok(table)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Serves a fixed set of rows; validated on every load.
pub struct MemorySource {
    rows: Vec<LotRecord>,
}

impl MemorySource {
    pub fn new(rows: Vec<LotRecord>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl LotSource for MemorySource {
    async fn load(&self) -> Result<LotTable, AuditError> {
        LotTable::new(self.rows.clone())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ---------------------------------------------------------------------------
// Lookback window
// ---------------------------------------------------------------------------

/// Keep only lots that ended within `months` before `now`.
///
/// `None` keeps the whole table.
pub fn within_lookback(table: &LotTable, months: Option<u32>, now: DateTime<Utc>) -> LotTable {
    let Some(months) = months else {
        return table.clone();
    };
    let cutoff = now
        .checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let windowed = table.since(cutoff);
    info!(
        months,
        cutoff = %cutoff.format("%Y-%m-%d"),
        kept = windowed.len(),
        dropped = table.len() - windowed.len(),
        "Lookback window applied"
    );
    windowed
}

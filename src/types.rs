//! Shared types for the Wolmar auditor.
//!
//! The lot table is the single immutable input every detector reads;
//! the finding types are the value objects the detectors hand back.
//! Nothing here holds cross-run state.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Lot records
// ---------------------------------------------------------------------------

/// One completed lot as exported from the auction archive.
///
/// Every column must be present; `winner_login` and `category` may be null
/// but not omitted, and unknown columns are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LotRecord {
    /// Unique only within its auction.
    #[serde(deserialize_with = "string_or_number")]
    pub lot_number: String,
    #[serde(deserialize_with = "string_or_number")]
    pub auction_number: String,
    /// Grouping key for circular-purchase detection; compared verbatim.
    pub item_description: String,
    /// `None` (or blank) when the lot went unsold.
    #[serde(deserialize_with = "optional_login")]
    pub winner_login: Option<String>,
    pub winning_bid: Decimal,
    pub bids_count: u32,
    #[serde(deserialize_with = "flexible_timestamp")]
    pub auction_end_date: DateTime<Utc>,
    #[serde(deserialize_with = "nullable")]
    pub category: Option<String>,
}

impl LotRecord {
    /// The buyer credited with this lot, if it sold.
    pub fn winner(&self) -> Option<&str> {
        self.winner_login.as_deref()
    }
}

impl fmt::Display for LotRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{}/{} {} -> {} @ {} ({} bids)",
            self.auction_number,
            self.lot_number,
            self.item_description,
            self.winner().unwrap_or("<unsold>"),
            self.winning_bid,
            self.bids_count,
        )
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Ident {
        Text(String),
        Int(i64),
    }

    match Ident::deserialize(deserializer) {
        Ok(Ident::Text(s)) => Ok(s),
        Ok(Ident::Int(n)) => Ok(n.to_string()),
        Err(_) => Err(serde::de::Error::custom("expected a string or integer identifier")),
    }
}

fn optional_login<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let login: Option<String> = Option::deserialize(deserializer)?;
    Ok(login.filter(|l| !l.trim().is_empty()))
}

fn nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::deserialize(deserializer)
}

fn flexible_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("unparsable auction_end_date: {raw:?}"))
    })
}

/// Parse an end date in any of the archive's export formats.
///
/// Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

// ---------------------------------------------------------------------------
// Lot table
// ---------------------------------------------------------------------------

/// Validated, read-only collection of lot records.
///
/// Construction is the only place rows are checked; detectors assume
/// every row they see is well formed.
#[derive(Debug, Clone, Default)]
pub struct LotTable {
    rows: Vec<LotRecord>,
}

impl LotTable {
    /// Build a table from already-typed records, rejecting negative prices.
    pub fn new(rows: Vec<LotRecord>) -> Result<Self, AuditError> {
        for (row, lot) in rows.iter().enumerate() {
            validate_lot(row, lot)?;
        }
        Ok(Self { rows })
    }

    /// Parse a JSON array of lot objects, failing on the first bad row.
    pub fn from_json_str(json: &str) -> Result<Self, AuditError> {
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(json).map_err(|e| AuditError::MalformedInput {
                row: 0,
                message: format!("expected a JSON array of lots: {e}"),
            })?;

        let mut rows = Vec::with_capacity(raw.len());
        for (row, value) in raw.into_iter().enumerate() {
            let lot: LotRecord = serde_json::from_value(value).map_err(|e| {
                AuditError::MalformedInput {
                    row,
                    message: e.to_string(),
                }
            })?;
            validate_lot(row, &lot)?;
            rows.push(lot);
        }
        Ok(Self { rows })
    }

    /// All rows, sold or not.
    pub fn rows(&self) -> &[LotRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows that carry a winner, paired with that winner's login.
    pub fn sold(&self) -> impl Iterator<Item = (&str, &LotRecord)> {
        self.rows
            .iter()
            .filter_map(|lot| lot.winner().map(|login| (login, lot)))
    }

    /// A new table keeping only lots that ended at or after `cutoff`.
    pub fn since(&self, cutoff: DateTime<Utc>) -> Self {
        Self {
            rows: self
                .rows
                .iter()
                .filter(|lot| lot.auction_end_date >= cutoff)
                .cloned()
                .collect(),
        }
    }

    /// Shape of the dataset for report headers and run logs.
    pub fn summary(&self) -> DatasetSummary {
        let auctions: HashSet<&str> = self.rows.iter().map(|l| l.auction_number.as_str()).collect();
        let winners: HashSet<&str> = self.sold().map(|(login, _)| login).collect();

        DatasetSummary {
            total_lots: self.rows.len(),
            sold_lots: self.sold().count(),
            auctions: auctions.len(),
            winners: winners.len(),
            first_end_date: self.rows.iter().map(|l| l.auction_end_date).min(),
            last_end_date: self.rows.iter().map(|l| l.auction_end_date).max(),
        }
    }
}

fn validate_lot(row: usize, lot: &LotRecord) -> Result<(), AuditError> {
    if lot.winning_bid < Decimal::ZERO {
        return Err(AuditError::MalformedInput {
            row,
            message: format!("negative winning_bid {}", lot.winning_bid),
        });
    }
    Ok(())
}

/// Dataset shape reported alongside the findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_lots: usize,
    pub sold_lots: usize,
    pub auctions: usize,
    pub winners: usize,
    pub first_end_date: Option<DateTime<Utc>>,
    pub last_end_date: Option<DateTime<Utc>>,
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let period = match (self.first_end_date, self.last_end_date) {
            (Some(first), Some(last)) => format!(
                "{} - {}",
                first.format("%Y-%m-%d %H:%M"),
                last.format("%Y-%m-%d %H:%M")
            ),
            _ => "n/a".to_string(),
        };
        write!(
            f,
            "period: {period} | lots: {} ({} sold) | auctions: {} | winners: {}",
            self.total_lots, self.sold_lots, self.auctions, self.winners,
        )
    }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// Repeat purchases of one item description by one buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircularPurchaseFinding {
    pub winner_login: String,
    pub item_description: String,
    pub purchase_count: usize,
    /// Whole days between first and last win, divided by 7.
    pub week_span: f64,
    pub mean_price: Decimal,
    pub total_spent: Decimal,
    pub mean_competition: f64,
    /// Sample standard deviation of the price over its mean, in percent.
    pub price_cv: f64,
    pub suspicion_score: f64,
}

impl fmt::Display for CircularPurchaseFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x{} \"{}\" over {:.1}w (cv {:.1}%, score {:.1})",
            self.winner_login,
            self.purchase_count,
            truncate_for_display(&self.item_description, 80),
            self.week_span,
            self.price_cv,
            self.suspicion_score,
        )
    }
}

/// Wins-per-auction tier of a dominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DominanceLevel {
    Normal,
    Medium,
    High,
    Critical,
}

impl fmt::Display for DominanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DominanceLevel::Normal => write!(f, "NORMAL"),
            DominanceLevel::Medium => write!(f, "MEDIUM"),
            DominanceLevel::High => write!(f, "HIGH"),
            DominanceLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A buyer's aggregate record across every auction in the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominatorProfile {
    pub winner_login: String,
    pub total_wins: usize,
    pub auctions_participated: usize,
    pub mean_winning_bid: Decimal,
    pub total_spent: Decimal,
    pub mean_competition: f64,
    pub categories_won: usize,
    pub wins_per_auction: f64,
    pub level: DominanceLevel,
}

impl fmt::Display for DominatorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} wins in {} auctions ({:.2}/auction)",
            self.winner_login,
            self.level,
            self.total_wins,
            self.auctions_participated,
            self.wins_per_auction,
        )
    }
}

/// Many lots swept by one buyer inside one auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationEvent {
    pub auction_number: String,
    pub winner_login: String,
    pub lots_won: usize,
    pub total_spent: Decimal,
    pub mean_price: Decimal,
    pub categories: usize,
}

impl fmt::Display for ConcentrationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "auction #{}: {} won {} lots for {}",
            self.auction_number,
            self.winner_login,
            self.lots_won,
            self.total_spent.round_dp(2),
        )
    }
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_for_display(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the auditor.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed input at row {row}: {message}")]
    MalformedInput { row: usize, message: String },

    #[error("I/O error ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Detector task failed: {0}")]
    Task(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

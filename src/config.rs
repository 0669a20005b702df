//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every key has a default, so a missing file or a partial file is valid;
//! `validate` rejects values the detectors cannot run with.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

use crate::detect::scoring::{self, DominanceTiers, SuspicionWeights};
use crate::detect::{DetectionSuite, Thresholds};
use crate::types::AuditError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub thresholds: Thresholds,
    pub scoring: SuspicionWeights,
    pub tiers: DominanceTiers,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub lots_path: PathBuf,
    /// Only analyse lots that ended within this many months.
    pub lookback_months: Option<u32>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            lots_path: PathBuf::from("data/wolmar_lots.json"),
            lookback_months: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub results_dir: PathBuf,
    pub report_path: PathBuf,
    /// Rows per report section.
    pub top_n: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            report_path: PathBuf::from("wolmar_report.txt"),
            top_n: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "wolmar_audit=info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    /// Install the global `tracing` subscriber. `RUST_LOG` wins over `level`.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_target(true)
                    .init();
            }
            _ => {
                fmt().with_env_filter(filter).with_target(true).init();
            }
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds below one, bad weights, unordered tiers.
    pub fn validate(&self) -> Result<(), AuditError> {
        scoring::require_positive("thresholds.min_purchases", self.thresholds.min_purchases)?;
        scoring::require_positive("thresholds.min_wins", self.thresholds.min_wins)?;
        scoring::require_positive("thresholds.min_lots", self.thresholds.min_lots)?;
        self.scoring.validate()?;
        self.tiers.validate()?;
        scoring::require_positive("output.top_n", self.output.top_n)
    }

    /// Build the detector suite this configuration describes.
    pub fn detection_suite(&self) -> Result<DetectionSuite, AuditError> {
        DetectionSuite::new(
            self.thresholds.clone(),
            self.scoring.clone(),
            self.tiers.clone(),
        )
    }
}

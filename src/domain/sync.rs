//! Sync-related domain models and configuration.
//!
//! Contains types for the remote sync cycle, its configuration,
//! and the mapping from remote records to quotes.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::Quote;

/// Configuration for the remote sync client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Interval between sync operations in seconds.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Whether periodic sync is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Remote endpoint returning a JSON array of records with a `title`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Number of leading remote records consumed per cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Category assigned to every quote mapped from the remote.
    #[serde(default = "default_server_category")]
    pub server_category: String,

    /// Upper bound on a single fetch, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            batch_size: default_batch_size(),
            server_category: default_server_category(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

const fn default_interval() -> u64 {
    30
}

const fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "https://jsonplaceholder.typicode.com/posts".to_string()
}

const fn default_batch_size() -> usize {
    5
}

fn default_server_category() -> String {
    "ServerQuote".to_string()
}

const fn default_request_timeout() -> u64 {
    10
}

/// Path configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathConfig {
    /// Base data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Remote sync configuration.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Path configuration.
    #[serde(default)]
    pub paths: PathConfig,
}

impl AppConfig {
    /// Get the data directory, using default if not configured.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.paths
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".quote-sync")
    }

    /// Get the storage database path.
    #[must_use]
    pub fn storage_db_path(&self) -> PathBuf {
        self.data_dir().join("quotes.db")
    }

    /// Get the config file path.
    #[must_use]
    pub fn config_file_path(&self) -> PathBuf {
        self.data_dir().join("config.toml")
    }
}

/// A record as served by the remote endpoint. Only the title is used.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteRecord {
    /// Title, mapped to the quote text.
    pub title: String,
}

/// Project the leading `batch_size` records into quotes of one fixed category.
///
/// Titles are kept verbatim; records whose title is blank are dropped.
#[must_use]
pub fn map_remote(records: &[RemoteRecord], batch_size: usize, category: &str) -> Vec<Quote> {
    records
        .iter()
        .take(batch_size)
        .filter(|record| {
            let blank = record.title.trim().is_empty();
            if blank {
                tracing::debug!("Dropping remote record with blank title");
            }
            !blank
        })
        .map(|record| Quote {
            text: record.title.clone(),
            category: category.to_string(),
        })
        .collect()
}

/// Phase of the sync state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// Waiting for the next trigger.
    #[default]
    Idle,
    /// Waiting on the remote read.
    Fetching,
    /// Merging and persisting the fetched batch.
    Reconciling,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching => write!(f, "fetching"),
            Self::Reconciling => write!(f, "reconciling"),
        }
    }
}

/// Outcome of one completed sync cycle.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Quotes mapped from the remote batch.
    pub fetched: usize,
    /// Quotes appended to the local collection.
    pub added: usize,
    /// Quotes already present locally.
    pub skipped: usize,
    /// Collection size after the merge.
    pub total: usize,
    /// When the cycle finished.
    pub finished_at: DateTime<Utc>,
}

/// Current state of synchronization.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    /// Phase of the current cycle.
    pub phase: SyncPhase,

    /// Last successful sync timestamp.
    pub last_sync: Option<DateTime<Utc>>,

    /// Last error message if any.
    pub last_error: Option<String>,

    /// Cycles that reached the end of reconciliation.
    pub cycles_completed: u64,

    /// Cycles abandoned on a fetch or persistence failure.
    pub cycles_failed: u64,

    /// Quotes added across all cycles.
    pub quotes_added: u64,
}

impl SyncState {
    /// Move to a new phase.
    #[must_use]
    pub const fn entering(mut self, phase: SyncPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Record a completed cycle and return to idle.
    #[must_use]
    pub fn completed(mut self, report: &SyncReport) -> Self {
        self.phase = SyncPhase::Idle;
        self.last_sync = Some(report.finished_at);
        self.last_error = None;
        self.cycles_completed += 1;
        self.quotes_added += report.added as u64;
        self
    }

    /// Record a failed cycle and return to idle.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.phase = SyncPhase::Idle;
        self.last_error = Some(error.into());
        self.cycles_failed += 1;
        self
    }
}

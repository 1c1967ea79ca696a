//! Compliance configuration
//!
//! Tunables are loaded from JSON; missing fields fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Hard ceiling on concurrent windows per limit scope
pub const MAX_TIME_LIMITS: usize = 4;

/// Configuration for compliance instances and the modules wired to them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Maximum number of modules bound to one compliance instance
    #[serde(default = "default_max_modules")]
    pub max_modules: usize,

    /// Capacity of each time-limit list (clamped to [`MAX_TIME_LIMITS`])
    #[serde(default = "default_max_time_limits")]
    pub max_time_limits: usize,

    /// Window of the exchange monthly limit, in seconds
    #[serde(default = "default_monthly_window_secs")]
    pub monthly_window_secs: u64,

    /// Event journal file; `None` keeps events in memory
    #[serde(default)]
    pub journal_path: Option<PathBuf>,
}

fn default_max_modules() -> usize {
    25
}

fn default_max_time_limits() -> usize {
    MAX_TIME_LIMITS
}

fn default_monthly_window_secs() -> u64 {
    30 * 24 * 60 * 60 // 30 days
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            max_modules: default_max_modules(),
            max_time_limits: default_max_time_limits(),
            monthly_window_secs: default_monthly_window_secs(),
            journal_path: None,
        }
    }
}

impl ComplianceConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Time-limit capacity, never above [`MAX_TIME_LIMITS`]
    pub fn time_limit_capacity(&self) -> usize {
        self.max_time_limits.min(MAX_TIME_LIMITS)
    }

    /// Monthly window as chrono Duration
    pub fn monthly_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.monthly_window_secs).unwrap_or(i64::MAX))
    }
}

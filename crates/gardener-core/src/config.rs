//! Runtime configuration, persisted as a flat JSON file

use crate::{GardenerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Full configuration set.
///
/// Loading merges the file over compiled defaults (missing keys keep their
/// default); saving always writes the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenerConfig {
    /// Hosted generation service API key (required to start the loop)
    pub api_key: String,
    /// Local generation model identifier
    pub model: String,
    /// Seconds to sleep after a successful commit
    pub interval_secs: u64,
    /// Daily commit quota
    pub max_commits_per_day: u32,
    /// Remote repository URL; empty disables pushing
    pub repo_url: String,
    pub committer_name: String,
    pub committer_email: String,
    /// CPU load percentage below which the system counts as idle
    pub idle_threshold_percent: u8,
}

impl Default for GardenerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "qwen2.5-coder:7b".to_string(),
            interval_secs: 60,
            max_commits_per_day: 20,
            repo_url: String::new(),
            committer_name: "GardenerBot".to_string(),
            committer_email: "bot@example.com".to_string(),
            idle_threshold_percent: 40,
        }
    }
}

impl GardenerConfig {
    /// Load configuration, merging the file over defaults.
    ///
    /// A missing file yields the defaults; an unreadable or malformed file
    /// is a hard error so a typo never silently resets the configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| GardenerError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Persist the whole configuration set
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

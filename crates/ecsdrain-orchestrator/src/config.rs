//! Drain configuration (`ecsdrain.toml`).
//!
//! ```toml
//! dry_run = false
//!
//! [health]
//! max_attempts = 5
//! interval_secs = 5
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ecsdrain_health::PollConfig;

/// Environment variable that toggles dry-run mode.
pub const DRY_RUN_ENV: &str = "DRYRUN";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DrainConfig {
    /// Skip deregistration and the drain wait; discovery and health
    /// polling still run.
    pub dry_run: bool,
    pub health: HealthSettings,
}

/// Health-poll budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HealthSettings {
    pub max_attempts: u32,
    pub interval_secs: u64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval_secs: 5,
        }
    }
}

impl HealthSettings {
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            max_attempts: self.max_attempts,
            interval: Duration::from_secs(self.interval_secs),
        }
    }
}

impl DrainConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: DrainConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path` (defaults when absent), then apply `DRYRUN`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        let env = std::env::var(DRY_RUN_ENV).ok();
        let config = config.with_dry_run_env(env.as_deref());
        debug!(dry_run = config.dry_run, "drain config loaded");
        Ok(config)
    }

    /// Apply the value of `DRYRUN`, if set. Any non-empty value enables
    /// dry run; an empty value disables it.
    pub fn with_dry_run_env(mut self, value: Option<&str>) -> Self {
        if let Some(v) = value {
            self.dry_run = !v.is_empty();
        }
        self
    }

    pub fn poll_config(&self) -> PollConfig {
        self.health.poll_config()
    }
}

//! Session configuration

use std::time::Duration;

use filemap_fs::{ConfigStore, NormalizedPath, RobustnessConfig};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Knobs for one run; every field has a default.
///
/// ```toml
/// dry_run = false
/// lock_timeout_ms = 5000
/// enable_fsync = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Serialize dirty files but write nothing; files stay dirty.
    pub dry_run: bool,
    /// Upper bound for acquiring the write lock on a file.
    pub lock_timeout_ms: u64,
    /// fsync each rewritten file before it replaces the original.
    pub enable_fsync: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let robustness = RobustnessConfig::default();
        Self {
            dry_run: false,
            lock_timeout_ms: duration_millis(robustness.lock_timeout),
            enable_fsync: robustness.enable_fsync,
        }
    }
}

impl SessionConfig {
    /// Load from a TOML, JSON or YAML file (chosen by extension).
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        Ok(ConfigStore::new().load(path)?)
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Write settings handed to the atomic writer.
    pub fn robustness(&self) -> RobustnessConfig {
        RobustnessConfig {
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            enable_fsync: self.enable_fsync,
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

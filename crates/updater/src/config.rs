use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default delay before `latest`/`error` fall back to `idle`
const DEFAULT_STATUS_REVERT_DELAY_MS: u64 = 3000;

/// Updater configuration, usually read from the app's settings store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdaterConfig {
    /// How long transient statuses stay visible before reverting to idle
    #[serde(alias = "status_revert_delay_ms")]
    pub status_revert_delay_ms: u64,
    /// Run the silent version check once when the app starts
    #[serde(alias = "check_on_startup")]
    pub check_on_startup: bool,
    /// Look for an update staged before the last restart
    #[serde(alias = "resume_pending_on_startup")]
    pub resume_pending_on_startup: bool,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            status_revert_delay_ms: DEFAULT_STATUS_REVERT_DELAY_MS,
            check_on_startup: true,
            resume_pending_on_startup: true,
        }
    }
}

impl UpdaterConfig {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid updater config: {}", e))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, String> {
        serde_json::from_value(value).map_err(|e| format!("Invalid updater config: {}", e))
    }

    pub fn status_revert_delay(&self) -> Duration {
        Duration::from_millis(self.status_revert_delay_ms)
    }
}

//! Events emitted by the backend while an update is in flight.

use serde::{Deserialize, Serialize};

/// Name of the backend event stream carrying [`DownloadProgress`] records.
pub const DOWNLOAD_PROGRESS_EVENT: &str = "update-download-progress";

/// Download progress snapshot. Transient; only the latest value matters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub downloaded: u64,
    /// Expected size in bytes, 0 when the server sent no content length
    pub total: u64,
    pub percent: f64,
}

impl DownloadProgress {
    pub fn new(downloaded: u64, total: u64) -> Self {
        let percent = if total > 0 {
            (downloaded as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Self {
            downloaded,
            total,
            percent,
        }
    }

    /// True once every expected byte has arrived
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.downloaded >= self.total
    }
}

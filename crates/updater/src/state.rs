//! Update lifecycle state and its transition rules.
//!
//! State diagram:
//! ```text
//! Idle/Latest/Error ──check──> Checking ──found──> Available ──download──> Downloading
//!                                  │                   ▲                        │
//!                                  │            [download error]            [done]
//!                                  │                   │                        ↓
//!                                  ├──none──> Latest ──(delay)──> Idle     Downloaded
//!                                  │                                            │
//!                                  └──failed──> Error ──(delay)──> Idle    [install]
//!                                                                               ↓
//!                      Downloaded <──[install error]── Installing <─────────────┘
//! ```
//!
//! Every mutation here is a plain function over the state value; scheduling of the
//! delayed revert lives in the orchestrator.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::metadata::UpdateMetadata;

/// Update lifecycle status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UpdateStatus {
    #[default]
    Idle,
    Checking,
    Available,
    Downloading,
    Installing,
    Downloaded,
    /// Check found nothing newer; reverts to idle after a delay
    Latest,
    /// Check failed; reverts to idle after a delay
    Error,
}

impl UpdateStatus {
    /// Statuses that fall back to `Idle` on their own
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Latest | Self::Error)
    }
}

/// Everything the UI observes about the update lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLifecycleState {
    pub status: UpdateStatus,
    pub update_info: Option<UpdateMetadata>,
    /// Percentage, 0..=100
    pub download_progress: f64,
    /// Only held while `Downloaded` or `Installing`
    pub downloaded_file_path: Option<PathBuf>,
    pub error_message: Option<String>,
    /// Never un-set for the lifetime of the process
    pub has_checked_on_startup: bool,
    pub is_update_modal_visible: bool,
    /// The user (or an automatic flow) has begun downloading or installing
    pub has_started_update_flow: bool,
}

impl UpdateLifecycleState {
    pub fn is_update_available(&self) -> bool {
        matches!(
            self.status,
            UpdateStatus::Available
                | UpdateStatus::Downloading
                | UpdateStatus::Downloaded
                | UpdateStatus::Installing
        )
    }

    pub fn is_downloading(&self) -> bool {
        self.status == UpdateStatus::Downloading
    }

    pub fn is_installing(&self) -> bool {
        self.status == UpdateStatus::Installing
    }

    pub fn is_ready_to_install(&self) -> bool {
        self.status == UpdateStatus::Downloaded
    }

    /// Closing the window now would interrupt a download or install the user started
    pub fn should_warn_on_close(&self) -> bool {
        self.has_started_update_flow && (self.is_downloading() || self.is_installing())
    }

    fn holds_artifact(&self) -> bool {
        self.status == UpdateStatus::Downloaded && self.downloaded_file_path.is_some()
    }

    fn has_update(&self) -> bool {
        self.update_info.as_ref().is_some_and(|info| info.has_update)
    }

    // ========== Transitions ==========

    /// A staged artifact keeps `Downloaded` through a visible check so it is not dropped.
    pub(crate) fn begin_check(&mut self, silent: bool) {
        if !silent && !self.holds_artifact() {
            self.status = UpdateStatus::Checking;
        }
        self.error_message = None;
        self.enforce_invariants();
    }

    pub(crate) fn apply_update_found(&mut self, info: UpdateMetadata) {
        self.update_info = Some(info);
        self.status = UpdateStatus::Available;
        self.download_progress = 0.0;
        self.downloaded_file_path = None;
        self.is_update_modal_visible = true;
        self.has_started_update_flow = false;
    }

    pub(crate) fn apply_no_update(&mut self, silent: bool) {
        self.status = if silent {
            UpdateStatus::Idle
        } else {
            UpdateStatus::Latest
        };
        self.update_info = None;
        self.download_progress = 0.0;
        self.downloaded_file_path = None;
        self.is_update_modal_visible = false;
        self.has_started_update_flow = false;
    }

    pub(crate) fn apply_check_failed(&mut self, message: String, silent: bool) {
        self.error_message = Some(message);
        if !silent && !self.holds_artifact() {
            self.status = UpdateStatus::Error;
        }
        self.enforce_invariants();
    }

    pub(crate) fn set_downloading(&mut self, progress: f64) {
        self.status = UpdateStatus::Downloading;
        self.download_progress = clamp_percent(progress);
        self.has_started_update_flow = true;
        self.enforce_invariants();
    }

    /// Progress report from the backend; ignored unless a download is being tracked.
    /// Returns whether anything changed.
    pub(crate) fn apply_progress(&mut self, progress: f64) -> bool {
        if self.status != UpdateStatus::Downloading {
            return false;
        }
        let progress = clamp_percent(progress);
        if progress == self.download_progress {
            return false;
        }
        self.download_progress = progress;
        true
    }

    pub(crate) fn set_downloaded(&mut self, file_path: PathBuf) {
        self.status = UpdateStatus::Downloaded;
        self.downloaded_file_path = Some(file_path);
        self.download_progress = 100.0;
        self.has_started_update_flow = true;
    }

    pub(crate) fn set_installing(&mut self) {
        self.status = UpdateStatus::Installing;
        self.has_started_update_flow = true;
    }

    pub(crate) fn apply_download_error(&mut self, message: String) {
        self.error_message = Some(message);
        self.status = if self.has_update() {
            UpdateStatus::Available
        } else {
            UpdateStatus::Error
        };
        self.enforce_invariants();
    }

    /// Degrades to the least destructive state: a held artifact is never dropped.
    pub(crate) fn apply_install_error(&mut self, message: String) {
        self.error_message = Some(message);
        if self.downloaded_file_path.is_some() {
            self.status = UpdateStatus::Downloaded;
            self.has_started_update_flow = true;
            return;
        }
        self.status = if self.has_update() {
            UpdateStatus::Available
        } else {
            UpdateStatus::Error
        };
        self.enforce_invariants();
    }

    /// Back to `Idle` with everything cleared except the startup guard.
    pub(crate) fn reset(&mut self) {
        *self = Self {
            has_checked_on_startup: self.has_checked_on_startup,
            ..Self::default()
        };
    }

    /// Delayed fallback of a transient status. Returns whether the state changed.
    pub(crate) fn revert_transient(&mut self, expected: UpdateStatus) -> bool {
        if self.status != expected || !expected.is_transient() {
            return false;
        }
        self.status = UpdateStatus::Idle;
        self.enforce_invariants();
        true
    }

    fn enforce_invariants(&mut self) {
        if !matches!(
            self.status,
            UpdateStatus::Downloaded | UpdateStatus::Installing
        ) {
            self.downloaded_file_path = None;
        }
        if matches!(self.status, UpdateStatus::Idle | UpdateStatus::Latest) {
            self.update_info = None;
        }
    }
}

fn clamp_percent(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 100.0)
    }
}

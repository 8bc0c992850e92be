//! UI-side sequencing of download, install and resume.
//!
//! The orchestrator never calls the download or install endpoints itself; a UI
//! flow does, reporting outcomes back through the orchestrator's mutators.
//! [`UpdateFlow`] packages that sequencing so every surface drives it the same way.

use std::path::PathBuf;

use log::{info, warn};
use tokio::sync::OnceCell;

use crate::config::UpdaterConfig;
use crate::error::{Result, UpdateError};
use crate::metadata::{PendingUpdate, UpdateMetadata};
use crate::orchestrator::UpdateOrchestrator;
use crate::state::UpdateStatus;
use crate::version::is_newer_version;

/// What the startup sequence found
#[derive(Debug, Clone, PartialEq)]
pub enum StartupOutcome {
    /// An update staged before the last restart is ready to install
    PendingUpdate(PendingUpdate),
    UpdateAvailable(UpdateMetadata),
    UpToDate,
    /// Startup checks are turned off in the config
    Skipped,
}

pub struct UpdateFlow {
    orchestrator: UpdateOrchestrator,
    config: UpdaterConfig,
    /// Version of the running binary, used to discard stale pending records
    current_version: Option<String>,
    /// Pending record read once per process
    pending: OnceCell<Option<PendingUpdate>>,
}

impl UpdateFlow {
    pub fn new(orchestrator: UpdateOrchestrator, config: UpdaterConfig) -> Self {
        Self {
            orchestrator,
            config,
            current_version: None,
            pending: OnceCell::new(),
        }
    }

    pub fn with_current_version(mut self, version: impl Into<String>) -> Self {
        self.current_version = Some(version.into());
        self
    }

    pub fn orchestrator(&self) -> &UpdateOrchestrator {
        &self.orchestrator
    }

    /// Resume a staged update if there is one, otherwise run the startup check.
    ///
    /// A resumed artifact skips the check so it cannot be replaced by fresh metadata.
    pub async fn startup(&self) -> Result<StartupOutcome> {
        if self.config.resume_pending_on_startup {
            if let Some(pending) = self.resume_pending().await {
                return Ok(StartupOutcome::PendingUpdate(pending));
            }
        }

        if !self.config.check_on_startup {
            return Ok(StartupOutcome::Skipped);
        }

        Ok(match self.orchestrator.check_for_update_on_startup().await? {
            Some(info) => StartupOutcome::UpdateAvailable(info),
            None => StartupOutcome::UpToDate,
        })
    }

    /// Read the pending-update record (once per process) and adopt its artifact.
    ///
    /// Read failures are logged and treated as "nothing pending".
    pub async fn resume_pending(&self) -> Option<PendingUpdate> {
        let orchestrator = &self.orchestrator;
        let current_version = self.current_version.as_deref();

        self.pending
            .get_or_init(move || async move {
                let client = orchestrator.client();
                let pending = match client.check_pending_update().await {
                    Ok(pending) => pending?,
                    Err(e) => {
                        warn!("[Update] Ignoring unreadable pending update: {}", e);
                        return None;
                    }
                };

                if let Some(current) = current_version {
                    if !is_newer_version(current, &pending.version) {
                        info!(
                            "[Update] Pending update {} is not newer than {}, discarding",
                            pending.version, current
                        );
                        if let Err(e) = client.clear_pending_update().await {
                            warn!("[Update] Failed to clear stale pending update: {}", e);
                        }
                        return None;
                    }
                }

                info!("[Update] Resuming pending update {}", pending.version);
                orchestrator.set_downloaded(pending.file_path.clone());
                Some(pending)
            })
            .await
            .clone()
    }

    /// Download the update described by the held metadata.
    ///
    /// Progress events are tracked for the duration of the call only.
    pub async fn download(&self) -> Result<PathBuf> {
        let info = self
            .orchestrator
            .state()
            .update_info
            .filter(|info| info.has_update)
            .ok_or(UpdateError::NoUpdateAvailable)?;
        let url = info.download_url.as_deref().ok_or(UpdateError::NoDownloadUrl)?;

        self.orchestrator.set_downloading(0.0);

        let client = self.orchestrator.client();
        let tracker = self.orchestrator.clone();
        let subscription = client.on_download_progress(move |progress| {
            tracker.set_download_progress(progress.percent)
        });

        let result = client.download_update(url, info.sha256.as_deref()).await;
        subscription.unsubscribe();

        if self.orchestrator.status() != UpdateStatus::Downloading {
            info!("[Update] Download finished after tracking was abandoned");
            return result;
        }

        match result {
            Ok(path) => {
                self.orchestrator.set_downloaded(path.clone());
                Ok(path)
            }
            Err(e) => {
                self.orchestrator.set_download_error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Install the downloaded artifact. May never return if the backend restarts the app.
    pub async fn install(&self) -> Result<()> {
        let state = self.orchestrator.state();
        let file_path = state
            .downloaded_file_path
            .ok_or(UpdateError::NoDownloadedArtifact)?;
        let version = match state.update_info {
            Some(info) => info.latest_version,
            None => self
                .pending
                .get()
                .and_then(|pending| pending.as_ref())
                .map(|pending| pending.version.clone())
                .ok_or(UpdateError::NoDownloadedArtifact)?,
        };

        self.orchestrator.set_installing();

        match self
            .orchestrator
            .client()
            .install_update(&file_path, &version)
            .await
        {
            Ok(()) => {
                info!("[Update] Install of {} handed to the backend", version);
                Ok(())
            }
            Err(e) => {
                self.orchestrator.set_install_error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Restart and apply the staged update on next boot.
    pub async fn restart_and_install(&self) -> Result<()> {
        self.orchestrator.set_installing();
        if let Err(e) = self.orchestrator.client().restart_and_install().await {
            self.orchestrator.set_install_error(&e.to_string());
            return Err(e);
        }
        Ok(())
    }

    /// The user abandons the staged update: drop the record and the tracked state.
    pub async fn dismiss_pending(&self) -> Result<()> {
        self.orchestrator.client().clear_pending_update().await?;
        self.orchestrator.reset();
        Ok(())
    }
}

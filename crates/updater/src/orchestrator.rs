use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::{watch, OnceCell};
use tokio_util::sync::CancellationToken;

use crate::client::UpdateClient;
use crate::config::UpdaterConfig;
use crate::error::Result;
use crate::metadata::UpdateMetadata;
use crate::state::{UpdateLifecycleState, UpdateStatus};

/// Owns the update lifecycle state and maps client results onto transitions.
///
/// Cheap to clone; every clone drives the same state. The application shell
/// constructs one and hands clones to whichever UI surfaces need it.
#[derive(Clone)]
pub struct UpdateOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    client: UpdateClient,
    state: watch::Sender<UpdateLifecycleState>,
    revert_delay: Duration,
    /// Cancels the pending `Latest`/`Error` -> `Idle` fallback
    revert_timer: Mutex<Option<CancellationToken>>,
    /// Set once the one automatic check per process has finished
    startup_check: OnceCell<()>,
}

impl UpdateOrchestrator {
    pub fn new(client: UpdateClient, config: &UpdaterConfig) -> Self {
        let (state, _) = watch::channel(UpdateLifecycleState::default());
        Self {
            inner: Arc::new(Inner {
                client,
                state,
                revert_delay: config.status_revert_delay(),
                revert_timer: Mutex::new(None),
                startup_check: OnceCell::new(),
            }),
        }
    }

    pub fn client(&self) -> &UpdateClient {
        &self.inner.client
    }

    /// Snapshot of the current state
    pub fn state(&self) -> UpdateLifecycleState {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> UpdateStatus {
        self.inner.state.borrow().status
    }

    /// Read-only observation of every state change
    pub fn subscribe(&self) -> watch::Receiver<UpdateLifecycleState> {
        self.inner.state.subscribe()
    }

    pub fn is_update_available(&self) -> bool {
        self.inner.state.borrow().is_update_available()
    }

    pub fn is_downloading(&self) -> bool {
        self.inner.state.borrow().is_downloading()
    }

    pub fn is_installing(&self) -> bool {
        self.inner.state.borrow().is_installing()
    }

    pub fn is_ready_to_install(&self) -> bool {
        self.inner.state.borrow().is_ready_to_install()
    }

    /// Check the feed for a newer version.
    ///
    /// A silent check skips the `Checking`/`Latest` statuses and only surfaces a
    /// found update. While `Installing` this is a no-op returning the held metadata.
    /// Errors are recorded in the state and then returned to the caller.
    pub async fn check_for_update(&self, silent: bool) -> Result<Option<UpdateMetadata>> {
        {
            let state = self.inner.state.borrow();
            if state.status == UpdateStatus::Installing {
                debug!("[Update] Install in progress, ignoring update check");
                return Ok(state.update_info.clone());
            }
        }

        self.transition(|s| s.begin_check(silent));

        match self.inner.client.check_update().await {
            Ok(Some(info)) if info.has_update => {
                self.transition(|s| s.apply_update_found(info.clone()));
                Ok(Some(info))
            }
            Ok(_) => {
                self.transition(|s| s.apply_no_update(silent));
                Ok(None)
            }
            Err(e) => {
                self.transition(|s| s.apply_check_failed(e.to_string(), silent));
                Err(e)
            }
        }
    }

    /// Silent check that runs at most once per process.
    ///
    /// Only the caller that ran the check sees its error. Every other call,
    /// concurrent or later, gets the metadata held at that point (or none).
    pub async fn check_for_update_on_startup(&self) -> Result<Option<UpdateMetadata>> {
        let mut outcome = None;
        let slot = &mut outcome;
        self.inner
            .startup_check
            .get_or_init(move || async move {
                info!("[Update] Running startup update check");
                self.inner
                    .state
                    .send_modify(|s| s.has_checked_on_startup = true);
                *slot = Some(self.check_for_update(true).await);
            })
            .await;

        match outcome {
            Some(result) => result,
            None => Ok(self.inner.state.borrow().update_info.clone()),
        }
    }

    pub fn set_downloading(&self, progress: f64) {
        self.transition(|s| s.set_downloading(progress));
    }

    /// Apply a backend progress report, ignored unless a download is being tracked
    pub fn set_download_progress(&self, progress: f64) {
        self.inner
            .state
            .send_if_modified(|s| s.apply_progress(progress));
    }

    pub fn set_downloaded(&self, file_path: PathBuf) {
        self.transition(|s| s.set_downloaded(file_path));
    }

    pub fn set_installing(&self) {
        self.transition(|s| s.set_installing());
    }

    pub fn set_download_error(&self, message: &str) {
        warn!("[Update] Download error: {}", message);
        self.transition(|s| s.apply_download_error(message.to_string()));
    }

    pub fn set_install_error(&self, message: &str) {
        warn!("[Update] Install error: {}", message);
        self.transition(|s| s.apply_install_error(message.to_string()));
    }

    pub fn show_update_modal(&self) {
        self.inner
            .state
            .send_modify(|s| s.is_update_modal_visible = true);
    }

    /// Hides the modal without touching any download or install in progress
    pub fn hide_update_modal(&self) {
        self.inner
            .state
            .send_modify(|s| s.is_update_modal_visible = false);
    }

    /// Back to `Idle`, keeping only the startup guard.
    ///
    /// Does not abort a transfer the backend is still performing.
    pub fn reset(&self) {
        self.transition(|s| s.reset());
    }

    /// Apply a status transition. Any pending delayed revert is invalidated, and a
    /// new one is armed when the transition lands on a transient status.
    fn transition<F>(&self, f: F)
    where
        F: FnOnce(&mut UpdateLifecycleState),
    {
        self.cancel_revert();

        let mut from = UpdateStatus::Idle;
        let mut to = UpdateStatus::Idle;
        self.inner.state.send_modify(|s| {
            from = s.status;
            f(s);
            to = s.status;
        });

        if from != to {
            debug!("[Update] {} -> {}", from, to);
        }

        if to.is_transient() {
            self.schedule_revert(to);
        }
    }

    fn cancel_revert(&self) {
        let mut timer = self
            .inner
            .revert_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = timer.take() {
            token.cancel();
        }
    }

    fn schedule_revert(&self, expected: UpdateStatus) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("[Update] No async runtime, '{}' will not revert to idle", expected);
            return;
        };

        let token = CancellationToken::new();
        *self
            .inner
            .revert_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.clone());

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.revert_delay;

        runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(inner) = inner.upgrade() {
                        if inner.state.send_if_modified(|s| s.revert_transient(expected)) {
                            debug!("[Update] {} -> idle", expected);
                        }
                    }
                }
            }
        });
    }
}

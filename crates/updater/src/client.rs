use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::Stream;
use log::{debug, error, info, warn};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::backend::UpdateBackend;
use crate::error::Result;
use crate::events::{DownloadProgress, DOWNLOAD_PROGRESS_EVENT};
use crate::metadata::{PendingUpdate, UpdateMetadata};

/// Thin request layer over the native backend.
///
/// Stateless: every method is a single request/response or a subscription.
/// Errors propagate unmodified, there is no local retry.
#[derive(Clone)]
pub struct UpdateClient {
    backend: Arc<dyn UpdateBackend>,
}

impl UpdateClient {
    pub fn new(backend: Arc<dyn UpdateBackend>) -> Self {
        Self { backend }
    }

    pub async fn check_update(&self) -> Result<Option<UpdateMetadata>> {
        debug!("[Update] Checking for updates");
        let result = self.backend.check_update().await;
        match &result {
            Ok(Some(info)) if info.has_update => info!(
                "[Update] Update available: {} -> {}",
                info.current_version, info.latest_version
            ),
            Ok(Some(info)) => info!("[Update] Already on latest version {}", info.current_version),
            Ok(None) => info!("[Update] Backend returned no update metadata"),
            Err(e) => error!("[Update] Update check failed: {}", e),
        }
        result
    }

    pub async fn download_update(
        &self,
        url: &str,
        expected_hash: Option<&str>,
    ) -> Result<PathBuf> {
        info!(
            "[Update] Downloading {} (hash check: {})",
            url,
            expected_hash.is_some()
        );
        let result = self
            .backend
            .download_update(url.to_string(), expected_hash.map(str::to_string))
            .await;
        match &result {
            Ok(path) => info!("[Update] Downloaded to {:?}", path),
            Err(e) => error!("[Update] Download failed: {}", e),
        }
        result
    }

    /// Apply or stage the artifact. May never resolve if the backend restarts the process.
    pub async fn install_update(&self, file_path: &Path, version: &str) -> Result<()> {
        info!("[Update] Installing {} from {:?}", version, file_path);
        let result = self
            .backend
            .install_update(file_path.to_path_buf(), version.to_string())
            .await;
        if let Err(e) = &result {
            error!("[Update] Install failed: {}", e);
        }
        result
    }

    pub async fn check_pending_update(&self) -> Result<Option<PendingUpdate>> {
        let result = self.backend.check_pending_update().await;
        match &result {
            Ok(Some(pending)) => info!(
                "[Update] Found pending update {} at {:?}",
                pending.version, pending.file_path
            ),
            Ok(None) => debug!("[Update] No pending update"),
            Err(e) => warn!("[Update] Failed to read pending update: {}", e),
        }
        result
    }

    pub async fn clear_pending_update(&self) -> Result<()> {
        debug!("[Update] Clearing pending update record");
        self.backend.clear_pending_update().await
    }

    /// Ask the backend to restart and apply the staged update. Does not return normally.
    pub async fn restart_and_install(&self) -> Result<()> {
        info!("[Update] Restarting to install update");
        self.backend.restart_and_install().await
    }

    pub async fn download_update_from_debug_url(&self, url: &str) -> Result<PathBuf> {
        warn!("[Update] Debug download from {}", url);
        self.backend
            .download_update_from_debug_url(url.to_string())
            .await
    }

    /// Forward every progress event to `callback` until the returned handle is
    /// released (explicitly or by dropping it).
    ///
    /// Outside a tokio runtime no listener is started and the handle is inert.
    pub fn on_download_progress<F>(&self, mut callback: F) -> ProgressSubscription
    where
        F: FnMut(DownloadProgress) + Send + 'static,
    {
        let token = CancellationToken::new();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                "[Update] No async runtime, not listening to {}",
                DOWNLOAD_PROGRESS_EVENT
            );
            token.cancel();
            return ProgressSubscription { token };
        };

        let mut rx = self.backend.download_progress();
        let cancelled = token.clone();

        debug!("[Update] Subscribed to {}", DOWNLOAD_PROGRESS_EVENT);

        runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    event = rx.recv() => match event {
                        Ok(progress) => callback(progress),
                        Err(RecvError::Lagged(skipped)) => {
                            debug!("[Update] Progress listener skipped {} events", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("[Update] Unsubscribed from {}", DOWNLOAD_PROGRESS_EVENT);
        });

        ProgressSubscription { token }
    }

    /// Progress events as a stream. Ends after a completed record, once `finished`
    /// is cancelled, or when the backend closes the channel; not restartable.
    ///
    /// Records already queued when `finished` fires are still yielded.
    pub fn download_progress_stream(
        &self,
        finished: CancellationToken,
    ) -> impl Stream<Item = DownloadProgress> + Send + 'static {
        progress_stream(self.backend.download_progress(), finished)
    }

    /// Start a download together with a progress stream that ends when the
    /// download resolves, whether it succeeded, failed or never learned its size.
    ///
    /// The stream is subscribed before the download future is first polled, so
    /// no early record is missed. Drive both, e.g. with `tokio::join!`.
    pub fn download_with_progress<'a>(
        &'a self,
        url: &'a str,
        expected_hash: Option<&'a str>,
    ) -> (
        impl Stream<Item = DownloadProgress> + Send + 'static,
        impl Future<Output = Result<PathBuf>> + Send + 'a,
    ) {
        let finished = CancellationToken::new();
        let stream = self.download_progress_stream(finished.clone());
        let download = async move {
            let _finished = finished.drop_guard();
            self.download_update(url, expected_hash).await
        };
        (stream, download)
    }
}

fn progress_stream(
    rx: broadcast::Receiver<DownloadProgress>,
    finished: CancellationToken,
) -> impl Stream<Item = DownloadProgress> + Send + 'static {
    futures_util::stream::unfold(Some((rx, finished)), |state| async move {
        let (mut rx, finished) = state?;
        loop {
            let event = tokio::select! {
                biased;
                event = rx.recv() => event,
                _ = finished.cancelled() => return None,
            };
            match event {
                Ok(progress) => {
                    let next = if progress.is_complete() {
                        None
                    } else {
                        Some((rx, finished))
                    };
                    return Some((progress, next));
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

/// Live download-progress listener. Released on [`unsubscribe`](Self::unsubscribe) or drop.
#[derive(Debug)]
pub struct ProgressSubscription {
    token: CancellationToken,
}

impl ProgressSubscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

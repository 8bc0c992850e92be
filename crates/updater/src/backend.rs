//! Contract of the native backend that performs the actual network, file and
//! installer work. The core only sequences calls through it.

use std::path::PathBuf;

use futures_util::future::BoxFuture;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::events::DownloadProgress;
use crate::metadata::{PendingUpdate, UpdateMetadata};

/// Native update backend.
///
/// Implementations may be an IPC bridge, an in-process service or a test double.
/// `install_update` and `restart_and_install` may terminate the process instead of
/// resolving; callers must not treat a missing response as an error.
pub trait UpdateBackend: Send + Sync {
    /// Query the update feed. `Ok(None)` means "no checkable result".
    fn check_update(&self) -> BoxFuture<'_, Result<Option<UpdateMetadata>>>;

    /// Stream the artifact to local storage, verifying `expected_hash` when given.
    ///
    /// Fails with [`UpdateError::Integrity`](crate::UpdateError::Integrity) on a hash mismatch.
    fn download_update(
        &self,
        url: String,
        expected_hash: Option<String>,
    ) -> BoxFuture<'_, Result<PathBuf>>;

    /// Apply or stage the artifact and persist a [`PendingUpdate`] record.
    fn install_update(&self, file_path: PathBuf, version: String) -> BoxFuture<'_, Result<()>>;

    fn check_pending_update(&self) -> BoxFuture<'_, Result<Option<PendingUpdate>>>;

    fn clear_pending_update(&self) -> BoxFuture<'_, Result<()>>;

    /// Restart the process and apply the staged update on next boot.
    fn restart_and_install(&self) -> BoxFuture<'_, Result<()>>;

    /// Download from an arbitrary URL, skipping metadata and hash checks.
    fn download_update_from_debug_url(&self, url: String) -> BoxFuture<'_, Result<PathBuf>>;

    /// Subscribe to the `update-download-progress` event stream.
    fn download_progress(&self) -> broadcast::Receiver<DownloadProgress>;
}

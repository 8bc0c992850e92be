//! Scripted in-memory backend shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use lantern_updater::{
    DownloadProgress, PendingUpdate, Result, UpdateBackend, UpdateClient, UpdateError,
    UpdateMetadata, UpdateOrchestrator, UpdaterConfig,
};
use tokio::sync::broadcast;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn metadata(has_update: bool) -> UpdateMetadata {
    UpdateMetadata {
        has_update,
        latest_version: "2.0.0".to_string(),
        current_version: "1.9.0".to_string(),
        download_url: Some("https://x/y.bin".to_string()),
        release_notes: Some("Bug fixes".to_string()),
        published_at: None,
        source: Some("github".to_string()),
        sha256: Some("abc123".to_string()),
    }
}

/// Backend double answering from scripted responses and recording every call.
pub struct ScriptedBackend {
    check_responses: Mutex<VecDeque<Result<Option<UpdateMetadata>>>>,
    check_delay: Mutex<Duration>,
    download_response: Mutex<Result<PathBuf>>,
    /// Progress records emitted before the download resolves
    download_progress: Mutex<Vec<DownloadProgress>>,
    /// Pause after each progress record; zero resolves the download without yielding
    progress_interval: Mutex<Duration>,
    install_response: Mutex<Result<()>>,
    restart_response: Mutex<Result<()>>,
    pending: Mutex<Result<Option<PendingUpdate>>>,
    progress_tx: broadcast::Sender<DownloadProgress>,

    pub check_calls: AtomicUsize,
    pub clear_calls: AtomicUsize,
    pub restart_calls: AtomicUsize,
    pub downloads: Mutex<Vec<(String, Option<String>)>>,
    pub installs: Mutex<Vec<(PathBuf, String)>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        let (progress_tx, _) = broadcast::channel(64);
        Arc::new(Self {
            check_responses: Mutex::new(VecDeque::new()),
            check_delay: Mutex::new(Duration::ZERO),
            download_response: Mutex::new(Ok(PathBuf::from("/tmp/update.bin"))),
            download_progress: Mutex::new(Vec::new()),
            progress_interval: Mutex::new(Duration::from_millis(10)),
            install_response: Mutex::new(Ok(())),
            restart_response: Mutex::new(Ok(())),
            pending: Mutex::new(Ok(None)),
            progress_tx,
            check_calls: AtomicUsize::new(0),
            clear_calls: AtomicUsize::new(0),
            restart_calls: AtomicUsize::new(0),
            downloads: Mutex::new(Vec::new()),
            installs: Mutex::new(Vec::new()),
        })
    }

    /// Queue the outcome of the next check; an empty queue answers `Ok(None)`
    pub fn push_check(&self, response: Result<Option<UpdateMetadata>>) {
        self.check_responses.lock().unwrap().push_back(response);
    }

    pub fn set_check_delay(&self, delay: Duration) {
        *self.check_delay.lock().unwrap() = delay;
    }

    pub fn set_download(&self, response: Result<PathBuf>) {
        *self.download_response.lock().unwrap() = response;
    }

    pub fn set_download_progress(&self, progress: Vec<DownloadProgress>) {
        *self.download_progress.lock().unwrap() = progress;
    }

    pub fn set_progress_interval(&self, interval: Duration) {
        *self.progress_interval.lock().unwrap() = interval;
    }

    pub fn set_install(&self, response: Result<()>) {
        *self.install_response.lock().unwrap() = response;
    }

    pub fn set_restart(&self, response: Result<()>) {
        *self.restart_response.lock().unwrap() = response;
    }

    pub fn set_pending(&self, pending: Result<Option<PendingUpdate>>) {
        *self.pending.lock().unwrap() = pending;
    }

    pub fn emit_progress(&self, progress: DownloadProgress) {
        let _ = self.progress_tx.send(progress);
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }
}

impl UpdateBackend for ScriptedBackend {
    fn check_update(&self) -> BoxFuture<'_, Result<Option<UpdateMetadata>>> {
        Box::pin(async move {
            self.check_calls.fetch_add(1, Ordering::SeqCst);
            let delay = *self.check_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.check_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(None))
        })
    }

    fn download_update(
        &self,
        url: String,
        expected_hash: Option<String>,
    ) -> BoxFuture<'_, Result<PathBuf>> {
        Box::pin(async move {
            self.downloads.lock().unwrap().push((url, expected_hash));
            let progress = self.download_progress.lock().unwrap().clone();
            let interval = *self.progress_interval.lock().unwrap();
            for record in progress {
                self.emit_progress(record);
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
            }
            self.download_response.lock().unwrap().clone()
        })
    }

    fn install_update(&self, file_path: PathBuf, version: String) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.installs.lock().unwrap().push((file_path, version));
            self.install_response.lock().unwrap().clone()
        })
    }

    fn check_pending_update(&self) -> BoxFuture<'_, Result<Option<PendingUpdate>>> {
        Box::pin(async move { self.pending.lock().unwrap().clone() })
    }

    fn clear_pending_update(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.clear_calls.fetch_add(1, Ordering::SeqCst);
            *self.pending.lock().unwrap() = Ok(None);
            Ok(())
        })
    }

    fn restart_and_install(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.restart_calls.fetch_add(1, Ordering::SeqCst);
            self.restart_response.lock().unwrap().clone()
        })
    }

    fn download_update_from_debug_url(&self, url: String) -> BoxFuture<'_, Result<PathBuf>> {
        Box::pin(async move {
            if url.is_empty() {
                return Err(UpdateError::Backend("empty url".to_string()));
            }
            self.downloads.lock().unwrap().push((url, None));
            Ok(PathBuf::from("/tmp/debug.bin"))
        })
    }

    fn download_progress(&self) -> broadcast::Receiver<DownloadProgress> {
        self.progress_tx.subscribe()
    }
}

pub fn orchestrator(backend: &Arc<ScriptedBackend>) -> UpdateOrchestrator {
    init_logging();
    let backend: Arc<dyn UpdateBackend> = backend.clone();
    UpdateOrchestrator::new(UpdateClient::new(backend), &UpdaterConfig::default())
}

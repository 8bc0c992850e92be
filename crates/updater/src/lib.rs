//! Self-update orchestration core.
//!
//! Decides whether a newer version exists, tracks the download/install sequence
//! performed by a native backend, and picks up an update staged before a restart.
//!
//! - [`UpdateClient`] is the stateless request layer over an [`UpdateBackend`].
//! - [`UpdateOrchestrator`] owns the [`UpdateLifecycleState`] and its transitions.
//! - [`UpdateFlow`] sequences download, install and resume on behalf of the UI.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lantern_updater::{UpdateBackend, UpdateClient, UpdateFlow, UpdateOrchestrator, UpdaterConfig};
//!
//! async fn on_launch(backend: Arc<dyn UpdateBackend>) -> lantern_updater::Result<()> {
//!     let config = UpdaterConfig::default();
//!     let orchestrator = UpdateOrchestrator::new(UpdateClient::new(backend), &config);
//!     let flow = UpdateFlow::new(orchestrator.clone(), config)
//!         .with_current_version(env!("CARGO_PKG_VERSION"));
//!
//!     flow.startup().await?;
//!     if orchestrator.is_update_available() {
//!         flow.download().await?;
//!         flow.install().await?;
//!     }
//!     Ok(())
//! }
//! ```

mod backend;
mod client;
mod config;
mod error;
pub mod events;
mod flow;
mod metadata;
mod orchestrator;
mod state;
pub mod version;

pub use backend::UpdateBackend;
pub use client::{ProgressSubscription, UpdateClient};
pub use config::UpdaterConfig;
pub use error::{Result, UpdateError};
pub use events::DownloadProgress;
pub use flow::{StartupOutcome, UpdateFlow};
pub use metadata::{PendingUpdate, UpdateMetadata};
pub use orchestrator::UpdateOrchestrator;
pub use state::{UpdateLifecycleState, UpdateStatus};

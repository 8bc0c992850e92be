use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result of a version check against the update feed.
///
/// `has_update: false` means "checked, nothing newer", which is distinct from the
/// backend returning no metadata at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMetadata {
    pub has_update: bool,
    pub latest_version: String,
    pub current_version: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub release_notes: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    /// Feed the metadata came from (e.g. "github")
    #[serde(default)]
    pub source: Option<String>,
    /// Expected SHA-256 of the artifact, lowercase hex
    #[serde(default)]
    pub sha256: Option<String>,
}

/// Durable record of a downloaded update staged for the next restart.
///
/// Owned by the backend; the core only reads and clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpdate {
    pub file_path: PathBuf,
    pub version: String,
}

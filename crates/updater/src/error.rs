/// Errors surfaced by the update core.
///
/// `Clone` so a single outcome (e.g. the startup check) can be handed to every caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    /// The native backend could not be reached or failed to complete the request
    #[error("Backend error: {0}")]
    Backend(String),
    /// Downloaded content did not match the expected hash
    #[error("Hash verification failed. Expected: {expected}, Got: {actual}")]
    Integrity { expected: String, actual: String },
    /// Download requested while no newer version is known
    #[error("No update available to download")]
    NoUpdateAvailable,
    /// Update metadata carries no download URL
    #[error("No download URL available for this update")]
    NoDownloadUrl,
    /// Install requested without a downloaded artifact
    #[error("No downloaded update to install")]
    NoDownloadedArtifact,
}

pub type Result<T> = std::result::Result<T, UpdateError>;

impl UpdateError {
    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            UpdateError::Backend(msg) => {
                let lower = msg.to_lowercase();
                if lower.contains("timed out") || lower.contains("request failed") {
                    "Could not reach the update server. Check your connection and retry.".to_string()
                } else if lower.contains("already in progress") {
                    "An update is already being installed.".to_string()
                } else {
                    format!("Update failed: {}", msg)
                }
            }
            UpdateError::Integrity { .. } => {
                "The downloaded update is corrupted. Please download it again.".to_string()
            }
            UpdateError::NoUpdateAvailable => "You're already on the latest version.".to_string(),
            UpdateError::NoDownloadUrl => {
                "No installer is published for this platform yet.".to_string()
            }
            UpdateError::NoDownloadedArtifact => {
                "The update has not been downloaded yet.".to_string()
            }
        }
    }
}

// Error taxonomy at the collaborator seams
use thiserror::Error;

/// Why a reload did not produce a new view
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("History service URL is not configured.")]
    NotConfigured,

    #[error("history service request failed: {0}")]
    Transport(String),
}

impl SyncError {
    /// Text shown on the dashboard; transport details only go to the log
    pub fn user_message(&self) -> String {
        match self {
            SyncError::NotConfigured => self.to_string(),
            SyncError::Transport(_) => "Failed to fetch data from the server.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location access was denied. Unable to calculate optimal tilt.")]
    PermissionDenied,

    #[error("Geolocation is not available. Unable to calculate optimal tilt.")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("failed to connect to live updates: {0}")]
    Connect(String),

    #[error("live update stream failed: {0}")]
    Stream(String),

    #[error("malformed live update: {0}")]
    Decode(String),
}

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoicevoxError {
    #[error("Request to VOICEVOX engine failed: {0}")]
    Request(String),

    #[error("VOICEVOX engine error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("VOICEVOX engine returned an empty {0} response")]
    EmptyResponse(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl VoicevoxError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(_) | Self::EmptyResponse(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Config(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, VoicevoxError>;

use std::path::{Path, PathBuf};
use thiserror::Error;
use voicevox_client::VoicevoxError;

#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] VoicevoxError),

    #[error("Invalid WAV data in {}: {reason}", path.display())]
    Wav { path: PathBuf, reason: String },

    #[error("Synthesis task failed: {0}")]
    Task(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl NarrationError {
    /// Wrap an IO error with the operation and path it concerns.
    pub fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Build a WAV format error.
    pub fn wav(path: &Path, reason: impl Into<String>) -> Self {
        Self::Wav {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NarrationError>;

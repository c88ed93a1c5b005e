//! gen-narration configuration management.

use crate::error::{NarrationError, Result};
use crate::text::{DEFAULT_MAX_LENGTH, Segmenter, TokenizerKind, create_tokenizer};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use voicevox_client::EngineConfig;
use voicevox_client::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

// Defaults for a local VOICEVOX engine
const DEFAULT_SPEAKER_ID: u32 = 1;
const DEFAULT_CONCURRENCY: usize = 3;
const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// Maximum script line length in code points
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// VOICEVOX speaker (style) id
    #[serde(default = "default_speaker_id")]
    pub speaker_id: u32,

    /// Synthesis requests allowed in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Attempts per script line before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// VOICEVOX engine base URL
    #[serde(default = "default_engine_url")]
    pub engine_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Word tokenizer used for line wrapping
    #[serde(default)]
    pub tokenizer: TokenizerKind,

    /// Compiled dictionary for the `dictionary` tokenizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<PathBuf>,

    /// Do not send blank script lines to the engine
    #[serde(default)]
    pub skip_blank_lines: bool,

    /// Also join every document's audio into `output_all.wav`
    #[serde(default = "default_combine_all")]
    pub combine_all: bool,

    /// Directory scanned for `*.txt` documents when none are given
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory for scripts and combined audio
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory for per-line audio files
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_speaker_id() -> u32 {
    DEFAULT_SPEAKER_ID
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_engine_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_combine_all() -> bool {
    true
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("in")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("tmp")
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            speaker_id: default_speaker_id(),
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            engine_url: default_engine_url(),
            timeout_secs: default_timeout_secs(),
            tokenizer: TokenizerKind::default(),
            dictionary: None,
            skip_blank_lines: false,
            combine_all: default_combine_all(),
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            work_dir: default_work_dir(),
        }
    }
}

impl NarrationConfig {
    /// Get the config file path: ~/.config/cli-programs/gen-narration.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            NarrationError::Configuration("could not determine home directory".to_string())
        })?;
        Ok(home
            .join(".config")
            .join("cli-programs")
            .join("gen-narration.toml"))
    }

    /// Load config from the default location, returning defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `path`, returning defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| NarrationError::io("read", path, e))?;
        let config: NarrationConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| NarrationError::io("create directory", parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| NarrationError::io("write", path, e))
    }

    /// Reject settings that can never work.
    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(NarrationError::Configuration(
                "max_length must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(NarrationError::Configuration(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(NarrationError::Configuration(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.tokenizer == TokenizerKind::Dictionary && self.dictionary.is_none() {
            return Err(NarrationError::Configuration(
                "tokenizer = \"dictionary\" requires a dictionary path".to_string(),
            ));
        }
        Ok(())
    }

    /// Connection settings for the synthesis engine.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.engine_url.clone()).with_timeout_secs(self.timeout_secs)
    }

    /// Build the segmenter. Tokenizer initialization happens here, once.
    pub fn build_segmenter(&self) -> Result<Segmenter> {
        self.validate()?;
        let tokenizer = create_tokenizer(self.tokenizer, self.dictionary.as_deref())?;
        Ok(Segmenter::new(tokenizer).with_max_length(self.max_length))
    }
}

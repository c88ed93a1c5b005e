//! Client library for the VOICEVOX speech synthesis engine.
//!
//! Provides a single [`Synthesizer`] interface with two implementations:
//! - VOICEVOX engine over HTTP (`audio_query` + `synthesis`)
//! - Mock synthesizer for tests

pub mod config;
pub mod error;
pub mod providers;
pub mod synthesizer;

pub use config::EngineConfig;
pub use error::{Result, VoicevoxError};
pub use providers::{MockSynthesizer, VoicevoxEngine, canonical_wav};
pub use synthesizer::Synthesizer;

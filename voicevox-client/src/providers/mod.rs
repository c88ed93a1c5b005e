//! Synthesizer implementations

pub mod mock;
mod voicevox;

pub use mock::{MockSynthesizer, canonical_wav};
pub use voicevox::VoicevoxEngine;

use async_trait::async_trait;

use crate::error::Result;

/// Trait for speech synthesis backends
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize one script line with the given speaker, returning WAV bytes
    async fn synthesize(&self, text: &str, speaker_id: u32) -> Result<Vec<u8>>;

    /// Get the backend name for display
    fn name(&self) -> &'static str;
}

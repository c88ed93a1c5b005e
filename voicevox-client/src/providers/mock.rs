//! Mock synthesizer for testing
//!
//! Returns a canonical 44-byte-header WAV whose payload is the UTF-8 text of
//! the line, so callers can check ordering after concatenation. Can simulate
//! failures, per-line latency, and records how many calls overlapped.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{Result, VoicevoxError};
use crate::synthesizer::Synthesizer;

/// Sample rate written into mock WAV headers (VOICEVOX default output).
const MOCK_SAMPLE_RATE: u32 = 24_000;

/// Build a mono 16-bit PCM WAV with the canonical 44-byte header.
pub fn canonical_wav(payload: &[u8], sample_rate: u32) -> Vec<u8> {
    let data_len = payload.len() as u32;
    let byte_rate = sample_rate * 2;

    let mut wav = Vec::with_capacity(44 + payload.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(data_len + 36).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(payload);
    wav
}

/// A mock synthesizer for testing retry, ordering and concurrency behavior
pub struct MockSynthesizer {
    /// Number of calls to fail before succeeding
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Calls currently executing
    in_flight: AtomicUsize,
    /// Highest number of overlapping calls seen
    peak_in_flight: AtomicUsize,
    /// Error returned on failure
    fail_with: Option<VoicevoxError>,
    /// Lines that fail on every attempt
    always_fail_texts: Vec<String>,
    /// Latency applied to every call
    delay: Duration,
    /// Latency overrides for specific lines
    delays: HashMap<String, Duration>,
    /// Texts seen, in call order
    seen: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    /// Create a synthesizer that always succeeds
    pub fn always_succeeds() -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            fail_with: None,
            always_fail_texts: Vec::new(),
            delay: Duration::ZERO,
            delays: HashMap::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Create a synthesizer that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: VoicevoxError) -> Self {
        Self {
            fail_count: AtomicUsize::new(n),
            fail_with: Some(error),
            ..Self::always_succeeds()
        }
    }

    /// Create a synthesizer that always fails with the given error
    pub fn always_fails(error: VoicevoxError) -> Self {
        Self::fails_then_succeeds(usize::MAX, error)
    }

    /// Fail every call whose text equals `text`
    pub fn failing_on(mut self, text: &str, error: VoicevoxError) -> Self {
        self.always_fail_texts.push(text.to_string());
        self.fail_with = Some(error);
        self
    }

    /// Sleep this long in every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sleep this long when synthesizing `text`, overriding the default delay
    pub fn with_delay_for(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Highest number of synthesize() calls that ran at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Texts passed to synthesize(), in call order
    pub fn seen_texts(&self) -> Vec<String> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn failure(&self) -> VoicevoxError {
        self.fail_with
            .clone()
            .unwrap_or_else(|| VoicevoxError::Request("mock failure".to_string()))
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, _speaker_id: u32) -> Result<Vec<u8>> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(text.to_string());
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = self.delays.get(text).copied().unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if call_num < self.fail_count.load(Ordering::SeqCst)
            || self.always_fail_texts.iter().any(|t| t == text)
        {
            return Err(self.failure());
        }

        Ok(canonical_wav(text.as_bytes(), MOCK_SAMPLE_RATE))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_canonical_wav_layout() {
        let wav = canonical_wav(b"abcd", 24_000);
        assert_eq!(wav.len(), 48);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 40);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 4);
        assert_eq!(&wav[44..], b"abcd");
    }

    #[tokio::test]
    async fn test_always_succeeds() {
        let synth = MockSynthesizer::always_succeeds();
        let wav = synth.synthesize("こんにちは", 1).await.unwrap();
        assert_eq!(&wav[44..], "こんにちは".as_bytes());
        assert_eq!(synth.call_count(), 1);
        assert_eq!(synth.seen_texts(), vec!["こんにちは".to_string()]);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let synth = MockSynthesizer::always_fails(VoicevoxError::Api {
            status: 503,
            message: "busy".to_string(),
        });

        for _ in 0..3 {
            assert!(synth.synthesize("test", 1).await.is_err());
        }
        assert_eq!(synth.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_then_succeeds() {
        let synth =
            MockSynthesizer::fails_then_succeeds(2, VoicevoxError::Request("refused".to_string()));

        assert!(synth.synthesize("test", 1).await.is_err());
        assert!(synth.synthesize("test", 1).await.is_err());
        assert!(synth.synthesize("test", 1).await.is_ok());
        assert_eq!(synth.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failing_on_specific_text() {
        let synth = MockSynthesizer::always_succeeds()
            .failing_on("だめ", VoicevoxError::Request("refused".to_string()));

        assert!(synth.synthesize("よい", 1).await.is_ok());
        assert_eq!(
            synth.synthesize("だめ", 1).await,
            Err(VoicevoxError::Request("refused".to_string()))
        );
    }

    #[tokio::test]
    async fn test_peak_in_flight_tracks_overlap() {
        let synth =
            Arc::new(MockSynthesizer::always_succeeds().with_delay(Duration::from_millis(50)));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let synth = Arc::clone(&synth);
                tokio::spawn(async move { synth.synthesize(&format!("line {}", i), 1).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(synth.call_count(), 4);
        assert!(synth.peak_in_flight() >= 2);
    }
}

//! VOICEVOX engine over HTTP
//!
//! Synthesis is a two-step exchange: `POST /audio_query` turns text into an
//! editable query document, `POST /synthesis` renders that query to WAV.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::{Result, VoicevoxError};
use crate::synthesizer::Synthesizer;

/// Client for a running VOICEVOX engine
pub struct VoicevoxEngine {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: serde_json::Value,
}

impl VoicevoxEngine {
    /// Create a client for the engine described by `config`
    pub fn new(config: &EngineConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(VoicevoxError::Config("engine URL is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VoicevoxError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the synthesis query for `text`. The returned bytes are the raw
    /// JSON document, passed through to [`VoicevoxEngine::synthesis`] untouched.
    pub async fn audio_query(&self, text: &str, speaker_id: u32) -> Result<Vec<u8>> {
        let url = format!("{}/audio_query", self.base_url);

        let response = self
            .client
            .post(&url)
            .query(&[("text", text.to_string()), ("speaker", speaker_id.to_string())])
            .send()
            .await
            .map_err(|e| VoicevoxError::Request(format!("audio_query: {}", e)))?;

        let body = read_body(check_status(response).await?).await?;
        if body.is_empty() {
            return Err(VoicevoxError::EmptyResponse("audio_query"));
        }
        Ok(body)
    }

    /// Render a query produced by [`VoicevoxEngine::audio_query`] to WAV bytes
    pub async fn synthesis(&self, query: Vec<u8>, speaker_id: u32) -> Result<Vec<u8>> {
        let url = format!("{}/synthesis", self.base_url);

        let response = self
            .client
            .post(&url)
            .query(&[("speaker", speaker_id.to_string())])
            .header("Content-Type", "application/json")
            .body(query)
            .send()
            .await
            .map_err(|e| VoicevoxError::Request(format!("synthesis: {}", e)))?;

        let body = read_body(check_status(response).await?).await?;
        if body.is_empty() {
            return Err(VoicevoxError::EmptyResponse("synthesis"));
        }
        Ok(body)
    }

    /// Engine version string, used as a reachability check
    pub async fn version(&self) -> Result<String> {
        let url = format!("{}/version", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VoicevoxError::Request(format!("version: {}", e)))?;

        let version: String = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| VoicevoxError::Request(format!("Failed to parse version: {}", e)))?;
        Ok(version)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(VoicevoxError::Api {
        status: status.as_u16(),
        message: error_message(&error_text),
    })
}

async fn read_body(response: Response) -> Result<Vec<u8>> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| VoicevoxError::Request(format!("Failed to read response body: {}", e)))?;
    Ok(bytes.to_vec())
}

/// Pull `detail` out of the engine's JSON error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorResponse { detail }) => detail.to_string(),
        Err(_) => body.to_string(),
    }
}

#[async_trait]
impl Synthesizer for VoicevoxEngine {
    async fn synthesize(&self, text: &str, speaker_id: u32) -> Result<Vec<u8>> {
        log::trace!("audio_query speaker={} text={:?}", speaker_id, text);
        let query = self.audio_query(text, speaker_id).await?;
        self.synthesis(query, speaker_id).await
    }

    fn name(&self) -> &'static str {
        "voicevox"
    }
}

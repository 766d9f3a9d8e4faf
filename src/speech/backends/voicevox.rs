//! VOICEVOX engine backend
//!
//! Speaks the engine's HTTP API:
//! - `GET  /speakers` returns the speaker catalog
//! - `POST /audio_query?text=..&speaker=..` returns a synthesis parameter document
//! - `POST /synthesis?speaker=..` with that document as body returns WAV bytes
//!
//! The audio query document is opaque here and is posted back unmodified.

use crate::audio::AudioBuffer;
use crate::error::SynthesisError;
use crate::speakers::{Speaker, SpeakerId};
use crate::speech::SpeechService;
use crate::{Result, VvError};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

const SPEAKERS_PATH: &str = "/speakers";
const AUDIO_QUERY_PATH: &str = "/audio_query";
const SYNTHESIS_PATH: &str = "/synthesis";

/// HTTP client for one engine instance
#[derive(Clone)]
pub struct VoicevoxClient {
    http: Client,

    /// Engine base URL without trailing slash, e.g. `http://127.0.0.1:50021`
    base_url: String,
}

impl VoicevoxClient {
    /// Create a client for `base_url`
    ///
    /// `timeout` bounds every request made by this client.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VvError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Phase 1: request the synthesis parameters for `text`
    pub async fn audio_query(
        &self,
        text: &str,
        speaker: SpeakerId,
    ) -> std::result::Result<Value, SynthesisError> {
        let response = self
            .http
            .post(self.url(AUDIO_QUERY_PATH))
            .query(&[("text", text)])
            .query(&[("speaker", speaker)])
            .send()
            .await
            .map_err(|e| SynthesisError::Query(e.to_string()))?;

        let response = check_status(response).await.map_err(SynthesisError::Query)?;
        response
            .json::<Value>()
            .await
            .map_err(|e| SynthesisError::Query(format!("invalid query document: {}", e)))
    }

    /// Phase 2: render a query document to WAV container bytes
    pub async fn synthesis(
        &self,
        query: &Value,
        speaker: SpeakerId,
    ) -> std::result::Result<Vec<u8>, SynthesisError> {
        let response = self
            .http
            .post(self.url(SYNTHESIS_PATH))
            .query(&[("speaker", speaker)])
            .json(query)
            .send()
            .await
            .map_err(|e| SynthesisError::Synthesis(e.to_string()))?;

        let response = check_status(response)
            .await
            .map_err(SynthesisError::Synthesis)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Synthesis(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Pass 2xx responses through, turn anything else into a short reason
async fn check_status(response: Response) -> std::result::Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
        Err(format!("HTTP {}", status))
    } else {
        Err(format!("HTTP {}: {}", status, crate::error::excerpt(body)))
    }
}

#[async_trait]
impl SpeechService for VoicevoxClient {
    async fn speakers(&self) -> Result<Vec<Speaker>> {
        let url = self.url(SPEAKERS_PATH);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| VvError::ServiceUnavailable(format!("{}: {}", url, e)))?;

        let response = check_status(response)
            .await
            .map_err(|reason| VvError::ServiceUnavailable(format!("{}: {}", url, reason)))?;

        response
            .json::<Vec<Speaker>>()
            .await
            .map_err(|e| VvError::ServiceUnavailable(format!("invalid speaker catalog: {}", e)))
    }

    async fn synthesize(
        &self,
        text: &str,
        speaker: SpeakerId,
    ) -> std::result::Result<AudioBuffer, SynthesisError> {
        let query = self.audio_query(text, speaker).await?;
        let wav = self.synthesis(&query, speaker).await?;

        let audio = AudioBuffer::from_wav_bytes(&wav)
            .map_err(|e| SynthesisError::Synthesis(format!("undecodable audio: {}", e)))?;
        debug!("Synthesized speaker={} ({} bytes)", speaker, audio.byte_len());
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_stripped() {
        let client = VoicevoxClient::new("http://localhost:50021/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:50021");
        assert_eq!(client.url(SYNTHESIS_PATH), "http://localhost:50021/synthesis");
    }
}

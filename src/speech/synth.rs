//! Speech service abstraction
//!
//! The pipeline talks to the synthesis engine only through this trait, so
//! the HTTP backend can be swapped for an in-process fake in tests.

use crate::audio::AudioBuffer;
use crate::config::Config;
use crate::error::SynthesisError;
use crate::speakers::{Speaker, SpeakerId};
use crate::Result;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

/// A text-to-speech engine reachable by the pipeline
///
/// Implementations must be shareable across concurrently running
/// synthesis tasks.
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Fetch the engine's speaker catalog
    async fn speakers(&self) -> Result<Vec<Speaker>>;

    /// Synthesize one line of text with the given voice
    ///
    /// Performs the full query-then-synthesize exchange and decodes the
    /// returned container. No retries are attempted.
    async fn synthesize(
        &self,
        text: &str,
        speaker: SpeakerId,
    ) -> std::result::Result<AudioBuffer, SynthesisError>;
}

/// Create the HTTP-backed service described by the configuration
pub fn create_service(config: &Config) -> Result<Arc<dyn SpeechService>> {
    use super::backends::voicevox::VoicevoxClient;

    let client = VoicevoxClient::new(config.endpoint(), config.request_timeout())?;
    info!("Using synthesis engine at {}", client.base_url());
    Ok(Arc::new(client))
}

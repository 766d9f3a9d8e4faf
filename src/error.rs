//! Error types for vvscript

use std::io;
use thiserror::Error;

/// Main error type for vvscript
#[derive(Error, Debug)]
pub enum VvError {
    /// The speaker catalog could not be fetched; nothing can be synthesized
    #[error("Synthesis service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Speaker not found: '{name}' (utterance #{index})")]
    SpeakerNotFound { name: String, index: usize },

    #[error("Audio query failed for utterance #{index} \"{excerpt}\": {reason}")]
    QueryFailed {
        index: usize,
        excerpt: String,
        reason: String,
    },

    #[error("Synthesis failed for utterance #{index} \"{excerpt}\": {reason}")]
    SynthesisFailed {
        index: usize,
        excerpt: String,
        reason: String,
    },

    #[error("No utterances to synthesize")]
    EmptyInput,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Synthesis task failed: {0}")]
    Task(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for vvscript operations
pub type Result<T> = std::result::Result<T, VvError>;

/// Failure of one phase of the two-step synthesis exchange
///
/// Backends report these without utterance context; the pipeline
/// converts them into [`VvError::QueryFailed`] or [`VvError::SynthesisFailed`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("audio query: {0}")]
    Query(String),

    #[error("synthesis: {0}")]
    Synthesis(String),
}

impl SynthesisError {
    /// Attach the utterance's position and a short text excerpt
    pub fn for_utterance(self, index: usize, text: &str) -> VvError {
        let excerpt = excerpt(text);
        match self {
            SynthesisError::Query(reason) => VvError::QueryFailed {
                index,
                excerpt,
                reason,
            },
            SynthesisError::Synthesis(reason) => VvError::SynthesisFailed {
                index,
                excerpt,
                reason,
            },
        }
    }
}

/// Maximum number of characters of utterance text quoted in error reports
const EXCERPT_CHARS: usize = 20;

/// Shorten text for diagnostics, counting characters rather than bytes
pub fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

impl From<String> for VvError {
    fn from(s: String) -> Self {
        VvError::Other(s)
    }
}

impl From<&str> for VvError {
    fn from(s: &str) -> Self {
        VvError::Other(s.to_string())
    }
}

impl From<hound::Error> for VvError {
    fn from(e: hound::Error) -> Self {
        VvError::Audio(format!("WAV codec error: {}", e))
    }
}

//! Speech synthesis system

pub mod synth;
pub mod backends;

pub use backends::voicevox::VoicevoxClient;
pub use synth::{create_service, SpeechService};

//! vvscript - script-to-speech renderer
//!
//! Turns a speaker-annotated text script into a single WAV file by sending
//! each line to a VOICEVOX-compatible engine over HTTP and joining the
//! results in script order.

pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod script;
pub mod speakers;
pub mod speech;

pub use audio::AudioBuffer;
pub use error::{Result, SynthesisError, VvError};
pub use pipeline::Pipeline;
pub use script::{ScriptParser, Utterance};
pub use speakers::SpeakerRegistry;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

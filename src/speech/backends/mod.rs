//! Speech service backends

// HTTP backend for VOICEVOX-compatible engines
pub mod voicevox;

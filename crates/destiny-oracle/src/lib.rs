//! Gemini-backed implementation of the narrative oracle port.
//!
//! Talks to the `generateContent` REST endpoint, asks for JSON output and
//! hands the candidate text to the narrative schemas for validation.

pub mod client;
pub mod config;
pub mod prompt;
pub mod wire;

pub use client::GeminiOracle;
pub use config::GeminiConfig;

//! Gemini streaming provider.
//!
//! Implements [`TextProvider`] against the Gemini `streamGenerateContent`
//! endpoint (SSE). The API key is wrapped in `secrecy::SecretString` and is
//! only exposed when building the request header.

mod client;
mod streaming;
mod types;

pub use client::GeminiProvider;

//! Provider request/response types for relaychat.
//!
//! These types model the boundary with the generative-text provider:
//! projected conversation turns, the streaming generate request, and the
//! provider error taxonomy. The provider itself is opaque to the core --
//! it accepts context plus a prompt and yields text fragments.

use serde::{Deserialize, Serialize};

use crate::chat::Role;

/// One turn of projected conversation context, in the provider's format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTurn {
    pub role: Role,
    pub text: String,
}

/// Request for a streamed generation.
///
/// `history` carries every committed turn before the current one; the
/// in-flight user `prompt` is passed separately, never duplicated in history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub history: Vec<ProviderTurn>,
    pub prompt: String,
}

/// Errors from provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider rejected the request before producing any output.
    #[error("provider rejected request: {message}")]
    Rejected { message: String },

    /// No API key was configured for the provider.
    #[error("provider credentials missing")]
    MissingCredentials,

    /// The stream failed after it was opened.
    #[error("stream error: {0}")]
    Stream(String),

    /// The stream produced nothing for longer than the configured idle window.
    #[error("stream idle for more than {idle_ms}ms")]
    IdleTimeout { idle_ms: u64 },

    /// A fragment could not be decoded.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

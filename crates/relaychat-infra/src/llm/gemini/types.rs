//! Request/response wire types for the Gemini API.
//!
//! Only the fields relaychat touches are modeled; unknown response fields
//! are ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Request body for `models/{model}:streamGenerateContent`.
#[derive(Debug, Serialize)]
pub(super) struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

/// One conversation turn in Gemini's format: a role plus text parts.
#[derive(Debug, Serialize)]
pub(super) struct GeminiContent {
    pub role: String,
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
pub(super) struct GeminiPart {
    pub text: String,
}

/// One SSE chunk of a streaming response.
#[derive(Debug, Deserialize)]
pub(super) struct GeminiResponseChunk {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GeminiCandidateContent {
    #[serde(default)]
    pub parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GeminiResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GeminiResponseChunk {
    /// Concatenate the text parts of every candidate in this chunk.
    pub fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

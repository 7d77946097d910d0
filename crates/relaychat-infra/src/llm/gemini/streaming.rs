//! SSE stream creation for the Gemini streaming API.
//!
//! Opens the HTTP request lazily inside the stream, so the first poll is
//! what performs the network call -- the orchestrator peeks that first item
//! to distinguish pre-stream rejections from mid-stream failures. Each SSE
//! event carries a JSON chunk whose candidate text parts are flattened into
//! one fragment.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use relaychat_core::llm::provider::FragmentStream;
use relaychat_types::provider::ProviderError;

use super::types::{GeminiRequest, GeminiResponseChunk};

/// Cap on how much of a provider error body is carried into the error.
const ERROR_BODY_LIMIT: usize = 512;

/// Create a streaming SSE connection to the Gemini API.
///
/// A non-2xx status before any output yields [`ProviderError::Rejected`]
/// carrying a bounded slice of the provider's error body. After that, SSE
/// decode failures and transport drops surface as [`ProviderError::Stream`],
/// and malformed chunk JSON as [`ProviderError::Deserialization`].
pub(super) fn create_gemini_stream(
    client: reqwest::Client,
    url: String,
    api_key: SecretString,
    body: GeminiRequest,
) -> FragmentStream {
    Box::pin(async_stream::try_stream! {
        let response = client
            .post(&url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Stream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            Err(ProviderError::Rejected {
                message: format!("{status}: {detail}"),
            })?;
        } else {
            let mut events = response.bytes_stream().eventsource();
            while let Some(event) = events.next().await {
                let event = event.map_err(|e| ProviderError::Stream(e.to_string()))?;
                let chunk: GeminiResponseChunk = serde_json::from_str(&event.data)
                    .map_err(|e| ProviderError::Deserialization(e.to_string()))?;

                let text = chunk.text();
                if !text.is_empty() {
                    yield text;
                }
            }
        }
    })
}

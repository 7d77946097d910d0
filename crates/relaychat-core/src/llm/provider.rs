//! TextProvider trait definition.
//!
//! The provider is an opaque streaming text service: it accepts projected
//! conversation context plus the new prompt and yields text fragments. The
//! stream is boxed so the trait stays object-safe -- the orchestrator holds
//! an `Arc<dyn TextProvider>`, which is what lets tests swap in scripted
//! fakes without touching any wiring.

use std::pin::Pin;

use futures_util::Stream;

use relaychat_types::provider::{GenerateRequest, ProviderError};

/// Ordered, finite, non-restartable stream of reply fragments.
pub type FragmentStream =
    Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send + 'static>>;

/// Trait for generative-text provider backends.
///
/// Opening failures (bad credentials, request rejected before any output)
/// surface as the first stream item; the orchestrator peeks that item before
/// committing the caller's transport to a streaming response.
pub trait TextProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Open a streaming generation for the given request.
    fn stream(&self, request: GenerateRequest) -> FragmentStream;
}

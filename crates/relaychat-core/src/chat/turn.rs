//! TurnOrchestrator: drives one chat turn end to end.
//!
//! State machine per turn: `Idle -> UserPersisted -> Streaming ->
//! {Completed | Failed}`. The user message is persisted *before* the
//! provider is invoked (write-ahead), so a failed model call can lose at
//! most the reply, never the user's input. The model reply is persisted
//! all-or-nothing: only a stream that drains to completion is appended.
//!
//! The API is two-phase so the HTTP layer can still send a structured error
//! response for everything that fails before streaming begins:
//! [`TurnOrchestrator::begin_turn`] covers validation, the write-ahead
//! append, history projection, and opening the provider stream (peeking its
//! first item); [`ActiveTurn::drive`] relays fragments to the caller and
//! reconciles the result back into the store.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{stream, StreamExt};
use tracing::{debug, warn};

use relaychat_types::chat::ChatMessage;
use relaychat_types::error::TurnError;
use relaychat_types::provider::{GenerateRequest, ProviderError};

use crate::chat::history;
use crate::chat::relay::{relay, FragmentSink, RelayError};
use crate::chat::store::SessionStore;
use crate::llm::provider::{FragmentStream, TextProvider};

/// Orchestrator configuration, injected at construction.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Model identifier sent with every generate request.
    pub model: String,
    /// Maximum time to wait for each provider read before giving up.
    pub idle_timeout: Duration,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// Terminal result of driving an [`ActiveTurn`].
#[derive(Debug)]
pub enum TurnOutcome {
    /// The stream drained and the full reply was delivered to the caller.
    /// `persisted` is false when the reply could not be saved afterwards
    /// (session deleted mid-turn, store failure, or an empty reply) -- that
    /// failure is logged, never surfaced to the caller, who already has the
    /// complete response.
    Completed { reply: ChatMessage, persisted: bool },
    /// The provider failed after the transport was committed. Fragments up
    /// to the failure point were forwarded; nothing was persisted.
    ProviderFailed {
        error: ProviderError,
        forwarded: usize,
    },
    /// The caller disconnected. Consumption stopped, the provider stream
    /// was released, and nothing was persisted.
    Cancelled { forwarded: usize },
}

/// Coordinates SessionStore, HistoryProjector, the provider, and StreamRelay
/// for single turns.
pub struct TurnOrchestrator<S: SessionStore> {
    store: Arc<S>,
    provider: Arc<dyn TextProvider>,
    config: TurnConfig,
}

impl<S: SessionStore> TurnOrchestrator<S> {
    pub fn new(store: Arc<S>, provider: Arc<dyn TextProvider>, config: TurnConfig) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    /// Access the session store (shared with the CRUD handlers).
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run a turn up to the point where streaming to the caller can begin.
    ///
    /// Sequence: validate input, get-or-create the session, append the user
    /// message (write-ahead -- on any later failure the input survives),
    /// project history excluding that just-appended turn, open the provider
    /// stream, and await its first item under the idle timeout. A provider
    /// that rejects the request before producing output therefore fails
    /// here, while the transport can still carry a structured error.
    ///
    /// Concurrent turns against the same session are not serialized: every
    /// append is individually atomic, but each turn projects whatever
    /// history was committed at the moment it read. Interleaved turns on
    /// one session can produce replies with context missing the other
    /// turn's in-flight reply; callers wanting strict ordering must await
    /// each turn before submitting the next.
    #[tracing::instrument(skip(self, prompt), fields(session_id = %session_id, owner = %owner))]
    pub async fn begin_turn(
        &self,
        owner: &str,
        session_id: &str,
        prompt: &str,
    ) -> Result<ActiveTurn<S>, TurnError> {
        if session_id.trim().is_empty() {
            return Err(TurnError::Validation(
                "session id must not be empty".to_string(),
            ));
        }
        if prompt.trim().is_empty() {
            return Err(TurnError::Validation("prompt must not be empty".to_string()));
        }

        self.store.get_or_create(session_id, owner).await?;

        let user_message = ChatMessage::user(session_id, prompt);
        self.store.append_message(session_id, &user_message).await?;
        debug!(message_id = %user_message.id, "user message persisted");

        // Full log including the turn just appended; projection strips it.
        let log = self.store.messages(session_id, owner).await?;
        let request = GenerateRequest {
            model: self.config.model.clone(),
            history: history::project(&log),
            prompt: prompt.to_string(),
        };

        let mut fragments = self.provider.stream(request);
        let first = tokio::time::timeout(self.config.idle_timeout, fragments.next())
            .await
            .map_err(|_| {
                ProviderError::IdleTimeout {
                    idle_ms: self.config.idle_timeout.as_millis() as u64,
                }
            })?;

        let pending = match first {
            Some(Ok(fragment)) => Some(fragment),
            Some(Err(error)) => return Err(error.into()),
            None => None,
        };

        Ok(ActiveTurn {
            store: self.store.clone(),
            session_id: session_id.to_string(),
            pending,
            rest: fragments,
            idle_timeout: self.config.idle_timeout,
        })
    }
}

/// A turn that has persisted its user message and opened the provider
/// stream; streaming to the caller has not started yet.
pub struct ActiveTurn<S: SessionStore> {
    store: Arc<S>,
    session_id: String,
    pending: Option<String>,
    rest: FragmentStream,
    idle_timeout: Duration,
}

impl<S: SessionStore> std::fmt::Debug for ActiveTurn<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveTurn")
            .field("session_id", &self.session_id)
            .field("pending", &self.pending)
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

impl<S: SessionStore> ActiveTurn<S> {
    /// Relay the provider stream into `sink` and reconcile the result.
    ///
    /// On a drained stream, appends the accumulated text as a model message.
    /// An append failure at that point is logged and reported through
    /// `persisted: false` -- the caller already received and closed the
    /// stream, so nothing is re-raised. On provider failure or caller
    /// disconnect nothing is persisted and the provider stream is dropped.
    pub async fn drive<K: FragmentSink>(mut self, sink: &mut K) -> TurnOutcome {
        let source = stream::iter(self.pending.take().into_iter().map(Ok)).chain(self.rest);

        match relay(source, sink, self.idle_timeout).await {
            Ok(output) => {
                if output.text.is_empty() {
                    debug!(session_id = %self.session_id, "provider produced no output; nothing persisted");
                    return TurnOutcome::Completed {
                        reply: ChatMessage::model(&self.session_id, ""),
                        persisted: false,
                    };
                }

                let reply = ChatMessage::model(&self.session_id, output.text);
                match self.store.append_message(&self.session_id, &reply).await {
                    Ok(()) => TurnOutcome::Completed {
                        reply,
                        persisted: true,
                    },
                    Err(error) => {
                        warn!(
                            session_id = %self.session_id,
                            %error,
                            "model reply delivered but could not be persisted"
                        );
                        TurnOutcome::Completed {
                            reply,
                            persisted: false,
                        }
                    }
                }
            }
            Err(RelayError::Provider { error, forwarded }) => {
                warn!(
                    session_id = %self.session_id,
                    %error,
                    forwarded,
                    "provider stream failed mid-turn; reply not persisted"
                );
                TurnOutcome::ProviderFailed { error, forwarded }
            }
            Err(RelayError::SinkClosed { forwarded }) => {
                debug!(
                    session_id = %self.session_id,
                    forwarded,
                    "caller disconnected; provider stream released"
                );
                TurnOutcome::Cancelled { forwarded }
            }
        }
    }
}

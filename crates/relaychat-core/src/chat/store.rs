//! SessionStore trait definition.
//!
//! The durable store of conversation sessions, keyed by session id and
//! scoped to an owner. Uses native async fn in traits (RPITIT, Rust 2024
//! edition); implementations live in this crate (`MemorySessionStore`) and
//! in relaychat-infra (`SqliteSessionStore`).

use relaychat_types::chat::{ChatMessage, ChatSession, SessionSummary};
use relaychat_types::error::RepositoryError;

/// Repository trait for session and message persistence.
///
/// All operations are scoped to an `owner`: a session that exists under a
/// different owner behaves as if it did not exist. `append_message` is the
/// only mutation the turn engine performs and must be atomic at the
/// single-append granularity -- one append never observes or clobbers
/// another's partial state, and every append bumps `updated_at`.
pub trait SessionStore: Send + Sync {
    /// Return the session for `session_id`, creating an empty one on first
    /// use. Atomic upsert: concurrent calls with the same fresh id yield
    /// exactly one session.
    fn get_or_create(
        &self,
        session_id: &str,
        owner: &str,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Get a session by id, or `None` if absent for this owner.
    fn get(
        &self,
        session_id: &str,
        owner: &str,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Atomically append one message and advance the session's `updated_at`.
    ///
    /// Fails with `RepositoryError::NotFound` if the session no longer
    /// exists (e.g., deleted mid-turn).
    fn append_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get the full message log in chronological order.
    ///
    /// Fails with `RepositoryError::NotFound` for an unknown session; the
    /// HTTP layer maps that to an empty list where probing must be safe.
    fn messages(
        &self,
        session_id: &str,
        owner: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// List session summaries for an owner, most recently updated first,
    /// with display titles already derived.
    fn list(
        &self,
        owner: &str,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<SessionSummary>, RepositoryError>> + Send;

    /// Set the stored title of a session.
    fn rename(
        &self,
        session_id: &str,
        owner: &str,
        title: String,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a session and its entire message log.
    fn delete(
        &self,
        session_id: &str,
        owner: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

//! In-memory SessionStore backed by DashMap.
//!
//! Zero-setup backend used by tests and single-process deployments that do
//! not need durability. Atomicity comes from DashMap's per-shard locking:
//! `get_or_create` uses the entry API so concurrent creates collapse into
//! one insert, and `append_message` holds the shard write guard for the
//! whole push-and-bump.

use chrono::Utc;
use dashmap::DashMap;

use relaychat_types::chat::{
    display_title, monotonic_bump, ChatMessage, ChatSession, Role, SessionSummary,
};
use relaychat_types::error::RepositoryError;

use crate::chat::store::SessionStore;

struct StoredSession {
    session: ChatSession,
    messages: Vec<ChatMessage>,
}

/// DashMap-backed implementation of [`SessionStore`].
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, StoredSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    async fn get_or_create(
        &self,
        session_id: &str,
        owner: &str,
    ) -> Result<ChatSession, RepositoryError> {
        let entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                let now = Utc::now();
                StoredSession {
                    session: ChatSession {
                        id: session_id.to_string(),
                        owner: owner.to_string(),
                        title: None,
                        created_at: now,
                        updated_at: now,
                    },
                    messages: Vec::new(),
                }
            });

        if entry.session.owner != owner {
            return Err(RepositoryError::NotFound);
        }
        Ok(entry.session.clone())
    }

    async fn get(
        &self,
        session_id: &str,
        owner: &str,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self
            .sessions
            .get(session_id)
            .filter(|s| s.session.owner == owner)
            .map(|s| s.session.clone()))
    }

    async fn append_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or(RepositoryError::NotFound)?;

        entry.messages.push(message.clone());
        entry.session.updated_at = monotonic_bump(entry.session.updated_at, message.created_at);
        Ok(())
    }

    async fn messages(
        &self,
        session_id: &str,
        owner: &str,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let entry = self
            .sessions
            .get(session_id)
            .filter(|s| s.session.owner == owner)
            .ok_or(RepositoryError::NotFound)?;
        Ok(entry.messages.clone())
    }

    async fn list(&self, owner: &str, limit: i64) -> Result<Vec<SessionSummary>, RepositoryError> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .iter()
            .filter(|s| s.session.owner == owner)
            .map(|s| {
                let first_user = s
                    .messages
                    .iter()
                    .find(|m| m.role == Role::User)
                    .map(|m| m.content.as_str());
                SessionSummary {
                    session_id: s.session.id.clone(),
                    title: display_title(s.session.title.as_deref(), first_user),
                    created_at: s.session.created_at,
                    updated_at: s.session.updated_at,
                }
            })
            .collect();

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries.truncate(limit.max(0) as usize);
        Ok(summaries)
    }

    async fn rename(
        &self,
        session_id: &str,
        owner: &str,
        title: String,
    ) -> Result<(), RepositoryError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or(RepositoryError::NotFound)?;
        if entry.session.owner != owner {
            return Err(RepositoryError::NotFound);
        }
        entry.session.title = Some(title);
        entry.session.updated_at = monotonic_bump(entry.session.updated_at, Utc::now());
        Ok(())
    }

    async fn delete(&self, session_id: &str, owner: &str) -> Result<(), RepositoryError> {
        let owned = self
            .sessions
            .get(session_id)
            .map(|s| s.session.owner == owner)
            .unwrap_or(false);
        if !owned {
            return Err(RepositoryError::NotFound);
        }
        self.sessions.remove(session_id);
        Ok(())
    }
}

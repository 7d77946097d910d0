//! Chat session and message types for relaychat.
//!
//! A session is a persisted, uniquely identified conversation owning an
//! ordered log of messages. Session ids are caller-supplied opaque strings;
//! message ids are UUIDv7 so they sort chronologically alongside timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Maximum length of a title derived from the first user message.
pub const TITLE_PREVIEW_LEN: usize = 30;

/// Fallback title for sessions with no stored title and no user message yet.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Role of a message within a conversation.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'model'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "model" => Ok(Role::Model),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A chat session between a caller and the model provider.
///
/// The message log lives in its own table/collection keyed by `id`;
/// `updated_at` is bumped on every append so sessions list most-recent-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// Caller-supplied unique session identifier. Immutable once created.
    pub id: String,
    /// Identity reference of the owning caller.
    pub owner: String,
    /// Stored title, if the caller renamed the session.
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single message within a chat session.
///
/// Messages are ordered by `(created_at, id)` within a session; UUIDv7 ids
/// break ties between appends that land on the same timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: String,
    pub role: Role,
    pub content: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a user message stamped now.
    pub fn user(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::stamped(session_id, Role::User, content)
    }

    /// Build a model message stamped now.
    pub fn model(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::stamped(session_id, Role::Model, content)
    }

    fn stamped(session_id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id: session_id.into(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Listing view of a session, with the display title already computed.
///
/// Serializes in the camelCase shape the listing endpoint exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Advance a session's `updated_at` for an append.
///
/// `updated_at` must advance strictly with every append, even when two
/// appends land inside the clock's resolution or the wall clock steps
/// backwards. Returns `now` when it is ahead of `prev`, otherwise `prev`
/// plus one microsecond.
pub fn monotonic_bump(prev: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > prev {
        now
    } else {
        prev + chrono::Duration::microseconds(1)
    }
}

/// Compute the display title for a session.
///
/// Falls back through: stored title -> first user message truncated to
/// [`TITLE_PREVIEW_LEN`] characters with a `...` marker -> [`DEFAULT_TITLE`].
/// This is the single computed view used by every listing call site.
pub fn display_title(stored: Option<&str>, first_user_message: Option<&str>) -> String {
    if let Some(title) = stored {
        let title = title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }

    match first_user_message {
        Some(content) if !content.is_empty() => {
            let mut preview: String = content.chars().take(TITLE_PREVIEW_LEN).collect();
            if content.chars().count() > TITLE_PREVIEW_LEN {
                preview.push_str("...");
            }
            preview
        }
        _ => DEFAULT_TITLE.to_string(),
    }
}

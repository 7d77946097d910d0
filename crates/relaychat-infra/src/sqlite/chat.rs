//! SQLite session store implementation.
//!
//! Implements `SessionStore` from `relaychat-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reads on the reader
//! pool, mutations on the single-connection writer pool.
//!
//! Appends run as one transaction (existence check, message insert,
//! `updated_at` bump) on the writer, which serializes them against every
//! other write -- the single atomic append the turn engine relies on.
//! `get_or_create` uses `INSERT .. ON CONFLICT DO NOTHING` so concurrent
//! creates of the same fresh id collapse into one row.

use chrono::{DateTime, Utc};
use sqlx::Row;

use relaychat_core::chat::store::SessionStore;
use relaychat_types::chat::{
    display_title, monotonic_bump, ChatMessage, ChatSession, Role, SessionSummary,
};
use relaychat_types::error::RepositoryError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionStore`.
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatSessionRow {
    id: String,
    owner: String,
    title: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner: row.try_get("owner")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        Ok(ChatSession {
            id: self.id,
            owner: self.owner,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct ChatMessageRow {
    id: String,
    session_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = uuid::Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let role: Role = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            id,
            session_id: self.session_id,
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

// ---------------------------------------------------------------------------
// SessionStore implementation
// ---------------------------------------------------------------------------

impl SessionStore for SqliteSessionStore {
    async fn get_or_create(
        &self,
        session_id: &str,
        owner: &str,
    ) -> Result<ChatSession, RepositoryError> {
        let now = Utc::now();
        sqlx::query(
            r#"INSERT INTO chat_sessions (id, owner, title, created_at, updated_at)
               VALUES (?, ?, NULL, ?, ?)
               ON CONFLICT(id) DO NOTHING"#,
        )
        .bind(session_id)
        .bind(owner)
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        // Read back through the writer so we observe our own insert even
        // before the WAL is checkpointed for readers.
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id)
            .fetch_one(&self.pool.writer)
            .await
            .map_err(query_err)?;

        let session = ChatSessionRow::from_row(&row)
            .map_err(query_err)?
            .into_session()?;

        // Scoped to owner: someone else's session behaves as absent.
        if session.owner != owner {
            return Err(RepositoryError::NotFound);
        }
        Ok(session)
    }

    async fn get(
        &self,
        session_id: &str,
        owner: &str,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ? AND owner = ?")
            .bind(session_id)
            .bind(owner)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => Ok(Some(
                ChatSessionRow::from_row(&row)
                    .map_err(query_err)?
                    .into_session()?,
            )),
            None => Ok(None),
        }
    }

    async fn append_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let row = sqlx::query("SELECT updated_at FROM chat_sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_err)?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };
        let prev: String = row.try_get("updated_at").map_err(query_err)?;
        let bumped = monotonic_bump(parse_datetime(&prev)?, message.created_at);

        sqlx::query(
            r#"INSERT INTO chat_messages (id, session_id, role, content, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(session_id)
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(format_datetime(&message.created_at))
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&bumped))
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;
        Ok(())
    }

    async fn messages(
        &self,
        session_id: &str,
        owner: &str,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        if self.get(session_id, owner).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let rows = sqlx::query(
            "SELECT * FROM chat_messages WHERE session_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            messages.push(ChatMessageRow::from_row(row).map_err(query_err)?.into_message()?);
        }
        Ok(messages)
    }

    async fn list(&self, owner: &str, limit: i64) -> Result<Vec<SessionSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT s.id, s.title, s.created_at, s.updated_at,
                      (SELECT m.content FROM chat_messages m
                       WHERE m.session_id = s.id AND m.role = 'user'
                       ORDER BY m.created_at ASC, m.id ASC LIMIT 1) AS first_user_message
               FROM chat_sessions s
               WHERE s.owner = ?
               ORDER BY s.updated_at DESC
               LIMIT ?"#,
        )
        .bind(owner)
        .bind(limit)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id").map_err(query_err)?;
            let title: Option<String> = row.try_get("title").map_err(query_err)?;
            let created_at: String = row.try_get("created_at").map_err(query_err)?;
            let updated_at: String = row.try_get("updated_at").map_err(query_err)?;
            let first_user: Option<String> =
                row.try_get("first_user_message").map_err(query_err)?;

            summaries.push(SessionSummary {
                session_id: id,
                title: display_title(title.as_deref(), first_user.as_deref()),
                created_at: parse_datetime(&created_at)?,
                updated_at: parse_datetime(&updated_at)?,
            });
        }
        Ok(summaries)
    }

    async fn rename(
        &self,
        session_id: &str,
        owner: &str,
        title: String,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let row = sqlx::query("SELECT updated_at FROM chat_sessions WHERE id = ? AND owner = ?")
            .bind(session_id)
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_err)?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };
        let prev: String = row.try_get("updated_at").map_err(query_err)?;
        let bumped = monotonic_bump(parse_datetime(&prev)?, Utc::now());

        sqlx::query("UPDATE chat_sessions SET title = ?, updated_at = ? WHERE id = ?")
            .bind(&title)
            .bind(format_datetime(&bumped))
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;
        Ok(())
    }

    async fn delete(&self, session_id: &str, owner: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = ? AND owner = ?")
            .bind(session_id)
            .bind(owner)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

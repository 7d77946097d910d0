//! SQLite persistence for relaychat, built on sqlx.

pub mod chat;
pub mod pool;

//! Shared domain types for relaychat.
//!
//! This crate contains the core domain types used across the relaychat
//! workspace: sessions, messages, provider request shapes, configuration,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror,
//! secrecy.

pub mod chat;
pub mod config;
pub mod error;
pub mod provider;

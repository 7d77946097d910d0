//! HTTP application layer for relaychat.
//!
//! Exposed as a library so router-level integration tests can assemble the
//! full HTTP surface against in-process stores and scripted providers; the
//! `rchat` binary is a thin wrapper around [`state::AppState`] and
//! [`http::router::build_router`].

pub mod http;
pub mod state;

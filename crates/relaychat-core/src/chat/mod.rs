//! Chat engine modules: the session store port, the in-memory store, history
//! projection, the stream relay, and the turn orchestrator.

pub mod history;
pub mod memory;
pub mod relay;
pub mod store;
pub mod turn;

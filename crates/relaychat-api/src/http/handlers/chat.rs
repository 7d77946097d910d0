//! Streaming chat endpoint.
//!
//! POST /api/v1/chat/stream
//!
//! The response body is the raw concatenation of provider fragments as
//! `text/plain` with chunked transfer -- no per-chunk envelope. Everything
//! that can fail before streaming (validation, write-ahead persistence,
//! opening the provider stream) happens in `begin_turn`, so those failures
//! still produce a structured JSON error. After that the turn is driven in
//! a spawned task and bridged to the body through a bounded channel: a full
//! channel suspends the relay until the client drains (backpressure), and a
//! dropped receiver (client disconnect) cancels the provider stream.

use std::io;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use relaychat_core::chat::relay::{FragmentSink, SinkClosed};
use relaychat_core::chat::turn::TurnOutcome;

use crate::http::error::AppError;
use crate::http::identity::Identity;
use crate::state::AppState;

/// Request body for the streaming chat endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChatRequest {
    pub prompt: String,
    pub session_id: String,
}

/// Fragment sink writing into the response-body channel.
///
/// Frames are `Result` so the drive task can abort the transport with an
/// error frame when the provider fails mid-stream -- the connection then
/// terminates without a clean end instead of looking like a complete reply.
struct ChannelSink(mpsc::Sender<Result<Bytes, io::Error>>);

impl FragmentSink for ChannelSink {
    async fn send(&mut self, fragment: &str) -> Result<(), SinkClosed> {
        self.0
            .send(Ok(Bytes::copy_from_slice(fragment.as_bytes())))
            .await
            .map_err(|_| SinkClosed)
    }
}

/// POST /api/v1/chat/stream -- run one chat turn, streaming the reply.
pub async fn stream_chat(
    State(state): State<AppState>,
    Identity(owner): Identity,
    Json(body): Json<StreamChatRequest>,
) -> Result<Response, AppError> {
    let turn = state
        .orchestrator
        .begin_turn(&owner, &body.session_id, &body.prompt)
        .await?;

    let (tx, rx) = mpsc::channel::<Result<Bytes, io::Error>>(state.config.stream.channel_capacity);
    let session_id = body.session_id.clone();

    tokio::spawn(async move {
        let mut sink = ChannelSink(tx.clone());
        match turn.drive(&mut sink).await {
            TurnOutcome::Completed { reply, persisted } => {
                info!(
                    session_id = %session_id,
                    chars = reply.content.len(),
                    persisted,
                    "turn completed"
                );
            }
            TurnOutcome::ProviderFailed { error, .. } => {
                // Abort the body so the client does not mistake the
                // truncated reply for a complete one.
                let _ = tx.send(Err(io::Error::other(error.to_string()))).await;
            }
            TurnOutcome::Cancelled { .. } => {}
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(ReceiverStream::new(rx)))
        .map_err(|e| AppError::Internal(e.to_string()))
}

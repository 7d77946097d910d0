//! StreamRelay: forward provider fragments to the caller while accumulating
//! the full reply.
//!
//! The relay consumes a finite, ordered, non-restartable fragment stream.
//! Each fragment is forwarded through a backpressure-aware [`FragmentSink`]
//! *before* being appended to the accumulator, so the caller sees output in
//! real time and the stored reply is the exact concatenation of what was
//! forwarded. A per-read idle timeout bounds how long a stalled provider can
//! hold the connection open.

use std::time::Duration;

use futures_util::{Stream, StreamExt};

use relaychat_types::provider::ProviderError;

/// The caller's transport went away; no more fragments can be delivered.
#[derive(Debug)]
pub struct SinkClosed;

/// Backpressure-aware fragment destination.
///
/// `send` suspends until the transport has accepted the fragment, so a slow
/// client throttles the relay (and, transitively, the provider read loop)
/// instead of growing an unbounded buffer.
pub trait FragmentSink: Send {
    fn send(
        &mut self,
        fragment: &str,
    ) -> impl std::future::Future<Output = Result<(), SinkClosed>> + Send;
}

/// A bounded tokio channel as a fragment sink. The HTTP layer wires the
/// receiving half into the response body.
impl FragmentSink for tokio::sync::mpsc::Sender<String> {
    async fn send(&mut self, fragment: &str) -> Result<(), SinkClosed> {
        tokio::sync::mpsc::Sender::send(self, fragment.to_string())
            .await
            .map_err(|_| SinkClosed)
    }
}

/// Successful relay result: the full concatenation and the fragment count.
#[derive(Debug)]
pub struct RelayOutput {
    pub text: String,
    pub fragments: usize,
}

/// Relay failure, with how many fragments had already been forwarded.
#[derive(Debug)]
pub enum RelayError {
    /// The source raised mid-sequence (or stalled past the idle timeout).
    /// Everything up to the failure point was already forwarded.
    Provider {
        error: ProviderError,
        forwarded: usize,
    },
    /// The sink rejected a fragment: the caller disconnected.
    SinkClosed { forwarded: usize },
}

/// Drain `source`, forwarding each fragment through `sink` in arrival order
/// and accumulating the concatenation.
///
/// Propagates source failures instead of silently truncating, so the
/// orchestrator can decide on persistence and transport termination.
pub async fn relay<S, K>(
    source: S,
    sink: &mut K,
    idle_timeout: Duration,
) -> Result<RelayOutput, RelayError>
where
    S: Stream<Item = Result<String, ProviderError>> + Send,
    K: FragmentSink,
{
    let mut source = std::pin::pin!(source);
    let mut text = String::new();
    let mut fragments = 0usize;

    loop {
        let next = tokio::time::timeout(idle_timeout, source.next())
            .await
            .map_err(|_| RelayError::Provider {
                error: ProviderError::IdleTimeout {
                    idle_ms: idle_timeout.as_millis() as u64,
                },
                forwarded: fragments,
            })?;

        match next {
            Some(Ok(fragment)) => {
                if sink.send(&fragment).await.is_err() {
                    return Err(RelayError::SinkClosed {
                        forwarded: fragments,
                    });
                }
                text.push_str(&fragment);
                fragments += 1;
            }
            Some(Err(error)) => {
                return Err(RelayError::Provider {
                    error,
                    forwarded: fragments,
                });
            }
            None => {
                return Ok(RelayOutput { text, fragments });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    /// Sink that records fragments and optionally closes after N sends.
    struct RecordingSink {
        received: Vec<String>,
        close_after: Option<usize>,
    }

    impl RecordingSink {
        fn open() -> Self {
            Self {
                received: Vec::new(),
                close_after: None,
            }
        }

        fn closing_after(n: usize) -> Self {
            Self {
                received: Vec::new(),
                close_after: Some(n),
            }
        }
    }

    impl FragmentSink for RecordingSink {
        async fn send(&mut self, fragment: &str) -> Result<(), SinkClosed> {
            if let Some(limit) = self.close_after {
                if self.received.len() >= limit {
                    return Err(SinkClosed);
                }
            }
            self.received.push(fragment.to_string());
            Ok(())
        }
    }

    fn ok_fragments(parts: &[&str]) -> Vec<Result<String, ProviderError>> {
        parts.iter().map(|p| Ok(p.to_string())).collect()
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_relay_forwards_each_fragment_and_concatenates() {
        let mut sink = RecordingSink::open();
        let source = stream::iter(ok_fragments(&["Hel", "lo!"]));

        let output = relay(source, &mut sink, TIMEOUT).await.unwrap();
        assert_eq!(output.text, "Hello!");
        assert_eq!(output.fragments, 2);
        assert_eq!(sink.received, vec!["Hel", "lo!"]);
    }

    #[tokio::test]
    async fn test_relay_empty_source() {
        let mut sink = RecordingSink::open();
        let source = stream::iter(ok_fragments(&[]));

        let output = relay(source, &mut sink, TIMEOUT).await.unwrap();
        assert_eq!(output.text, "");
        assert_eq!(output.fragments, 0);
        assert!(sink.received.is_empty());
    }

    #[tokio::test]
    async fn test_relay_propagates_mid_stream_failure() {
        let mut sink = RecordingSink::open();
        let source = stream::iter(vec![
            Ok("partial".to_string()),
            Err(ProviderError::Stream("connection reset".to_string())),
            Ok("never seen".to_string()),
        ]);

        let err = relay(source, &mut sink, TIMEOUT).await.unwrap_err();
        match err {
            RelayError::Provider { error, forwarded } => {
                assert!(matches!(error, ProviderError::Stream(_)));
                assert_eq!(forwarded, 1);
            }
            other => panic!("expected provider error, got {other:?}"),
        }
        // Everything before the failure point was already forwarded.
        assert_eq!(sink.received, vec!["partial"]);
    }

    #[tokio::test]
    async fn test_relay_stops_when_sink_closes() {
        let mut sink = RecordingSink::closing_after(1);
        let source = stream::iter(ok_fragments(&["one", "two", "three"]));

        let err = relay(source, &mut sink, TIMEOUT).await.unwrap_err();
        assert!(matches!(err, RelayError::SinkClosed { forwarded: 1 }));
        assert_eq!(sink.received, vec!["one"]);
    }

    #[tokio::test]
    async fn test_relay_times_out_on_stalled_source() {
        let mut sink = RecordingSink::open();
        let source = stream::iter(ok_fragments(&["early"])).chain(stream::pending());

        let err = relay(source, &mut sink, Duration::from_millis(50))
            .await
            .unwrap_err();
        match err {
            RelayError::Provider { error, forwarded } => {
                assert!(matches!(error, ProviderError::IdleTimeout { .. }));
                assert_eq!(forwarded, 1);
            }
            other => panic!("expected idle timeout, got {other:?}"),
        }
        assert_eq!(sink.received, vec!["early"]);
    }

    #[tokio::test]
    async fn test_channel_sender_sink() {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(4);
        let mut sink = tx;
        let source = stream::iter(ok_fragments(&["a", "b"]));

        let output = relay(source, &mut sink, TIMEOUT).await.unwrap();
        assert_eq!(output.text, "ab");
        drop(sink);
        assert_eq!(rx.recv().await.as_deref(), Some("a"));
        assert_eq!(rx.recv().await.as_deref(), Some("b"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_channel_sender_sink_reports_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::channel::<String>(1);
        drop(rx);
        let mut sink = tx;
        let source = stream::iter(ok_fragments(&["lost"]));

        let err = relay(source, &mut sink, TIMEOUT).await.unwrap_err();
        assert!(matches!(err, RelayError::SinkClosed { forwarded: 0 }));
    }
}

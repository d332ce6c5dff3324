//! Response sinks.
//!
//! An [`EventSink`] is the only thing the emitter knows about the HTTP
//! response: it receives the response headers once, then frame bytes in order,
//! then an end (or abort) signal.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::{EmitError, SinkError};

/// A response header as a `(name, value)` pair of lowercase static strings.
pub type Header = (&'static str, &'static str);

/// Headers sent with every event-stream response.
pub const SSE_HEADERS: &[Header] = &[
    (
        turbosse_encoding::headers::CONTENT_TYPE,
        turbosse_encoding::headers::CONTENT_TYPE_SSE,
    ),
    (
        turbosse_encoding::headers::CONTENT_ENCODING,
        turbosse_encoding::headers::ENCODING_IDENTITY,
    ),
    (
        turbosse_encoding::headers::CACHE_CONTROL,
        turbosse_encoding::headers::NO_CACHE,
    ),
];

/// Byte sink for one event-stream response.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Set the response headers and commit the response head.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::HeadersSent`] if the head was already committed.
    fn begin(&mut self, headers: &[Header]) -> Result<(), SinkError>;

    /// Write one encoded frame.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Closed`] if the peer went away or the sink was
    /// already ended.
    async fn write(&mut self, frame: Bytes) -> Result<(), SinkError>;

    /// End the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be closed cleanly.
    async fn end(&mut self) -> Result<(), SinkError>;

    /// End the response in an error state, without a terminal frame.
    async fn abort(&mut self, _reason: &EmitError) {
        let _ = self.end().await;
    }

    /// Resolves once the peer has gone away.
    async fn closed(&self) {
        std::future::pending::<()>().await;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SinkState {
    #[default]
    Idle,
    Open,
    Ended,
    Aborted,
}

/// In-memory sink recording headers and body.
///
/// Useful in tests and for hosts that deliver the body in one piece.
#[derive(Debug, Default)]
pub struct BufferSink {
    headers: Vec<Header>,
    body: BytesMut,
    writes: usize,
    write_limit: Option<usize>,
    state: SinkState,
    disconnect: CancellationToken,
}

impl BufferSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that fails with [`SinkError::Closed`] after `limit`
    /// successful writes, as if the client disconnected.
    pub fn with_write_limit(limit: usize) -> Self {
        Self {
            write_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Token that simulates the client going away when cancelled.
    pub fn disconnect_token(&self) -> CancellationToken {
        self.disconnect.clone()
    }

    /// Headers set by [`EventSink::begin`].
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Look up a header value by (lowercase) name.
    pub fn header(&self, name: &str) -> Option<&'static str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    /// Body bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text.
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Returns `true` if the response was ended cleanly.
    pub fn is_ended(&self) -> bool {
        self.state == SinkState::Ended
    }

    /// Returns `true` if the response was aborted.
    pub fn is_aborted(&self) -> bool {
        self.state == SinkState::Aborted
    }
}

#[async_trait]
impl EventSink for BufferSink {
    fn begin(&mut self, headers: &[Header]) -> Result<(), SinkError> {
        if self.state != SinkState::Idle {
            return Err(SinkError::HeadersSent);
        }
        self.headers = headers.to_vec();
        self.state = SinkState::Open;
        Ok(())
    }

    async fn write(&mut self, frame: Bytes) -> Result<(), SinkError> {
        if self.state != SinkState::Open || self.disconnect.is_cancelled() {
            return Err(SinkError::Closed);
        }
        if self.write_limit.is_some_and(|limit| self.writes >= limit) {
            self.disconnect.cancel();
            return Err(SinkError::Closed);
        }
        self.body.extend_from_slice(&frame);
        self.writes += 1;
        Ok(())
    }

    async fn end(&mut self) -> Result<(), SinkError> {
        match self.state {
            SinkState::Open => {
                self.state = SinkState::Ended;
                Ok(())
            }
            _ => Err(SinkError::Closed),
        }
    }

    async fn abort(&mut self, _reason: &EmitError) {
        self.state = SinkState::Aborted;
    }

    async fn closed(&self) {
        self.disconnect.cancelled().await;
    }
}

/// Receiving halves of a [`ChannelSink`].
#[derive(Debug)]
pub struct ChannelParts {
    /// Resolves with the headers once the emitter calls [`EventSink::begin`]
    pub head: oneshot::Receiver<Vec<Header>>,
    /// Frame bytes in order; an `Err` item means the response was aborted
    pub body: mpsc::Receiver<Result<Bytes, SinkError>>,
}

/// Sink backed by a bounded channel, for hosts that stream the body.
///
/// The bounded channel is the backpressure path: when the client reads
/// slowly the channel fills and [`EventSink::write`] waits.
#[derive(Debug)]
pub struct ChannelSink {
    head: Option<oneshot::Sender<Vec<Header>>>,
    body: Option<mpsc::Sender<Result<Bytes, SinkError>>>,
}

impl ChannelSink {
    /// Create a sink and its receiving halves.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; [`crate::EmitConfig::validate`] rejects
    /// such configurations first.
    pub fn new(capacity: usize) -> (Self, ChannelParts) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(capacity);
        (
            Self {
                head: Some(head_tx),
                body: Some(body_tx),
            },
            ChannelParts {
                head: head_rx,
                body: body_rx,
            },
        )
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    fn begin(&mut self, headers: &[Header]) -> Result<(), SinkError> {
        let head = self.head.take().ok_or(SinkError::HeadersSent)?;
        head.send(headers.to_vec()).map_err(|_| SinkError::Closed)
    }

    async fn write(&mut self, frame: Bytes) -> Result<(), SinkError> {
        let body = self.body.as_ref().ok_or(SinkError::Closed)?;
        body.send(Ok(frame)).await.map_err(|_| SinkError::Closed)
    }

    async fn end(&mut self) -> Result<(), SinkError> {
        // Dropping the sender ends the body stream
        self.body.take().map(drop).ok_or(SinkError::Closed)
    }

    async fn abort(&mut self, reason: &EmitError) {
        if let Some(body) = self.body.take() {
            let _ = body.send(Err(SinkError::Aborted(reason.to_string()))).await;
        }
    }

    async fn closed(&self) {
        if let Some(ref body) = self.body {
            body.closed().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_buffer_sink_lifecycle() {
        let mut sink = BufferSink::new();
        sink.begin(SSE_HEADERS).unwrap();
        sink.write(Bytes::from_static(b"data: a\r\n\r\n")).await.unwrap();
        sink.end().await.unwrap();

        assert_eq!(sink.header("Content-Type"), Some("text/event-stream"));
        assert_eq!(sink.body(), b"data: a\r\n\r\n");
        assert!(sink.is_ended());
        assert_eq!(sink.write(Bytes::new()).await, Err(SinkError::Closed));
    }

    #[tokio::test]
    async fn test_buffer_sink_rejects_second_begin() {
        let mut sink = BufferSink::new();
        sink.begin(SSE_HEADERS).unwrap();
        assert_eq!(sink.begin(SSE_HEADERS), Err(SinkError::HeadersSent));
    }

    #[tokio::test]
    async fn test_buffer_sink_write_limit() {
        let mut sink = BufferSink::with_write_limit(1);
        sink.begin(SSE_HEADERS).unwrap();
        sink.write(Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(sink.write(Bytes::from_static(b"y")).await, Err(SinkError::Closed));
        assert!(sink.disconnect_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_head_and_body() {
        let (mut sink, mut parts) = ChannelSink::new(4);
        sink.begin(SSE_HEADERS).unwrap();
        assert_eq!(parts.head.await.unwrap(), SSE_HEADERS.to_vec());

        sink.write(Bytes::from_static(b"frame")).await.unwrap();
        sink.end().await.unwrap();

        assert_eq!(parts.body.recv().await, Some(Ok(Bytes::from_static(b"frame"))));
        assert_eq!(parts.body.recv().await, None);
    }

    #[tokio::test]
    async fn test_channel_sink_reports_dropped_receiver() {
        let (mut sink, parts) = ChannelSink::new(1);
        drop(parts);

        sink.closed().await;
        assert_eq!(sink.write(Bytes::new()).await, Err(SinkError::Closed));
    }
}

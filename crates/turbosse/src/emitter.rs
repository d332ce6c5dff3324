//! The emission adapter.
//!
//! An [`Emitter`] owns one response's configuration and id counter. It sets
//! the event-stream headers, writes one frame per value in production order,
//! and finishes with the terminal `event: end` frame.
//!
//! ## Failure policy
//!
//! | Failure | Terminal frame | Sink | Result |
//! |---------|----------------|------|--------|
//! | Invalid configuration | no | untouched | `Err(Config)` |
//! | Value fails to encode | no | aborted | `Err(Encode)` |
//! | Source yields `Err` | no | aborted | `Err(Source)` |
//! | Client disconnects | no | dropped | `Ok` with [`EmitOutcome::Cancelled`] |
//! | Other sink failure | no | dropped | `Err(Sink)` |
//!
//! A derived id or event name containing CR or LF counts as a value that fails
//! to encode. An empty derived id or event name is not a failure: the field is
//! omitted from the frame.

use std::pin::pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{debug, trace, warn};
use turbosse_encoding::{EventData, FrameEncoder};

use crate::config::EmitConfig;
use crate::error::{BoxError, ConfigError, EmitError, EmitResult, SinkError};
use crate::session::EmissionSession;
use crate::sink::{EventSink, SSE_HEADERS};
use crate::source::EventSource;

/// How an emission ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitOutcome {
    /// All values and the terminal frame were written
    Completed,
    /// The client went away first
    Cancelled,
}

/// Totals for one emission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmitSummary {
    /// Data frames written (the terminal frame is not counted)
    pub frames: u64,
    /// Bytes written, terminal frame included
    pub bytes: u64,
    /// How the emission ended
    pub outcome: EmitOutcome,
}

impl EmitSummary {
    fn new() -> Self {
        Self {
            frames: 0,
            bytes: 0,
            outcome: EmitOutcome::Completed,
        }
    }

    fn cancelled(mut self) -> Self {
        self.outcome = EmitOutcome::Cancelled;
        self
    }
}

/// Emits values from one source to one sink.
#[derive(Debug)]
pub struct Emitter<T> {
    config: EmitConfig<T>,
}

impl<T> Emitter<T>
where
    T: EventData + Send + Sync + 'static,
{
    /// Create an emitter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: EmitConfig<T>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this emitter runs with.
    pub fn config(&self) -> &EmitConfig<T> {
        &self.config
    }

    /// Emit a single value or a stream, depending on the source.
    ///
    /// # Errors
    ///
    /// See the module-level failure policy.
    pub async fn emit<E, S>(self, source: EventSource<T, E>, sink: &mut S) -> EmitResult<EmitSummary>
    where
        E: Into<BoxError> + Send + 'static,
        S: EventSink + ?Sized,
    {
        match source {
            EventSource::Single(value) => self.send_one(value, sink).await,
            EventSource::Stream(stream) => self.send_stream(stream, sink).await,
        }
    }

    /// Emit one value followed by the terminal frame.
    ///
    /// # Errors
    ///
    /// See the module-level failure policy.
    pub async fn send_one<S>(self, value: T, sink: &mut S) -> EmitResult<EmitSummary>
    where
        S: EventSink + ?Sized,
    {
        let mut session = EmissionSession::new(&self.config);
        let mut summary = EmitSummary::new();
        debug!(mode = "single", "starting event emission");

        sink.begin(SSE_HEADERS)?;

        let frame = match session.encode(&value) {
            Ok(frame) => frame,
            Err(err) => return Err(fail(sink, err.into()).await),
        };
        match write(sink, frame, &mut summary).await {
            Ok(()) => {}
            Err(SinkError::Closed) => return Ok(disconnected(summary)),
            Err(err) => return Err(err.into()),
        }
        summary.frames += 1;

        finish(sink, summary).await
    }

    /// Emit every item of `stream` in order, then the terminal frame.
    ///
    /// The stream is only polled after the previous frame was written, and it
    /// is dropped as soon as the sink reports the client gone.
    ///
    /// # Errors
    ///
    /// See the module-level failure policy.
    pub async fn send_stream<St, E, S>(self, stream: St, sink: &mut S) -> EmitResult<EmitSummary>
    where
        St: Stream<Item = Result<T, E>> + Send,
        E: Into<BoxError>,
        S: EventSink + ?Sized,
    {
        let mut session = EmissionSession::new(&self.config);
        let mut summary = EmitSummary::new();
        debug!(mode = "stream", "starting event emission");

        sink.begin(SSE_HEADERS)?;

        let mut stream = pin!(stream);
        loop {
            let next = tokio::select! {
                biased;
                () = sink.closed() => return Ok(disconnected(summary)),
                next = stream.next() => next,
            };

            let value = match next {
                Some(Ok(value)) => value,
                Some(Err(err)) => {
                    let err = EmitError::from_source(err);
                    warn!(frames = summary.frames, error = %err, "event source failed");
                    return Err(fail(sink, err).await);
                }
                None => break,
            };

            let frame = match session.encode(&value) {
                Ok(frame) => frame,
                Err(err) => return Err(fail(sink, err.into()).await),
            };
            trace!(frame = summary.frames + 1, len = frame.len(), "writing frame");
            match write(sink, frame, &mut summary).await {
                Ok(()) => {}
                Err(SinkError::Closed) => return Ok(disconnected(summary)),
                Err(err) => return Err(err.into()),
            }
            summary.frames += 1;
        }

        finish(sink, summary).await
    }
}

/// Emit `source` to `sink` with `config`.
///
/// # Errors
///
/// Returns [`EmitError::Config`] before anything is written if the
/// configuration is invalid; otherwise see [`Emitter`].
pub async fn emit<T, E, S>(
    source: EventSource<T, E>,
    config: EmitConfig<T>,
    sink: &mut S,
) -> EmitResult<EmitSummary>
where
    T: EventData + Send + Sync + 'static,
    E: Into<BoxError> + Send + 'static,
    S: EventSink + ?Sized,
{
    Emitter::new(config)?.emit(source, sink).await
}

async fn write<S>(sink: &mut S, frame: Bytes, summary: &mut EmitSummary) -> Result<(), SinkError>
where
    S: EventSink + ?Sized,
{
    let len = frame.len() as u64;
    sink.write(frame).await?;
    summary.bytes += len;
    Ok(())
}

async fn finish<S>(sink: &mut S, mut summary: EmitSummary) -> EmitResult<EmitSummary>
where
    S: EventSink + ?Sized,
{
    match write(sink, FrameEncoder::encode_terminal(), &mut summary).await {
        Ok(()) => {}
        Err(SinkError::Closed) => return Ok(disconnected(summary)),
        Err(err) => return Err(err.into()),
    }
    sink.end().await?;

    debug!(frames = summary.frames, bytes = summary.bytes, "event emission completed");
    Ok(summary)
}

async fn fail<S>(sink: &mut S, err: EmitError) -> EmitError
where
    S: EventSink + ?Sized,
{
    warn!(error = %err, "aborting event stream");
    sink.abort(&err).await;
    err
}

fn disconnected(summary: EmitSummary) -> EmitSummary {
    debug!(frames = summary.frames, "client disconnected, dropping event source");
    summary.cancelled()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::BufferSink;
    use futures::stream;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_send_one_default_config() {
        let mut sink = BufferSink::new();
        let summary = Emitter::new(EmitConfig::default())
            .unwrap()
            .send_one("hello".to_owned(), &mut sink)
            .await
            .unwrap();

        assert_eq!(
            sink.body_string(),
            "id: 1\r\ndata: hello\r\n\r\nevent: end\r\ndata: \r\n\r\n"
        );
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.bytes, sink.body().len() as u64);
        assert_eq!(summary.outcome, EmitOutcome::Completed);
        assert!(sink.is_ended());
    }

    #[tokio::test]
    async fn test_empty_stream_writes_only_terminal() {
        let mut sink = BufferSink::new();
        let summary = Emitter::new(EmitConfig::<String>::default())
            .unwrap()
            .send_stream(stream::empty::<Result<String, std::io::Error>>(), &mut sink)
            .await
            .unwrap();

        assert_eq!(sink.body_string(), "event: end\r\ndata: \r\n\r\n");
        assert_eq!(summary.frames, 0);
    }

    #[tokio::test]
    async fn test_invalid_config_writes_nothing() {
        let mut sink = BufferSink::new();
        let err = emit(
            EventSource::<String>::single("x".into()),
            EmitConfig::new().with_event(""),
            &mut sink,
        )
        .await
        .unwrap_err();

        assert!(err.is_config());
        assert!(sink.headers().is_empty());
        assert!(sink.body().is_empty());
    }

    #[tokio::test]
    async fn test_reused_sink_is_rejected() {
        let mut sink = BufferSink::new();
        emit(EventSource::<String>::single("a".into()), EmitConfig::new(), &mut sink)
            .await
            .unwrap();

        let err = emit(EventSource::<String>::single("b".into()), EmitConfig::new(), &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, EmitError::Sink(SinkError::HeadersSent)));
    }
}

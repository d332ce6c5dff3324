//! axum integration.
//!
//! [`send_events`] is the host-facing entry point: call it once from a
//! handler with the response's source and configuration, and return the
//! resulting [`Response`]. The emission runs on its own task and feeds the
//! body through a bounded channel.
//!
//! ```rust,no_run
//! use axum::{Router, response::Response, routing::get};
//! use turbosse::{EmitConfig, EmitError, EventSource, send_events};
//!
//! async fn ticker() -> Result<Response, EmitError> {
//!     let source = EventSource::iter((1..=3).map(|n| format!("tick {n}")));
//!     send_events(source, EmitConfig::new().with_event("tick")).await
//! }
//!
//! let app: Router = Router::new().route("/ticker", get(ticker));
//! ```

use ::axum::body::Body;
use ::axum::http::{HeaderName, HeaderValue, StatusCode};
use ::axum::response::{IntoResponse, Response};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};
use turbosse_encoding::EventData;

use crate::config::EmitConfig;
use crate::emitter::Emitter;
use crate::error::{BoxError, EmitError, EmitResult, SinkError};
use crate::sink::ChannelSink;
use crate::source::EventSource;

/// Stream `source` as this handler's event-stream response.
///
/// The configuration is checked before anything is spawned, so an invalid
/// configuration is returned as `Err` and no response body exists. The
/// returned response carries `Content-Type: text/event-stream` and
/// `Content-Encoding: identity`.
///
/// When a value fails to encode or the source fails, the body ends with an
/// error, which makes the server reset the connection instead of sending a
/// terminal frame.
///
/// # Errors
///
/// Returns [`EmitError::Config`] for an invalid configuration, or
/// [`EmitError::Sink`] if the emission task ended before committing headers.
pub async fn send_events<T, E>(source: EventSource<T, E>, config: EmitConfig<T>) -> EmitResult<Response>
where
    T: EventData + Send + Sync + 'static,
    E: Into<BoxError> + Send + 'static,
{
    let emitter = Emitter::new(config)?;
    let (mut sink, parts) = ChannelSink::new(emitter.config().channel_capacity);

    tokio::spawn(async move {
        match emitter.emit(source, &mut sink).await {
            Ok(summary) => debug!(
                frames = summary.frames,
                bytes = summary.bytes,
                outcome = ?summary.outcome,
                "event stream finished"
            ),
            Err(err) => warn!(error = %err, "event stream failed"),
        }
    });

    let headers = parts.head.await.map_err(|_| SinkError::Closed)?;

    let mut response = Response::new(Body::from_stream(ReceiverStream::new(parts.body)));
    for (name, value) in headers {
        response
            .headers_mut()
            .insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    Ok(response)
}

impl IntoResponse for EmitError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Sink(SinkError::Closed) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

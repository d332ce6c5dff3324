//! # turbosse
//!
//! Server-Sent Events emission for HTTP responses.
//!
//! Given one value or a stream of values, turbosse writes a `text/event-stream`
//! body: one frame per value with auto-incrementing (or derived, or no) ids,
//! an optional event name, and a final `event: end` frame.
//!
//! ## Features
//!
//! - **Policies**: [`IdPolicy`] and [`EventNamePolicy`] select how each frame
//!   is labelled
//! - **Sources**: [`EventSource`] is either a single value or a stream
//! - **Sinks**: [`EventSink`] abstracts the response; [`BufferSink`] and
//!   [`ChannelSink`] are provided
//! - **axum**: [`send_events`] streams a source as a handler response
//!   (feature `axum`, on by default)
//!
//! ## Usage
//!
//! ```rust
//! use turbosse::{BufferSink, EmitConfig, EventSource, Json, emit};
//!
//! # futures::executor::block_on(async {
//! let mut sink = BufferSink::new();
//! let value = Json(serde_json::json!({"hello": "world"}));
//! emit(EventSource::<_>::single(value), EmitConfig::new(), &mut sink).await.unwrap();
//!
//! assert_eq!(
//!     sink.body_string(),
//!     "id: 1\r\ndata: {\"hello\":\"world\"}\r\n\r\nevent: end\r\ndata: \r\n\r\n"
//! );
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "axum")]
pub mod axum;
pub mod config;
pub mod emitter;
pub mod error;
pub mod policy;
pub mod session;
pub mod sink;
pub mod source;

#[cfg(feature = "axum")]
pub use crate::axum::send_events;
pub use config::{EmitConfig, EmitSettings, IdMode};
pub use emitter::{EmitOutcome, EmitSummary, Emitter, emit};
pub use error::{BoxError, ConfigError, EmitError, EmitResult, SinkError};
pub use policy::{EventNamePolicy, IdPolicy};
pub use session::EmissionSession;
pub use sink::{BufferSink, ChannelParts, ChannelSink, EventSink, SSE_HEADERS};
pub use source::EventSource;

pub use turbosse_encoding::{EncodeError, EventData, EventId, FrameEncoder, Json, SseFrame};

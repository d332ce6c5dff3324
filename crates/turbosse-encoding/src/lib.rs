//! # turbosse encoding
//!
//! Pure, no-I/O Server-Sent Events framing.
//!
//! - **Frames**: [`SseFrame`] with optional [`EventId`] and event name
//! - **Payloads**: [`EventData`] stringifies text, bytes and structured values
//! - **Encoding**: [`FrameEncoder`] renders the CRLF wire format
//! - **Decoding**: [`FrameParser`] for clients and tests
//!
//! ## Usage
//!
//! ```rust
//! use turbosse_encoding::{FrameEncoder, SseFrame};
//!
//! let frame = SseFrame::builder().id(1u64).event("test").data("hello").build().unwrap();
//! assert_eq!(
//!     FrameEncoder::encode(&frame),
//!     b"id: 1\r\nevent: test\r\ndata: hello\r\n\r\n".to_vec()
//! );
//! assert_eq!(&FrameEncoder::encode_terminal()[..], b"event: end\r\ndata: \r\n\r\n");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod encoder;
pub mod error;
pub mod frame;
pub mod parser;
pub mod payload;

pub use encoder::FrameEncoder;
pub use error::{EncodeError, EncodeResult};
pub use frame::{EventId, SseFrame, SseFrameBuilder, TERMINAL_EVENT_NAME, TERMINAL_FRAME};
pub use parser::{FrameParser, ParsedEvent};
pub use payload::{EventData, Json, Payload};

/// Header names and values for event-stream responses.
pub mod headers {
    /// Content-Type header name
    pub const CONTENT_TYPE: &str = "content-type";

    /// Content-Encoding header name
    pub const CONTENT_ENCODING: &str = "content-encoding";

    /// Cache-Control header name
    pub const CACHE_CONTROL: &str = "cache-control";

    /// Content-Type for SSE streams
    pub const CONTENT_TYPE_SSE: &str = "text/event-stream";

    /// Content-Encoding that disables transport compression
    pub const ENCODING_IDENTITY: &str = "identity";

    /// Cache-Control for SSE streams
    pub const NO_CACHE: &str = "no-cache";
}

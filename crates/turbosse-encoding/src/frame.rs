//! The logical SSE event model.
//!
//! An [`SseFrame`] is one event as it will appear on the wire: an optional id,
//! an optional event name and the already-stringified data. Turning a caller's
//! value into the data bytes is the job of [`crate::payload::EventData`].

use core::fmt;

use bytes::Bytes;

/// Event name carried by the terminal frame.
pub const TERMINAL_EVENT_NAME: &str = "end";

/// Exact wire bytes of the terminal frame.
pub const TERMINAL_FRAME: &[u8] = b"event: end\r\ndata: \r\n\r\n";

/// Identifier written on the `id:` line of a frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventId {
    /// Numeric id, rendered in decimal
    Number(u64),
    /// Textual id, rendered verbatim
    Text(String),
}

impl EventId {
    /// Numeric value of this id, if it is numeric.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Returns `true` if the id contains a line break, which would split the
    /// `id:` field on the wire.
    pub fn has_line_break(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(s) => s.contains(['\r', '\n']),
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for EventId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for EventId {
    fn from(value: u32) -> Self {
        Self::Number(u64::from(value))
    }
}

impl From<usize> for EventId {
    fn from(value: usize) -> Self {
        Self::Number(value as u64)
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// A single Server-Sent Event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SseFrame {
    /// Event id; `None` omits the `id:` line
    pub id: Option<EventId>,
    /// Event name; `None` omits the `event:` line
    pub event: Option<String>,
    /// Stringified payload, written verbatim after `data: `
    pub data: Bytes,
}

impl SseFrame {
    /// Create a frame with only data.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            id: None,
            event: None,
            data: data.into(),
        }
    }

    /// Create a frame with an id and data.
    pub fn with_id(id: impl Into<EventId>, data: impl Into<Bytes>) -> Self {
        Self {
            id: Some(id.into()),
            event: None,
            data: data.into(),
        }
    }

    /// The terminal frame: `event: end` with empty data and no id.
    pub fn terminal() -> Self {
        Self {
            id: None,
            event: Some(TERMINAL_EVENT_NAME.to_owned()),
            data: Bytes::new(),
        }
    }

    /// Create a builder for frames with several optional fields.
    pub fn builder() -> SseFrameBuilder {
        SseFrameBuilder::new()
    }

    /// Returns `true` if this is the terminal frame.
    pub fn is_terminal(&self) -> bool {
        self.id.is_none()
            && self.event.as_deref() == Some(TERMINAL_EVENT_NAME)
            && self.data.is_empty()
    }
}

/// Builder for [`SseFrame`].
#[derive(Default)]
pub struct SseFrameBuilder {
    id: Option<EventId>,
    event: Option<String>,
    data: Option<Bytes>,
}

impl SseFrameBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event id.
    pub fn id(mut self, id: impl Into<EventId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set or clear the event id.
    pub fn maybe_id(mut self, id: Option<EventId>) -> Self {
        self.id = id;
        self
    }

    /// Set the event name.
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Set or clear the event name.
    pub fn maybe_event(mut self, event: Option<String>) -> Self {
        self.event = event;
        self
    }

    /// Set the event data.
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Build the frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EncodeError::MissingData`] if no data was set.
    pub fn build(self) -> crate::EncodeResult<SseFrame> {
        self.try_build().ok_or(crate::EncodeError::MissingData)
    }

    /// Try to build the frame.
    ///
    /// Returns `None` if data is not set.
    pub fn try_build(self) -> Option<SseFrame> {
        Some(SseFrame {
            id: self.id,
            event: self.event,
            data: self.data?,
        })
    }
}

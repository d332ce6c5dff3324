//! Incremental decoder for the `text/event-stream` wire format.
//!
//! Accepts both CRLF and bare LF line endings. Intended for clients reading an
//! event stream and for asserting on emitted bodies in tests.

/// An event decoded from the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedEvent {
    /// Value of the last `id:` line, if any
    pub id: Option<String>,
    /// Value of the `event:` line, if any
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
}

impl ParsedEvent {
    /// Returns `true` for the terminal `event: end` frame.
    pub fn is_terminal(&self) -> bool {
        self.id.is_none()
            && self.event.as_deref() == Some(crate::TERMINAL_EVENT_NAME)
            && self.data.is_empty()
    }
}

/// SSE parser for decoding events from wire format.
#[derive(Debug, Default)]
pub struct FrameParser {
    buffer: Vec<u8>,
    current_id: Option<String>,
    current_event: Option<String>,
    current_data: Vec<String>,
    last_id: Option<String>,
}

impl FrameParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes to the parser and return any events completed by them.
    pub fn feed(&mut self, data: &[u8]) -> Vec<ParsedEvent> {
        self.buffer.extend_from_slice(data);

        let mut events = Vec::new();
        let mut consumed = 0;

        while let Some(offset) = self.buffer[consumed..].iter().position(|&b| b == b'\n') {
            let end = consumed + offset;
            let mut line = &self.buffer[consumed..end];
            if let [rest @ .., b'\r'] = line {
                line = rest;
            }
            let line = String::from_utf8_lossy(line).into_owned();
            consumed = end + 1;

            if line.is_empty() {
                if let Some(event) = self.emit_event() {
                    events.push(event);
                }
            } else {
                self.handle_line(&line);
            }
        }

        self.buffer.drain(..consumed);
        events
    }

    fn handle_line(&mut self, line: &str) {
        if line.starts_with(':') {
            // Comment
            return;
        }

        let (field, value) = match line.find(':') {
            Some(pos) => {
                let value = &line[pos + 1..];
                (&line[..pos], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };

        match field {
            "id" => self.current_id = Some(value.to_owned()),
            "event" => self.current_event = Some(value.to_owned()),
            "data" => self.current_data.push(value.to_owned()),
            _ => {} // Unknown field, ignore
        }
    }

    fn emit_event(&mut self) -> Option<ParsedEvent> {
        if self.current_data.is_empty() && self.current_event.is_none() {
            self.current_id = None;
            return None;
        }

        if self.current_id.is_some() {
            self.last_id.clone_from(&self.current_id);
        }

        let event = ParsedEvent {
            id: self.current_id.take(),
            event: self.current_event.take(),
            data: self.current_data.join("\n"),
        };
        self.current_data.clear();

        Some(event)
    }

    /// Reset the parser state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The id of the most recent event that carried one.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    /// Decode a complete body in one call.
    pub fn parse_all(body: &[u8]) -> Vec<ParsedEvent> {
        Self::new().feed(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameEncoder, SseFrame};

    #[test]
    fn test_parse_crlf_frame() {
        let events = FrameParser::parse_all(b"id: 1\r\nevent: test\r\ndata: hello\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id.as_deref(), Some("1"));
        assert_eq!(events[0].event.as_deref(), Some("test"));
        assert_eq!(events[0].data, "hello");
    }

    #[test]
    fn test_parse_terminal_frame() {
        let events = FrameParser::parse_all(b"data: x\r\n\r\nevent: end\r\ndata: \r\n\r\n");
        assert_eq!(events.len(), 2);
        assert!(!events[0].is_terminal());
        assert!(events[1].is_terminal());
    }

    #[test]
    fn test_parse_lf_and_multiline() {
        let events = FrameParser::parse_all(b"data: line1\ndata: line2\n\n");
        assert_eq!(events[0].data, "line1\nline2");
    }

    #[test]
    fn test_parse_incremental() {
        let mut parser = FrameParser::new();
        assert!(parser.feed(b"id: 7\r").is_empty());
        assert!(parser.feed(b"\ndata: par").is_empty());
        let events = parser.feed(b"tial\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "partial");
        assert_eq!(parser.last_event_id(), Some("7"));
    }

    #[test]
    fn test_parse_ignores_comments_and_unknown_fields() {
        let events = FrameParser::parse_all(b": ping\r\nretry: 10\r\ndata: real\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "real");
    }

    #[test]
    fn test_last_event_id_survives_idless_frames() {
        let mut parser = FrameParser::new();
        parser.feed(b"id: 3\r\ndata: a\r\n\r\n");
        parser.feed(&FrameEncoder::encode(&SseFrame::terminal()));
        assert_eq!(parser.last_event_id(), Some("3"));

        parser.reset();
        assert_eq!(parser.last_event_id(), None);
    }

    #[test]
    fn test_encoder_output_decodes() {
        let frame = SseFrame::builder().id(9u64).event("e").data("d").build().unwrap();
        let events = FrameParser::parse_all(&FrameEncoder::encode(&frame));
        assert_eq!(
            events,
            vec![ParsedEvent {
                id: Some("9".into()),
                event: Some("e".into()),
                data: "d".into(),
            }]
        );
    }
}

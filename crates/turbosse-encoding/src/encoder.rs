//! Server-Sent Events wire encoding.
//!
//! Frames are rendered with CRLF line endings:
//! ```text
//! id: 1\r\n
//! event: update\r\n
//! data: {"hello":"world"}\r\n
//! \r\n
//! ```
//!
//! Fields appear in the fixed order `id`, `event`, `data`, and each optional
//! field is omitted entirely when absent. Data is written verbatim; a payload
//! containing line breaks is the caller's concern.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::EncodeResult;
use crate::frame::{EventId, SseFrame, TERMINAL_FRAME};
use crate::payload::EventData;

const CRLF: &[u8] = b"\r\n";

/// SSE encoder for converting frames to wire format.
pub struct FrameEncoder;

impl FrameEncoder {
    /// Encode a frame to bytes.
    pub fn encode(frame: &SseFrame) -> Vec<u8> {
        let mut output = BytesMut::with_capacity(Self::encoded_len(frame));
        Self::encode_into(frame, &mut output);
        output.to_vec()
    }

    /// Encode a frame into a frozen buffer.
    pub fn encode_bytes(frame: &SseFrame) -> Bytes {
        let mut output = BytesMut::with_capacity(Self::encoded_len(frame));
        Self::encode_into(frame, &mut output);
        output.freeze()
    }

    /// Append the encoding of `frame` to `output`.
    pub fn encode_into(frame: &SseFrame, output: &mut BytesMut) {
        if let Some(ref id) = frame.id {
            output.put_slice(b"id: ");
            match id {
                EventId::Number(n) => output.put_slice(n.to_string().as_bytes()),
                EventId::Text(s) => output.put_slice(s.as_bytes()),
            }
            output.put_slice(CRLF);
        }

        if let Some(ref event) = frame.event {
            output.put_slice(b"event: ");
            output.put_slice(event.as_bytes());
            output.put_slice(CRLF);
        }

        output.put_slice(b"data: ");
        output.put_slice(&frame.data);
        output.put_slice(CRLF);

        // Blank line terminates the frame
        output.put_slice(CRLF);
    }

    /// Encode a frame to a string.
    ///
    /// Invalid UTF-8 in byte payloads is replaced, so prefer [`Self::encode`]
    /// when the exact bytes matter.
    pub fn encode_string(frame: &SseFrame) -> String {
        String::from_utf8_lossy(&Self::encode(frame)).into_owned()
    }

    /// The terminal frame, `event: end` with empty data.
    pub fn encode_terminal() -> Bytes {
        Bytes::from_static(TERMINAL_FRAME)
    }

    /// Encode a comment line.
    ///
    /// Clients ignore comments, so hosts can use them as keepalives.
    pub fn encode_comment(comment: &str) -> Vec<u8> {
        let mut output = Vec::with_capacity(comment.len() + 6);
        for line in comment.lines() {
            output.extend_from_slice(b": ");
            output.extend_from_slice(line.as_bytes());
            output.extend_from_slice(CRLF);
        }
        output.extend_from_slice(CRLF);
        output
    }

    /// Stringify `value` and build a frame around it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EncodeError::Serialization`] if the value cannot be
    /// serialized.
    pub fn frame_for<D>(
        id: Option<EventId>,
        event: Option<String>,
        value: &D,
    ) -> EncodeResult<SseFrame>
    where
        D: EventData + ?Sized,
    {
        let data = value.to_payload()?.into_bytes();
        Ok(SseFrame { id, event, data })
    }

    fn encoded_len(frame: &SseFrame) -> usize {
        let id_len = frame.id.as_ref().map_or(0, |id| match id {
            EventId::Number(_) => 4 + 20 + 2,
            EventId::Text(s) => 4 + s.len() + 2,
        });
        let event_len = frame.event.as_ref().map_or(0, |e| 7 + e.len() + 2);
        id_len + event_len + 6 + frame.data.len() + 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Json;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_data_only() {
        let frame = SseFrame::new("hello");
        assert_eq!(FrameEncoder::encode_string(&frame), "data: hello\r\n\r\n");
    }

    #[test]
    fn test_encode_with_id() {
        let frame = SseFrame::with_id(1u64, "data");
        assert_eq!(FrameEncoder::encode_string(&frame), "id: 1\r\ndata: data\r\n\r\n");
    }

    #[test]
    fn test_encode_full_field_order() {
        let frame = SseFrame::builder()
            .id("evt-1")
            .event("update")
            .data("payload")
            .build()
            .unwrap();

        assert_eq!(
            FrameEncoder::encode_string(&frame),
            "id: evt-1\r\nevent: update\r\ndata: payload\r\n\r\n"
        );
    }

    #[test]
    fn test_encode_keeps_newlines_verbatim() {
        let frame = SseFrame::new("line1\nline2");
        assert_eq!(
            FrameEncoder::encode_string(&frame),
            "data: line1\nline2\r\n\r\n"
        );
    }

    #[test]
    fn test_terminal_frame() {
        assert_eq!(&FrameEncoder::encode_terminal()[..], b"event: end\r\ndata: \r\n\r\n");
        assert_eq!(
            FrameEncoder::encode(&SseFrame::terminal()),
            FrameEncoder::encode_terminal().to_vec()
        );
    }

    #[test]
    fn test_encode_is_idempotent() {
        let frame = SseFrame::builder().id(42u64).event("tick").data("x").build().unwrap();
        assert_eq!(FrameEncoder::encode(&frame), FrameEncoder::encode(&frame));
        assert_eq!(FrameEncoder::encode(&frame), FrameEncoder::encode_bytes(&frame).to_vec());
    }

    #[test]
    fn test_encode_into_appends() {
        let mut buf = BytesMut::new();
        FrameEncoder::encode_into(&SseFrame::with_id(1u64, "a"), &mut buf);
        FrameEncoder::encode_into(&SseFrame::terminal(), &mut buf);
        assert_eq!(&buf[..], b"id: 1\r\ndata: a\r\n\r\nevent: end\r\ndata: \r\n\r\n");
    }

    #[test]
    fn test_encode_comment() {
        assert_eq!(FrameEncoder::encode_comment("keepalive"), b": keepalive\r\n\r\n");
    }

    #[test]
    fn test_frame_for_structured_value() {
        #[derive(serde::Serialize)]
        struct Greeting {
            hello: &'static str,
        }

        let value = Json(Greeting { hello: "world" });
        let frame = FrameEncoder::frame_for(Some(EventId::Number(1)), None, &value).unwrap();
        assert_eq!(
            FrameEncoder::encode_string(&frame),
            "id: 1\r\ndata: {\"hello\":\"world\"}\r\n\r\n"
        );
    }

    #[test]
    fn test_frame_for_raw_bytes() {
        let frame = FrameEncoder::frame_for(None, Some("bin".into()), &[0xffu8, 0x00][..]).unwrap();
        assert_eq!(
            FrameEncoder::encode(&frame),
            b"event: bin\r\ndata: \xff\x00\r\n\r\n".to_vec()
        );
    }
}

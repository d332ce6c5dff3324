//! Per-response emission state.

use bytes::Bytes;
use turbosse_encoding::{EncodeError, EncodeResult, EventData, EventId, FrameEncoder, SseFrame};

use crate::config::EmitConfig;
use crate::policy::{EventNamePolicy, IdPolicy};

/// State owned by one response: the policies and the auto-id counter.
///
/// The counter starts at 1 and advances only when an auto id is assigned.
#[derive(Debug)]
pub struct EmissionSession<T> {
    id: IdPolicy<T>,
    event: EventNamePolicy<T>,
    next_id: u64,
}

impl<T: EventData> EmissionSession<T> {
    /// Start a session with the given configuration.
    pub fn new(config: &EmitConfig<T>) -> Self {
        Self {
            id: config.id.clone(),
            event: config.event.clone(),
            next_id: 1,
        }
    }

    /// The id the next auto-ided frame will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Derive the id for `value`, advancing the counter for auto ids.
    ///
    /// An empty derived id is treated as no id, so the `id:` line is omitted.
    pub fn derive_id(&mut self, value: &T) -> Option<EventId> {
        match &self.id {
            IdPolicy::Auto => {
                let id = self.next_id;
                self.next_id += 1;
                Some(EventId::Number(id))
            }
            IdPolicy::Suppressed => None,
            IdPolicy::Derived(f) => {
                f(value).filter(|id| !matches!(id, EventId::Text(s) if s.is_empty()))
            }
        }
    }

    /// Derive the event name for `value`. An empty derived name means none.
    pub fn derive_event(&self, value: &T) -> Option<String> {
        match &self.event {
            EventNamePolicy::None => None,
            EventNamePolicy::Static(name) => Some(name.clone()),
            EventNamePolicy::Derived(f) => f(value).filter(|name| !name.is_empty()),
        }
    }

    /// Encode `value` as a complete frame.
    ///
    /// The payload is stringified first, so a value that fails to serialize
    /// never consumes an auto id.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized, or if a derived id
    /// or event name contains a line break.
    pub fn encode(&mut self, value: &T) -> EncodeResult<Bytes> {
        let data = value.to_payload()?.into_bytes();

        let event = self.derive_event(value);
        if event.as_deref().is_some_and(|e| e.contains(['\r', '\n'])) {
            return Err(EncodeError::LineBreak { field: "event" });
        }

        let id = self.derive_id(value);
        if id.as_ref().is_some_and(EventId::has_line_break) {
            return Err(EncodeError::LineBreak { field: "id" });
        }

        let frame = SseFrame::builder()
            .maybe_id(id)
            .maybe_event(event)
            .data(data)
            .build()?;
        Ok(FrameEncoder::encode_bytes(&frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encode_all(session: &mut EmissionSession<String>, values: &[&str]) -> String {
        values
            .iter()
            .map(|v| {
                let frame = session.encode(&(*v).to_owned()).unwrap();
                String::from_utf8(frame.to_vec()).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_auto_ids_start_at_one() {
        let mut session = EmissionSession::new(&EmitConfig::<String>::default());
        assert_eq!(session.next_id(), 1);
        assert_eq!(
            encode_all(&mut session, &["a", "b"]),
            "id: 1\r\ndata: a\r\n\r\nid: 2\r\ndata: b\r\n\r\n"
        );
        assert_eq!(session.next_id(), 3);
    }

    #[test]
    fn test_suppressed_ids_do_not_advance() {
        let mut session = EmissionSession::new(&EmitConfig::<String>::new().without_ids());
        assert_eq!(encode_all(&mut session, &["a"]), "data: a\r\n\r\n");
        assert_eq!(session.next_id(), 1);
    }

    #[test]
    fn test_derived_ids_do_not_touch_counter() {
        let config =
            EmitConfig::<String>::new().with_id_generator(|v: &String| (v != "skip").then(|| v.len() as u64));
        let mut session = EmissionSession::new(&config);
        assert_eq!(
            encode_all(&mut session, &["abc", "skip"]),
            "id: 3\r\ndata: abc\r\n\r\ndata: skip\r\n\r\n"
        );
        assert_eq!(session.next_id(), 1);
    }

    #[test]
    fn test_event_policies() {
        let mut session = EmissionSession::new(&EmitConfig::<String>::new().with_event("test"));
        assert_eq!(session.derive_event(&"x".to_owned()).as_deref(), Some("test"));

        let config = EmitConfig::<String>::new()
            .with_event_fn(|v: &String| v.strip_prefix("evt:").map(str::to_owned));
        session = EmissionSession::new(&config);
        assert_eq!(session.derive_event(&"evt:ping".to_owned()).as_deref(), Some("ping"));
        assert_eq!(session.derive_event(&"plain".to_owned()), None);
    }

    #[test]
    fn test_empty_derived_fields_are_omitted() {
        let config = EmitConfig::<String>::new()
            .with_id_generator(|_: &String| Some(""))
            .with_event_fn(|_: &String| Some(""));
        let mut session = EmissionSession::new(&config);
        assert_eq!(encode_all(&mut session, &["x"]), "data: x\r\n\r\n");
    }

    #[test]
    fn test_explicit_id_policy() {
        let policy = IdPolicy::derived(|v: &String| v.parse::<u64>().ok());
        let mut session = EmissionSession::new(&EmitConfig::new().with_id_policy(policy));
        assert_eq!(session.derive_id(&"7".to_owned()).and_then(|id| id.as_number()), Some(7));
        assert_eq!(session.derive_id(&"seven".to_owned()), None);
    }

    #[test]
    fn test_derived_line_breaks_are_rejected() {
        let config = EmitConfig::<String>::new().with_event_fn(|v: &String| Some(v.clone()));
        let mut session = EmissionSession::new(&config);
        assert_eq!(
            session.encode(&"bad\nname".to_owned()),
            Err(EncodeError::LineBreak { field: "event" })
        );

        let config = EmitConfig::<String>::new().with_id_generator(|v: &String| Some(v.clone()));
        let mut session = EmissionSession::new(&config);
        assert_eq!(
            session.encode(&"1\r\n".to_owned()),
            Err(EncodeError::LineBreak { field: "id" })
        );
    }
}

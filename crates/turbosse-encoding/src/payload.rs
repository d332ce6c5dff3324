//! Payload stringification.
//!
//! Text and byte payloads are written verbatim. Structured payloads are
//! serialized to compact JSON before framing. Implement [`EventData`] for your
//! own types, or wrap any `Serialize` type in [`Json`].

use std::borrow::Cow;

use bytes::Bytes;
use serde::Serialize;

use crate::error::EncodeResult;

/// Stringified form of a value, ready to be placed after `data: `.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload<'a> {
    /// UTF-8 text
    Text(Cow<'a, str>),
    /// Raw bytes (written as-is)
    Bytes(Cow<'a, [u8]>),
}

impl Payload<'_> {
    /// Borrow the payload as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Bytes(b) => b,
        }
    }

    /// Convert into an owned byte buffer.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Text(Cow::Borrowed(s)) => Bytes::copy_from_slice(s.as_bytes()),
            Self::Text(Cow::Owned(s)) => Bytes::from(s),
            Self::Bytes(Cow::Borrowed(b)) => Bytes::copy_from_slice(b),
            Self::Bytes(Cow::Owned(b)) => Bytes::from(b),
        }
    }
}

/// A value that can be carried in the `data:` field of an event.
pub trait EventData {
    /// Stringify this value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EncodeError::Serialization`] if a structured value
    /// cannot be serialized.
    fn to_payload(&self) -> EncodeResult<Payload<'_>>;
}

impl<T: EventData + ?Sized> EventData for &T {
    fn to_payload(&self) -> EncodeResult<Payload<'_>> {
        (**self).to_payload()
    }
}

impl EventData for str {
    fn to_payload(&self) -> EncodeResult<Payload<'_>> {
        Ok(Payload::Text(Cow::Borrowed(self)))
    }
}

impl EventData for String {
    fn to_payload(&self) -> EncodeResult<Payload<'_>> {
        Ok(Payload::Text(Cow::Borrowed(self.as_str())))
    }
}

impl EventData for Box<str> {
    fn to_payload(&self) -> EncodeResult<Payload<'_>> {
        Ok(Payload::Text(Cow::Borrowed(self)))
    }
}

impl EventData for Cow<'_, str> {
    fn to_payload(&self) -> EncodeResult<Payload<'_>> {
        Ok(Payload::Text(Cow::Borrowed(self.as_ref())))
    }
}

impl EventData for [u8] {
    fn to_payload(&self) -> EncodeResult<Payload<'_>> {
        Ok(Payload::Bytes(Cow::Borrowed(self)))
    }
}

impl EventData for Vec<u8> {
    fn to_payload(&self) -> EncodeResult<Payload<'_>> {
        Ok(Payload::Bytes(Cow::Borrowed(self.as_slice())))
    }
}

impl EventData for Bytes {
    fn to_payload(&self) -> EncodeResult<Payload<'_>> {
        Ok(Payload::Bytes(Cow::Borrowed(self.as_ref())))
    }
}

impl EventData for serde_json::Value {
    fn to_payload(&self) -> EncodeResult<Payload<'_>> {
        Ok(Payload::Text(Cow::Owned(serde_json::to_string(self)?)))
    }
}

/// Wrapper that serializes any `Serialize` value as compact JSON.
///
/// ```rust
/// use serde::Serialize;
/// use turbosse_encoding::{EventData, Json};
///
/// #[derive(Serialize)]
/// struct Greeting {
///     hello: &'static str,
/// }
///
/// let greeting = Json(Greeting { hello: "world" });
/// let payload = greeting.to_payload().unwrap();
/// assert_eq!(payload.as_bytes(), br#"{"hello":"world"}"#);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwrap the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Serialize> EventData for Json<T> {
    fn to_payload(&self) -> EncodeResult<Payload<'_>> {
        Ok(Payload::Bytes(Cow::Owned(serde_json::to_vec(&self.0)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EncodeError;
    use std::collections::BTreeMap;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cyclic structure"))
        }
    }

    #[test]
    fn test_text_is_verbatim() {
        let payload = "hello: world".to_payload().unwrap();
        assert_eq!(payload.as_bytes(), b"hello: world");
        assert!(matches!(payload, Payload::Text(Cow::Borrowed(_))));
    }

    #[test]
    fn test_bytes_are_verbatim() {
        let data = Bytes::from_static(b"\x00raw");
        assert_eq!(data.to_payload().unwrap().as_bytes(), b"\x00raw");
        assert_eq!(vec![1u8, 2, 3].to_payload().unwrap().as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_json_value_is_compact() {
        let value = serde_json::json!({"hello": "world", "num": 4});
        let payload = value.to_payload().unwrap();
        assert_eq!(payload.as_bytes(), br#"{"hello":"world","num":4}"#);
    }

    #[test]
    fn test_json_wrapper_follows_serializer_order() {
        let mut map = BTreeMap::new();
        map.insert("b", 2);
        map.insert("a", 1);
        let wrapped = Json(map);
        let payload = wrapped.to_payload().unwrap();
        assert_eq!(payload.as_bytes(), br#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_json_string_is_quoted() {
        // Wrapping text in Json opts into serialization rather than verbatim output
        let text = Json("text");
        let payload = text.to_payload().unwrap();
        assert_eq!(payload.as_bytes(), br#""text""#);
    }

    #[test]
    fn test_serialization_failure_is_an_error() {
        let err = Json(Unserializable).to_payload().unwrap_err();
        assert!(matches!(err, EncodeError::Serialization(msg) if msg.contains("cyclic")));
    }

    #[test]
    fn test_non_string_map_keys_fail() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], "value");
        assert!(Json(map).to_payload().is_err());
    }

    #[test]
    fn test_into_bytes() {
        assert_eq!(
            "abc".to_payload().unwrap().into_bytes(),
            Bytes::from_static(b"abc")
        );
    }
}

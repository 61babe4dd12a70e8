//! ## herald-protocol::message
//! **Broker message: filterable headers plus a text body**
//!
//! Headers are what a broker selector can see. The body carries the
//! marshalled property set and is opaque to the broker.

use bytes::Bytes;

use crate::codec::CodecError;
use crate::property::{PropertySet, Value};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Message {
    headers: PropertySet,
    body: Bytes,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let mut message = Self::new();
        message.set_text(text);
        message
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.headers.set(name, value);
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.headers.get(name)
    }

    pub fn string_property(&self, name: &str) -> Option<&str> {
        self.headers.get_string(name)
    }

    pub fn long_property(&self, name: &str) -> Option<i64> {
        self.headers.get(name).and_then(Value::as_i64)
    }

    pub fn headers(&self) -> &PropertySet {
        &self.headers
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.body = Bytes::from(text.into());
    }

    /// Replaces the body with raw bytes. Decoding rejects non-UTF-8 bodies.
    pub fn set_payload(&mut self, payload: Bytes) {
        self.body = payload;
    }

    pub fn payload(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> Result<&str, CodecError> {
        std::str::from_utf8(&self.body).map_err(|_| CodecError::NotUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_and_text_are_independent() {
        let mut message = Message::with_text("nodelist||nodelist||0~~");
        message.set_property("TOPIC", "status");
        message.set_property("PUBTIME", 42_i64);

        assert_eq!(message.string_property("TOPIC"), Some("status"));
        assert_eq!(message.long_property("PUBTIME"), Some(42));
        assert_eq!(message.text().unwrap(), "nodelist||nodelist||0~~");
        assert_eq!(message.headers().len(), 2);
    }

    #[test]
    fn clone_shares_body_but_not_headers() {
        let mut original = Message::with_text("body");
        original.set_property("A", 1);
        let mut copy = original.clone();
        copy.set_property("A", 2);
        assert_eq!(original.long_property("A"), Some(1));
        assert_eq!(copy.payload(), original.payload());
    }

    #[test]
    fn binary_body_is_not_text() {
        let mut message = Message::new();
        message.set_payload(Bytes::from_static(&[0xc3, 0x28]));
        assert_eq!(message.text(), Err(CodecError::NotUtf8));
    }
}

//! # Herald Protocol
//!
//! Crate for the property-set data model and the delimited text wire format
//! that event payloads travel in.

pub mod codec;
pub mod message;
pub mod property;

pub use codec::{marshall, unmarshall, CodecError, CodecWarning, Encoded, PropertyCodec};
pub use message::Message;
pub use property::{PropertyError, PropertySet, Value, ValueKind};

//! ## herald-protocol::codec
//! **Delimited text encoding for property sets**
//!
//! A payload is a run of records terminated by `~~`. Every record is three
//! fields joined by `||`: `type||name||value`. The first record is a count
//! header, `nodelist||nodelist||<N>`, where `N` is the number of value
//! records that follow:
//!
//! ```text
//! nodelist||nodelist||3~~string||DATAID||exp001~~int||LOOPNUM||3~~double||EXPTIME||12.5~~
//! ```
//!
//! Values are not escaped. A string containing `||` survives decoding
//! because everything after the second delimiter is taken verbatim. A
//! string containing `~~`, or ending in `~` (which would merge with the
//! record terminator), cannot be represented; the encoder skips such values
//! and reports them. Property names may not contain either delimiter.
//!
//! The count header is advisory; decoding runs until the input is exhausted.

use std::fmt::Write;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

use crate::property::{PropertyError, PropertySet, Value, ValueKind};

pub const RECORD_DELIMITER: &str = "~~";
pub const FIELD_DELIMITER: &str = "||";
pub const NODELIST: &str = "nodelist";

pub const TAG_BOOL: &str = "bool";
pub const TAG_INT: &str = "int";
pub const TAG_LONG: &str = "long";
pub const TAG_LONG_LONG: &str = "long long";
pub const TAG_FLOAT: &str = "float";
pub const TAG_DOUBLE: &str = "double";
pub const TAG_STRING: &str = "string";
pub const TAG_DATETIME: &str = "datetime";

/// Decode failures. Every variant means the payload is malformed and the
/// whole decode was abandoned.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CodecError {
    #[error("Malformed payload: record {record} does not have type, name and value fields: {text:?}")]
    MissingFields { record: usize, text: String },
    #[error("Malformed payload: record {record} ('{name}') value {value:?} is not a valid {tag}")]
    InvalidValue {
        record: usize,
        name: String,
        tag: String,
        value: String,
    },
    #[error("Malformed payload: record {record} conflicts with earlier values: {source}")]
    Conflict {
        record: usize,
        #[source]
        source: PropertyError,
    },
    #[error("Malformed payload: body is not valid UTF-8")]
    NotUtf8,
}

/// Non-fatal conditions reported while encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodecWarning {
    /// The property's kind has no wire tag; it was left out of the payload.
    UnsupportedPropertyType { name: String, kind: ValueKind },
    /// The name contains a delimiter; the whole property was left out.
    UnencodableName { name: String },
    /// A string value would split or merge records; that value was left out.
    UnencodableValue { name: String, value: String },
}

/// Result of encoding a property set.
#[derive(Clone, Debug, PartialEq)]
pub struct Encoded {
    pub payload: String,
    /// Number of value records written (the `N` of the count header).
    pub records: usize,
    pub skipped: Vec<CodecWarning>,
}

/// Stateless encoder/decoder for the delimited wire format.
#[derive(Default, Debug, Copy, Clone)]
pub struct PropertyCodec;

impl PropertyCodec {
    pub fn new() -> Self {
        Self
    }

    /// Wire tag for a value kind, `None` when the kind cannot be marshalled.
    pub fn tag_for(kind: ValueKind) -> Option<&'static str> {
        match kind {
            ValueKind::Bool => Some(TAG_BOOL),
            ValueKind::Int => Some(TAG_INT),
            ValueKind::Long => Some(TAG_LONG_LONG),
            ValueKind::Float => Some(TAG_FLOAT),
            ValueKind::Double => Some(TAG_DOUBLE),
            ValueKind::String => Some(TAG_STRING),
            ValueKind::DateTime => Some(TAG_DATETIME),
            ValueKind::Short => None,
        }
    }

    /// Encodes every property of `properties`. Properties of a kind without
    /// a wire tag, and values the format cannot carry, are skipped and
    /// reported in [`Encoded::skipped`].
    pub fn encode(&self, properties: &PropertySet) -> Encoded {
        let mut body = String::new();
        let mut records = 0;
        let mut skipped = Vec::new();

        for (name, values) in properties.iter() {
            if !fits_name(name) {
                warn!(property = name, "Couldn't marshall property, name contains a delimiter");
                skipped.push(CodecWarning::UnencodableName {
                    name: name.to_string(),
                });
                continue;
            }
            let kind = values[0].kind();
            let Some(tag) = Self::tag_for(kind) else {
                warn!(property = name, %kind, "Couldn't marshall property, type has no wire tag");
                skipped.push(CodecWarning::UnsupportedPropertyType {
                    name: name.to_string(),
                    kind,
                });
                continue;
            };
            for value in values {
                if let Value::String(text) = value {
                    if !fits_record(text) {
                        warn!(
                            property = name,
                            "Couldn't marshall string value, it would break the record"
                        );
                        skipped.push(CodecWarning::UnencodableValue {
                            name: name.to_string(),
                            value: text.clone(),
                        });
                        continue;
                    }
                }
                write_record(&mut body, tag, name, value);
                records += 1;
            }
        }

        let mut payload = String::with_capacity(body.len() + 32);
        let _ = write!(
            payload,
            "{NODELIST}{FIELD_DELIMITER}{NODELIST}{FIELD_DELIMITER}{records}{RECORD_DELIMITER}"
        );
        payload.push_str(&body);

        Encoded {
            payload,
            records,
            skipped,
        }
    }

    /// Decodes a payload back into a property set.
    ///
    /// Records with unknown type tags are ignored. Any record that is
    /// missing fields or carries an unparsable value aborts the decode.
    pub fn decode(&self, payload: &str) -> Result<PropertySet, CodecError> {
        let mut properties = PropertySet::new();

        for (record, text) in payload
            .split(RECORD_DELIMITER)
            .filter(|r| !r.is_empty())
            .enumerate()
        {
            let (tag, name, raw) = split_record(text).ok_or_else(|| CodecError::MissingFields {
                record,
                text: text.to_string(),
            })?;

            let value = match tag {
                NODELIST => continue,
                TAG_BOOL => parse_bool(raw).map(Value::Bool),
                TAG_INT => parse_number(raw).map(Value::Int),
                TAG_LONG | TAG_LONG_LONG => parse_number(raw).map(Value::Long),
                TAG_FLOAT => parse_number(raw).map(Value::Float),
                TAG_DOUBLE => parse_number(raw).map(Value::Double),
                TAG_STRING => Some(Value::String(raw.to_string())),
                TAG_DATETIME => parse_number(raw).map(Value::DateTime),
                unknown => {
                    debug!(tag = unknown, property = name, "Ignoring record with unknown type tag");
                    continue;
                }
            };

            let value = value.ok_or_else(|| CodecError::InvalidValue {
                record,
                name: name.to_string(),
                tag: tag.to_string(),
                value: raw.to_string(),
            })?;

            properties
                .add(name, value)
                .map_err(|source| CodecError::Conflict { record, source })?;
        }

        Ok(properties)
    }

    /// Decodes a raw message body, rejecting bodies that are not UTF-8.
    pub fn decode_bytes(&self, payload: &[u8]) -> Result<PropertySet, CodecError> {
        let text = std::str::from_utf8(payload).map_err(|_| CodecError::NotUtf8)?;
        self.decode(text)
    }
}

/// Encodes `properties` and returns only the payload text.
pub fn marshall(properties: &PropertySet) -> String {
    PropertyCodec::new().encode(properties).payload
}

pub fn unmarshall(payload: &str) -> Result<PropertySet, CodecError> {
    PropertyCodec::new().decode(payload)
}

fn write_record(out: &mut String, tag: &str, name: &str, value: &Value) {
    let _ = write!(out, "{tag}{FIELD_DELIMITER}{name}{FIELD_DELIMITER}");
    match value {
        Value::Bool(v) => out.push(if *v { '1' } else { '0' }),
        // Display for floats is the shortest text that parses back exactly.
        other => {
            let _ = write!(out, "{other}");
        }
    }
    out.push_str(RECORD_DELIMITER);
}

// A trailing '|' would join the following field delimiter.
fn fits_name(name: &str) -> bool {
    !name.contains(FIELD_DELIMITER) && !name.contains(RECORD_DELIMITER) && !name.ends_with('|')
}

/// The value must not contain the record terminator nor end with half of it.
fn fits_record(text: &str) -> bool {
    !text.contains(RECORD_DELIMITER) && !text.ends_with('~')
}

/// Splits on the first two field delimiters; the value keeps any later ones.
fn split_record(text: &str) -> Option<(&str, &str, &str)> {
    let (tag, rest) = text.split_once(FIELD_DELIMITER)?;
    let (name, value) = rest.split_once(FIELD_DELIMITER)?;
    Some((tag, name, value))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

fn parse_number<T: FromStr>(raw: &str) -> Option<T> {
    raw.parse().ok()
}

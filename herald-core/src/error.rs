use herald_protocol::CodecError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    /// Caller data cannot form a valid event (a reserved key has the wrong kind).
    #[error("Invalid property set: {0}")]
    InvalidPropertySet(String),

    #[error(transparent)]
    MalformedPayload(#[from] CodecError),

    /// A reserved key that construction guarantees is missing or mistyped.
    #[error("Internal invariant violated: reserved key {0} is missing or mistyped")]
    InternalInvariantViolation(&'static str),
}

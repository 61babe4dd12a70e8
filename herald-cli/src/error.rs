use herald_protocol::PropertyError;
use thiserror::Error;

/// Problems with command line input, reported before any event is built.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Property '{0}' must look like NAME=TYPE:VALUE")]
    PropertySyntax(String),

    #[error("Unknown property type '{kind}' for '{name}'")]
    UnknownType { name: String, kind: String },

    #[error("Cannot read '{value}' as {kind} for '{name}'")]
    BadValue {
        name: String,
        kind: String,
        value: String,
    },

    #[error(transparent)]
    Property(#[from] PropertyError),
}

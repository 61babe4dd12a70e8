use herald_config::ConfigError;
use herald_core::EventError;
use thiserror::Error;

/// Failures of the broker collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("Destination '{0}' is full")]
    Full(String),

    #[error("Destination '{0}' is disconnected")]
    Disconnected(String),

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Queue '{0}' does not support selectors")]
    SelectorUnsupported(String),
}

#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Destination '{0}' is already registered")]
    DuplicateRegistration(String),

    #[error("No transmitter or receiver registered for '{0}'")]
    NotRegistered(String),
}

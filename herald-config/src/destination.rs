//! Publisher and subscriber endpoints.
//!
//! A topic fans every message out to all of its receivers. A queue hands
//! each message to exactly one receiver.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    #[default]
    Topic,
    Queue,
}

/// An endpoint that publishes events.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct TransmitterConfig {
    #[validate(custom(function = validation::validate_destination))]
    pub destination: String,

    #[serde(default)]
    pub kind: DestinationKind,

    /// Publishing becomes a no-op; useful to silence a noisy stage.
    #[serde(default)]
    pub turn_events_off: bool,
}

/// An endpoint that receives events.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct ReceiverConfig {
    #[validate(custom(function = validation::validate_destination))]
    pub destination: String,

    #[serde(default)]
    pub kind: DestinationKind,

    /// Equality selector over header properties, empty for everything.
    #[serde(default)]
    #[validate(custom(function = validation::validate_selector))]
    pub selector: String,

    /// Default wait in milliseconds; -1 blocks.
    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = -1))]
    pub timeout_ms: i64,
}

fn default_timeout_ms() -> i64 {
    1000
}

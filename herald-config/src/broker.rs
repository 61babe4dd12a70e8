//! In-process broker sizing.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct BrokerConfig {
    /// Messages buffered per topic subscription or queue. A full queue
    /// rejects the publish, a full subscription drops the message. Zero
    /// means unbounded.
    #[serde(default = "default_capacity")]
    #[validate(range(max = 1048576))]
    pub capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    4096
}

//! Observability configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    #[validate(length(min = 1))]
    pub log_filter: String,

    /// Count published/received events in a prometheus registry.
    #[serde(default = "default_true")]
    pub metrics: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            metrics: true,
        }
    }
}

fn default_log_filter() -> String {
    "info".into()
}

fn default_true() -> bool {
    true
}

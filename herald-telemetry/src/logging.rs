//! ## herald-telemetry::logging
//! **`tracing` subscriber setup and event traffic records**
//!
//! `RUST_LOG` wins over the configured default filter.

use tracing::{debug, debug_span};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global fmt subscriber. Fails if one is already set.
    pub fn init(default_filter: &str) -> Result<(), InitError> {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(default_filter)),
            )
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
    }

    /// One line per event crossing the broker boundary.
    #[inline]
    pub fn log_event(direction: &str, destination: &str, type_name: &str) {
        let span = debug_span!("herald_event", direction, destination);
        let _guard = span.enter();
        debug!(type_name, "Event {direction}");
    }
}

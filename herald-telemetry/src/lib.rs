//! # Herald Telemetry
//!
//! Crate for logging setup and event-traffic metrics.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;

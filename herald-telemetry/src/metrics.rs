//! ## herald-telemetry::metrics
//! **Prometheus counters for event traffic**

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    /// Published events, labelled by destination.
    pub published_events: IntCounterVec,
    /// Received events, labelled by destination.
    pub received_events: IntCounterVec,
    pub decode_failures: IntCounter,
    pub skipped_properties: IntCounter,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let published_events = IntCounterVec::new(
            Opts::new("herald_events_published_total", "Events handed to the broker"),
            &["destination"],
        )?;
        let received_events = IntCounterVec::new(
            Opts::new("herald_events_received_total", "Events rebuilt from broker messages"),
            &["destination"],
        )?;
        let decode_failures = IntCounter::new(
            "herald_decode_failures_total",
            "Messages whose payload could not be decoded",
        )?;
        let skipped_properties = IntCounter::new(
            "herald_skipped_properties_total",
            "Properties left out of a payload for lack of a wire tag",
        )?;

        registry.register(Box::new(published_events.clone()))?;
        registry.register(Box::new(received_events.clone()))?;
        registry.register(Box::new(decode_failures.clone()))?;
        registry.register(Box::new(skipped_properties.clone()))?;

        Ok(Self {
            registry,
            published_events,
            received_events,
            decode_failures,
            skipped_properties,
        })
    }

    /// Text exposition format of everything registered.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }

    pub fn inc_published(&self, destination: &str) {
        self.published_events.with_label_values(&[destination]).inc();
    }

    pub fn inc_received(&self, destination: &str) {
        self.received_events.with_label_values(&[destination]).inc();
    }

    pub fn inc_decode_failures(&self) {
        self.decode_failures.inc();
    }

    pub fn add_skipped_properties(&self, count: usize) {
        self.skipped_properties.inc_by(count as u64);
    }
}

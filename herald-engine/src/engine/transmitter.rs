//! Publishing events to a topic or queue.

use std::sync::Arc;

use tracing::{debug, instrument};

use herald_config::DestinationKind;
use herald_core::events::keywords::{PUBTIME, QUEUE, TOPIC};
use herald_core::events::Event;
use herald_core::time;
use herald_protocol::{Message, PropertySet};
use herald_telemetry::{EventLogger, MetricsRecorder};

use super::broker::Transmitter;
use super::error::SystemError;

/// Publishes events through a [`Transmitter`].
///
/// Publishing is the Unpublished → Published transition. TOPIC and PUBTIME
/// go on the outgoing headers first and are committed to the event only
/// once the broker accepted the message.
pub struct EventTransmitter {
    transmitter: Box<dyn Transmitter>,
    kind: DestinationKind,
    turn_events_off: bool,
    metrics: Option<Arc<MetricsRecorder>>,
}

/// A transmitter bound to a queue; each event reaches one consumer.
pub type EventEnqueuer = EventTransmitter;

impl EventTransmitter {
    pub fn new(transmitter: Box<dyn Transmitter>, kind: DestinationKind) -> Self {
        Self {
            transmitter,
            kind,
            turn_events_off: false,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Makes every later publish a no-op.
    pub fn turn_events_off(mut self, off: bool) -> Self {
        self.turn_events_off = off;
        self
    }

    pub fn destination(&self) -> &str {
        self.transmitter.destination()
    }

    pub fn kind(&self) -> DestinationKind {
        self.kind
    }

    #[instrument(skip_all, fields(destination = %self.destination()))]
    pub fn publish<E: AsMut<Event>>(&self, event: &mut E) -> Result<(), SystemError> {
        if self.turn_events_off {
            debug!("Events are turned off, not publishing");
            return Ok(());
        }

        let event = event.as_mut();
        let destination = self.destination().to_string();
        let pub_time = time::now_ns();

        let mut message = Message::new();
        let skipped = event.marshall(&mut message);
        message.set_property(TOPIC, destination.as_str());
        message.set_property(PUBTIME, pub_time);
        if self.kind == DestinationKind::Queue {
            message.set_property(QUEUE, destination.as_str());
        }

        self.transmitter.send(&message)?;
        event.set_topic(destination.as_str());
        event.set_pub_time(pub_time);

        if let Some(metrics) = &self.metrics {
            metrics.inc_published(&destination);
            metrics.add_skipped_properties(skipped.len());
        }
        EventLogger::log_event("published", &destination, event.type_name()?);
        Ok(())
    }

    /// Wraps `properties` in a base [`Event`] and publishes it.
    pub fn publish_properties(
        &self,
        run_id: &str,
        properties: &PropertySet,
    ) -> Result<Event, SystemError> {
        let mut event = Event::new(run_id, properties)?;
        self.publish(&mut event)?;
        Ok(event)
    }
}

//! Receiving events from a topic or queue.

use std::sync::Arc;

use tracing::{error, trace};

use herald_core::events::{AnyEvent, EventFactory};
use herald_core::EventError;
use herald_telemetry::{EventLogger, MetricsRecorder};

use super::broker::Receiver;
use super::error::SystemError;

/// Rebuilds typed events from a [`Receiver`].
pub struct EventReceiver {
    receiver: Box<dyn Receiver>,
    factory: EventFactory,
    timeout_ms: i64,
    metrics: Option<Arc<MetricsRecorder>>,
}

/// A receiver bound to a queue; competes with other dequeuers for events.
pub type EventDequeuer = EventReceiver;

impl EventReceiver {
    /// `timeout_ms` is the wait used by [`EventReceiver::receive`].
    pub fn new(receiver: Box<dyn Receiver>, timeout_ms: i64) -> Self {
        Self {
            receiver,
            factory: EventFactory::new(),
            timeout_ms,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn destination(&self) -> &str {
        self.receiver.destination()
    }

    pub fn receive(&self) -> Result<Option<AnyEvent>, SystemError> {
        self.receive_event(self.timeout_ms)
    }

    /// Waits up to `timeout_ms` (-1 blocks) for one event.
    ///
    /// A message that cannot be rebuilt is consumed and reported as
    /// `SystemError::Event`; the next call continues with the next message.
    pub fn receive_event(&self, timeout_ms: i64) -> Result<Option<AnyEvent>, SystemError> {
        let Some(message) = self.receiver.receive(timeout_ms)? else {
            trace!(destination = self.destination(), "Receive timed out");
            return Ok(None);
        };

        match self.factory.create(&message) {
            Ok(event) => {
                if let Some(metrics) = &self.metrics {
                    metrics.inc_received(self.destination());
                }
                let type_name = event.as_ref().type_name().unwrap_or("?");
                EventLogger::log_event("received", self.destination(), type_name);
                Ok(Some(event))
            }
            Err(err) => {
                if matches!(err, EventError::MalformedPayload(_)) {
                    if let Some(metrics) = &self.metrics {
                        metrics.inc_decode_failures();
                    }
                }
                Err(err.into())
            }
        }
    }

    /// Collects events until a receive times out. Messages that cannot be
    /// rebuilt are logged and skipped; broker failures end the drain.
    pub fn receive_events(&self, timeout_ms: i64) -> Result<Vec<AnyEvent>, SystemError> {
        let mut events = Vec::new();
        loop {
            match self.receive_event(timeout_ms) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => return Ok(events),
                Err(SystemError::Event(err)) => {
                    error!(destination = self.destination(), %err, "Skipping undecodable message");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

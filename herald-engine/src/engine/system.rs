//! Registry of named transmitters and receivers for one process.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use herald_config::{DestinationKind, HeraldConfig};
use herald_core::events::keywords::HOSTID;
use herald_core::events::{AnyEvent, Event};
use herald_core::host::HostInfo;
use herald_core::identity::{IdentifierAllocator, LocationId};
use herald_protocol::PropertySet;
use herald_telemetry::MetricsRecorder;

use super::broker::InMemoryBroker;
use super::error::SystemError;
use super::receiver::EventReceiver;
use super::transmitter::EventTransmitter;

/// Owns the broker handle, the identifier allocator and every endpoint
/// this process has registered, each keyed by destination name.
pub struct EventSystem {
    broker: InMemoryBroker,
    allocator: IdentifierAllocator,
    metrics: Option<Arc<MetricsRecorder>>,
    transmitters: RwLock<HashMap<String, Arc<EventTransmitter>>>,
    receivers: RwLock<HashMap<String, Arc<EventReceiver>>>,
}

impl EventSystem {
    pub fn new(broker: InMemoryBroker, host: HostInfo) -> Self {
        Self {
            broker,
            allocator: IdentifierAllocator::new(host),
            metrics: None,
            transmitters: RwLock::new(HashMap::new()),
            receivers: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds a broker, identity and endpoints from configuration.
    pub fn from_config(config: &HeraldConfig) -> Result<Self, SystemError> {
        let discovered = HostInfo::local();
        let host = HostInfo::new(
            config
                .identity
                .hostname
                .as_deref()
                .unwrap_or(discovered.hostname()),
            config.identity.ip.unwrap_or(discovered.ip()),
            discovered.pid(),
        );

        let mut system = Self::new(InMemoryBroker::new(config.broker.capacity), host);
        if config.telemetry.metrics {
            system = system.with_metrics(Arc::new(MetricsRecorder::new()?));
        }

        for tx in &config.transmitters {
            system.create_transmitter(&tx.destination, tx.kind, tx.turn_events_off)?;
        }
        for rx in &config.receivers {
            system.create_receiver(&rx.destination, rx.kind, &rx.selector, rx.timeout_ms)?;
        }
        info!(
            transmitters = config.transmitters.len(),
            receivers = config.receivers.len(),
            "Event system ready"
        );
        Ok(system)
    }

    pub fn broker(&self) -> &InMemoryBroker {
        &self.broker
    }

    pub fn host(&self) -> &HostInfo {
        self.allocator.host()
    }

    pub fn metrics(&self) -> Option<&Arc<MetricsRecorder>> {
        self.metrics.as_ref()
    }

    /// A fresh packed identity for this process.
    pub fn create_originator_id(&self) -> i64 {
        self.allocator.create_identity()
    }

    pub fn create_location_id(&self) -> LocationId {
        LocationId::new(&self.allocator)
    }

    pub fn create_transmitter(
        &self,
        destination: &str,
        kind: DestinationKind,
        turn_events_off: bool,
    ) -> Result<(), SystemError> {
        let mut transmitters = self.transmitters.write();
        if transmitters.contains_key(destination) {
            return Err(SystemError::DuplicateRegistration(destination.to_string()));
        }

        let mut transmitter =
            EventTransmitter::new(self.broker.transmitter(kind, destination), kind)
                .turn_events_off(turn_events_off);
        if let Some(metrics) = &self.metrics {
            transmitter = transmitter.with_metrics(Arc::clone(metrics));
        }
        transmitters.insert(destination.to_string(), Arc::new(transmitter));
        debug!(destination, ?kind, "Registered transmitter");
        Ok(())
    }

    pub fn create_receiver(
        &self,
        destination: &str,
        kind: DestinationKind,
        selector: &str,
        timeout_ms: i64,
    ) -> Result<(), SystemError> {
        let mut receivers = self.receivers.write();
        if receivers.contains_key(destination) {
            return Err(SystemError::DuplicateRegistration(destination.to_string()));
        }

        let mut receiver =
            EventReceiver::new(self.broker.receiver(kind, destination, selector)?, timeout_ms);
        if let Some(metrics) = &self.metrics {
            receiver = receiver.with_metrics(Arc::clone(metrics));
        }
        receivers.insert(destination.to_string(), Arc::new(receiver));
        debug!(destination, ?kind, selector, "Registered receiver");
        Ok(())
    }

    pub fn publish<E: AsMut<Event>>(
        &self,
        destination: &str,
        event: &mut E,
    ) -> Result<(), SystemError> {
        self.transmitter(destination)?.publish(event)
    }

    /// Wraps `properties` in a base event and publishes it. HOSTID
    /// defaults to this system's hostname rather than the machine's.
    pub fn publish_properties(
        &self,
        destination: &str,
        run_id: &str,
        properties: &PropertySet,
    ) -> Result<Event, SystemError> {
        let transmitter = self.transmitter(destination)?;
        if properties.exists(HOSTID) {
            return transmitter.publish_properties(run_id, properties);
        }
        let mut properties = properties.clone();
        properties.set(HOSTID, self.host().hostname());
        transmitter.publish_properties(run_id, &properties)
    }

    /// Receives with the receiver's configured timeout.
    pub fn receive(&self, destination: &str) -> Result<Option<AnyEvent>, SystemError> {
        self.receiver(destination)?.receive()
    }

    pub fn receive_with_timeout(
        &self,
        destination: &str,
        timeout_ms: i64,
    ) -> Result<Option<AnyEvent>, SystemError> {
        self.receiver(destination)?.receive_event(timeout_ms)
    }

    // The map lock is released before the caller blocks in receive.
    fn receiver(&self, destination: &str) -> Result<Arc<EventReceiver>, SystemError> {
        self.receivers
            .read()
            .get(destination)
            .cloned()
            .ok_or_else(|| SystemError::NotRegistered(destination.to_string()))
    }

    fn transmitter(&self, destination: &str) -> Result<Arc<EventTransmitter>, SystemError> {
        self.transmitters
            .read()
            .get(destination)
            .cloned()
            .ok_or_else(|| SystemError::NotRegistered(destination.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::identity::{extract_ip_id, extract_local_id, extract_process_id};
    use std::net::Ipv4Addr;

    fn system() -> EventSystem {
        EventSystem::new(
            InMemoryBroker::new(16),
            HostInfo::new("node7", Ipv4Addr::new(10, 0, 0, 7), 321),
        )
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let system = system();
        system.create_transmitter("status", DestinationKind::Topic, false).unwrap();
        assert!(matches!(
            system.create_transmitter("status", DestinationKind::Topic, false),
            Err(SystemError::DuplicateRegistration(_))
        ));
        system.create_receiver("status", DestinationKind::Topic, "", 0).unwrap();
        assert!(matches!(
            system.create_receiver("status", DestinationKind::Topic, "", 0),
            Err(SystemError::DuplicateRegistration(_))
        ));
    }

    #[test]
    fn unknown_destination_is_an_error() {
        let system = system();
        assert!(matches!(
            system.publish_properties("nowhere", "r", &PropertySet::new()),
            Err(SystemError::NotRegistered(_))
        ));
        assert!(matches!(
            system.receive("nowhere"),
            Err(SystemError::NotRegistered(_))
        ));
    }

    #[test]
    fn originator_ids_carry_host_and_increase() {
        let system = system();
        let first = system.create_originator_id();
        let second = system.create_originator_id();
        assert_eq!(extract_ip_id(first), u32::from(Ipv4Addr::new(10, 0, 0, 7)));
        assert_eq!(extract_process_id(first), 321);
        assert!(extract_local_id(second) > extract_local_id(first));
        assert_eq!(system.create_location_id().hostname(), "node7");
    }

    #[test]
    fn publish_then_receive_by_name() {
        let system = system();
        system.create_receiver("status", DestinationKind::Topic, "", 0).unwrap();
        system.create_transmitter("status", DestinationKind::Topic, false).unwrap();

        let mut ps = PropertySet::new();
        ps.set("LOOPNUM", 3);
        system.publish_properties("status", "run1", &ps).unwrap();

        let event = system.receive("status").unwrap().unwrap();
        assert_eq!(event.as_ref().properties().get_int("LOOPNUM"), Some(3));
        assert!(system.receive("status").unwrap().is_none());
    }
}

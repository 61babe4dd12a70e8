use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::thread;

use herald_config::{DestinationKind, HeraldConfig, ReceiverConfig, TransmitterConfig};
use herald_core::events::{AnyEvent, CommandEvent, LogRecord, PipelineLogEvent, StatusEvent};
use herald_core::host::HostInfo;
use herald_engine::{EventSystem, InMemoryBroker, SystemError};
use herald_protocol::PropertySet;

fn system() -> EventSystem {
    EventSystem::new(
        InMemoryBroker::new(256),
        HostInfo::new("worker3", Ipv4Addr::new(192, 168, 1, 3), 4242),
    )
}

#[test]
fn status_fans_out_to_every_topic_subscriber() {
    let broker = InMemoryBroker::new(16);
    let publisher = EventSystem::new(broker.clone(), HostInfo::new("a", Ipv4Addr::LOCALHOST, 1));
    let monitor = EventSystem::new(broker.clone(), HostInfo::new("b", Ipv4Addr::LOCALHOST, 2));
    let archiver = EventSystem::new(broker, HostInfo::new("c", Ipv4Addr::LOCALHOST, 3));

    monitor.create_receiver("stage.status", DestinationKind::Topic, "", 0).unwrap();
    archiver.create_receiver("stage.status", DestinationKind::Topic, "", 0).unwrap();
    publisher.create_transmitter("stage.status", DestinationKind::Topic, false).unwrap();

    let mut ps = PropertySet::new();
    ps.set("STAGEID", 2);
    let origin = publisher.create_location_id();
    let mut status = StatusEvent::new("run9", &origin, &ps).unwrap();
    status.event_mut().set_status("done");
    publisher.publish("stage.status", &mut status).unwrap();

    for system in [&monitor, &archiver] {
        let Some(AnyEvent::Status(received)) = system.receive("stage.status").unwrap() else {
            panic!("expected a status event");
        };
        assert_eq!(received.originator_id().unwrap(), origin.packed());
        assert_eq!(received.event().status().unwrap(), "done");
        assert_eq!(received.event().properties().get_int("STAGEID"), Some(2));
    }
}

#[test]
fn selector_filters_on_headers() {
    let system = system();
    system
        .create_receiver("stage.status", DestinationKind::Topic, "STATUS = 'failed'", 0)
        .unwrap();
    system.create_transmitter("stage.status", DestinationKind::Topic, false).unwrap();

    let origin = system.create_location_id();
    for status in ["running", "failed", "done"] {
        let mut event = StatusEvent::new("run1", &origin, &PropertySet::new()).unwrap();
        event.event_mut().set_status(status);
        system.publish("stage.status", &mut event).unwrap();
    }

    let received = system.receive("stage.status").unwrap().unwrap();
    assert_eq!(received.as_ref().status().unwrap(), "failed");
    assert!(system.receive("stage.status").unwrap().is_none());
}

#[test]
fn command_reaches_its_destination() {
    let controller = system();
    let worker_location = controller.create_location_id();
    controller.create_receiver("ctrl", DestinationKind::Queue, "", 0).unwrap();
    controller.create_transmitter("ctrl", DestinationKind::Queue, false).unwrap();

    let mut ps = PropertySet::new();
    ps.set("ACTION", "stop");
    let origin = controller.create_location_id();
    let mut command = CommandEvent::new("run1", &origin, &worker_location, &ps).unwrap();
    controller.publish("ctrl", &mut command).unwrap();

    let Some(AnyEvent::Command(received)) = controller.receive("ctrl").unwrap() else {
        panic!("expected a command event");
    };
    assert_eq!(received.destination_id().unwrap(), worker_location.packed());
    assert_eq!(received.originator_id().unwrap(), origin.packed());
    assert_eq!(received.event().properties().get_string("ACTION"), Some("stop"));
}

#[test]
fn pipeline_log_keeps_its_coordinates() {
    let system = system();
    system.create_receiver("logging", DestinationKind::Topic, "", 0).unwrap();
    system.create_transmitter("logging", DestinationKind::Topic, false).unwrap();

    let record = LogRecord::new("harness.stage", 20, "slice finished")
        .at("stage.py", "Stage", "process", 88)
        .with_property("DATAID", "exp001")
        .with_property("SLICEID", 4)
        .with_property("STAGEID", 1);
    let mut event = PipelineLogEvent::new("run1", &record).unwrap();
    system.publish("logging", &mut event).unwrap();

    let Some(AnyEvent::PipelineLog(received)) = system.receive("logging").unwrap() else {
        panic!("expected a pipeline log event");
    };
    assert_eq!(received.data_id().unwrap(), "exp001");
    assert_eq!(received.slice_id().unwrap(), 4);
    assert_eq!(received.loop_num().unwrap(), -1);
    assert_eq!(received.as_log().line_number().unwrap(), 88);
}

#[test]
fn queue_delivers_each_event_once_across_threads() {
    let system = Arc::new(system());
    system.create_transmitter("jobs", DestinationKind::Queue, false).unwrap();
    system.create_receiver("jobs", DestinationKind::Queue, "", 0).unwrap();

    let publishers: Vec<_> = (0..4)
        .map(|worker| {
            let system = Arc::clone(&system);
            thread::spawn(move || {
                for n in 0..25 {
                    let mut ps = PropertySet::new();
                    ps.set("N", worker * 100 + n);
                    system.publish_properties("jobs", "run1", &ps).unwrap();
                }
            })
        })
        .collect();
    for publisher in publishers {
        publisher.join().unwrap();
    }

    let mut seen = HashSet::new();
    while let Some(event) = system.receive("jobs").unwrap() {
        assert!(seen.insert(event.as_ref().properties().get_int("N").unwrap()));
    }
    assert_eq!(seen.len(), 100);
}

#[test]
fn built_from_config() {
    let mut config = HeraldConfig::default();
    config.broker.capacity = 8;
    config.identity.hostname = Some("configured".into());
    config.identity.ip = Some(Ipv4Addr::new(10, 1, 2, 3));
    config.transmitters.push(TransmitterConfig {
        destination: "events".into(),
        kind: DestinationKind::Topic,
        turn_events_off: false,
    });
    config.receivers.push(ReceiverConfig {
        destination: "events".into(),
        kind: DestinationKind::Topic,
        selector: String::new(),
        timeout_ms: 0,
    });

    let system = EventSystem::from_config(&config).unwrap();
    assert_eq!(system.host().hostname(), "configured");
    assert_eq!(system.host().ip(), Ipv4Addr::new(10, 1, 2, 3));

    let published = system.publish_properties("events", "r", &PropertySet::new()).unwrap();
    let received = system.receive("events").unwrap().unwrap();
    assert_eq!(received.as_ref().host_id().unwrap(), "configured");
    assert_eq!(received.as_ref().pub_time().unwrap(), published.pub_time().unwrap());

    let metrics = system.metrics().unwrap();
    assert_eq!(metrics.published_events.with_label_values(&["events"]).get(), 1);
    assert_eq!(metrics.received_events.with_label_values(&["events"]).get(), 1);
}

#[test]
fn queue_receivers_reject_selectors() {
    let system = system();
    assert!(matches!(
        system.create_receiver("jobs", DestinationKind::Queue, "STATUS = 'x'", 0),
        Err(SystemError::Broker(_))
    ));
}

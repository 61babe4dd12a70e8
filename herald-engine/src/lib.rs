//! ## herald-engine
//! **Topics, queues and the event system that publishes onto them**
//!
//! Frontends usually only need [`EventSystem`]; the broker traits are
//! public so another transport can stand in for [`InMemoryBroker`].

pub mod engine;

pub use engine::prelude;
pub use engine::{
    BrokerError, EventDequeuer, EventEnqueuer, EventReceiver, EventSystem, EventTransmitter,
    InMemoryBroker, Receiver, Selector, SystemError, Transmitter,
};

pub mod broker;
mod error;
mod receiver;
mod selector;
mod system;
mod transmitter;

pub use self::{
    broker::{InMemoryBroker, Receiver, Transmitter},
    error::{BrokerError, SystemError},
    receiver::{EventDequeuer, EventReceiver},
    selector::Selector,
    system::EventSystem,
    transmitter::{EventEnqueuer, EventTransmitter},
};

pub mod prelude {
    pub use super::{
        BrokerError, EventDequeuer, EventEnqueuer, EventReceiver, EventSystem, EventTransmitter,
        InMemoryBroker, SystemError,
    };
}

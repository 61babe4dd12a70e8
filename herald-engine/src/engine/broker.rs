//! ## herald-engine::broker
//! **Collaborator traits and an in-process broker**
//!
//! [`Transmitter`] and [`Receiver`] are the only things the event layer
//! needs from a message broker. [`InMemoryBroker`] implements them with
//! crossbeam channels:
//! - a topic keeps one bounded channel per subscriber and copies every
//!   matching message into each of them; with no subscriber the message
//!   is dropped
//! - a queue is a single channel shared by all consumers, so each message
//!   is taken by exactly one of them; messages wait until someone reads
//!
//! Nothing is persisted and nothing is acknowledged.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError, TryRecvError, TrySendError};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use herald_config::DestinationKind;
use herald_protocol::Message;

use super::error::BrokerError;
use super::selector::Selector;

/// Sends messages to one destination.
pub trait Transmitter: Send + Sync {
    fn destination(&self) -> &str;

    fn send(&self, message: &Message) -> Result<(), BrokerError>;
}

/// Receives messages from one destination.
pub trait Receiver: Send + Sync {
    fn destination(&self) -> &str;

    /// Waits up to `timeout_ms` (0 polls, -1 blocks). `Ok(None)` on timeout.
    fn receive(&self, timeout_ms: i64) -> Result<Option<Message>, BrokerError>;
}

struct Subscription {
    sender: channel::Sender<Message>,
    selector: Selector,
}

struct Queue {
    sender: channel::Sender<Message>,
    receiver: channel::Receiver<Message>,
}

#[derive(Default)]
struct BrokerInner {
    /// Per-channel bound, 0 for unbounded
    capacity: usize,
    topics: RwLock<HashMap<String, Vec<Subscription>>>,
    queues: Mutex<HashMap<String, Queue>>,
}

impl BrokerInner {
    fn channel(&self) -> (channel::Sender<Message>, channel::Receiver<Message>) {
        match self.capacity {
            0 => channel::unbounded(),
            n => channel::bounded(n),
        }
    }
}

/// Cheap to clone; clones share the same destinations.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    inner: Arc<BrokerInner>,
}

impl InMemoryBroker {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                capacity,
                ..BrokerInner::default()
            }),
        }
    }

    pub fn transmitter(&self, kind: DestinationKind, destination: &str) -> Box<dyn Transmitter> {
        match kind {
            DestinationKind::Topic => Box::new(self.topic_transmitter(destination)),
            DestinationKind::Queue => Box::new(self.queue_transmitter(destination)),
        }
    }

    pub fn receiver(
        &self,
        kind: DestinationKind,
        destination: &str,
        selector: &str,
    ) -> Result<Box<dyn Receiver>, BrokerError> {
        Ok(match kind {
            DestinationKind::Topic => Box::new(self.topic_receiver(destination, selector)?),
            DestinationKind::Queue => {
                if !selector.trim().is_empty() {
                    return Err(BrokerError::SelectorUnsupported(destination.to_string()));
                }
                Box::new(self.queue_receiver(destination))
            }
        })
    }

    pub fn topic_transmitter(&self, topic: &str) -> TopicTransmitter {
        TopicTransmitter {
            inner: Arc::clone(&self.inner),
            topic: topic.to_string(),
        }
    }

    /// Subscribes to `topic`. Only messages published after this call and
    /// matching `selector` are delivered.
    pub fn topic_receiver(
        &self,
        topic: &str,
        selector: &str,
    ) -> Result<TopicReceiver, BrokerError> {
        let selector = Selector::parse(selector)?;
        let (sender, receiver) = self.inner.channel();
        self.inner
            .topics
            .write()
            .entry(topic.to_string())
            .or_default()
            .push(Subscription { sender, selector });
        debug!(topic, "Subscribed to topic");
        Ok(TopicReceiver {
            topic: topic.to_string(),
            receiver,
        })
    }

    pub fn queue_transmitter(&self, queue: &str) -> QueueTransmitter {
        QueueTransmitter {
            queue: queue.to_string(),
            sender: self.queue(queue).0,
        }
    }

    pub fn queue_receiver(&self, queue: &str) -> QueueReceiver {
        QueueReceiver {
            queue: queue.to_string(),
            receiver: self.queue(queue).1,
        }
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .topics
            .read()
            .get(topic)
            .map_or(0, |subs| subs.len())
    }

    fn queue(&self, name: &str) -> (channel::Sender<Message>, channel::Receiver<Message>) {
        let mut queues = self.inner.queues.lock();
        let queue = queues.entry(name.to_string()).or_insert_with(|| {
            let (sender, receiver) = self.inner.channel();
            Queue { sender, receiver }
        });
        (queue.sender.clone(), queue.receiver.clone())
    }
}

pub struct TopicTransmitter {
    inner: Arc<BrokerInner>,
    topic: String,
}

impl Transmitter for TopicTransmitter {
    fn destination(&self) -> &str {
        &self.topic
    }

    fn send(&self, message: &Message) -> Result<(), BrokerError> {
        let mut topics = self.inner.topics.write();
        let Some(subscriptions) = topics.get_mut(&self.topic) else {
            trace!(topic = %self.topic, "No subscribers, message dropped");
            return Ok(());
        };

        subscriptions.retain(|sub| {
            if !sub.selector.matches(message.headers()) {
                return true;
            }
            match sub.sender.try_send(message.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(topic = %self.topic, "Subscriber is full, message dropped for it");
                    true
                }
                Err(TrySendError::Disconnected(_)) => {
                    debug!(topic = %self.topic, "Pruning closed subscription");
                    false
                }
            }
        });
        Ok(())
    }
}

pub struct TopicReceiver {
    topic: String,
    receiver: channel::Receiver<Message>,
}

impl Receiver for TopicReceiver {
    fn destination(&self) -> &str {
        &self.topic
    }

    fn receive(&self, timeout_ms: i64) -> Result<Option<Message>, BrokerError> {
        receive_from(&self.receiver, &self.topic, timeout_ms)
    }
}

pub struct QueueTransmitter {
    queue: String,
    sender: channel::Sender<Message>,
}

impl Transmitter for QueueTransmitter {
    fn destination(&self) -> &str {
        &self.queue
    }

    fn send(&self, message: &Message) -> Result<(), BrokerError> {
        self.sender
            .try_send(message.clone())
            .map_err(|err| match err {
                TrySendError::Full(_) => BrokerError::Full(self.queue.clone()),
                TrySendError::Disconnected(_) => BrokerError::Disconnected(self.queue.clone()),
            })
    }
}

pub struct QueueReceiver {
    queue: String,
    receiver: channel::Receiver<Message>,
}

impl Receiver for QueueReceiver {
    fn destination(&self) -> &str {
        &self.queue
    }

    fn receive(&self, timeout_ms: i64) -> Result<Option<Message>, BrokerError> {
        receive_from(&self.receiver, &self.queue, timeout_ms)
    }
}

fn receive_from(
    receiver: &channel::Receiver<Message>,
    destination: &str,
    timeout_ms: i64,
) -> Result<Option<Message>, BrokerError> {
    let disconnected = || BrokerError::Disconnected(destination.to_string());
    match timeout_ms {
        t if t < 0 => receiver.recv().map(Some).map_err(|_| disconnected()),
        0 => match receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(disconnected()),
        },
        t => match receiver.recv_timeout(Duration::from_millis(t as u64)) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(disconnected()),
        },
    }
}

//! ## herald-core::events::factory
//! **Rebuild the right event kind from a received message**

use herald_protocol::Message;
use tracing::debug;

use super::keywords::{EventKind, TYPE};
use super::{CommandEvent, Event, LogEvent, PipelineLogEvent, StatusEvent};
use crate::error::EventError;

/// Any received event, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyEvent {
    Event(Event),
    Status(StatusEvent),
    Command(CommandEvent),
    Log(LogEvent),
    PipelineLog(PipelineLogEvent),
}

impl AnyEvent {
    pub fn kind(&self) -> EventKind {
        self.as_ref().kind()
    }

    pub fn into_event(self) -> Event {
        match self {
            AnyEvent::Event(e) => e,
            AnyEvent::Status(e) => e.into_event(),
            AnyEvent::Command(e) => e.into_event(),
            AnyEvent::Log(e) => e.into_event(),
            AnyEvent::PipelineLog(e) => e.into_event(),
        }
    }
}

impl AsRef<Event> for AnyEvent {
    fn as_ref(&self) -> &Event {
        match self {
            AnyEvent::Event(e) => e,
            AnyEvent::Status(e) => e.event(),
            AnyEvent::Command(e) => e.event(),
            AnyEvent::Log(e) => e.event(),
            AnyEvent::PipelineLog(e) => e.event(),
        }
    }
}

impl std::fmt::Display for AnyEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.as_ref(), f)
    }
}

#[derive(Default, Debug, Copy, Clone)]
pub struct EventFactory;

impl EventFactory {
    pub fn new() -> Self {
        Self
    }

    /// Dispatches on the TYPE header; a missing or unknown marker yields a
    /// base [`Event`].
    pub fn create(&self, message: &Message) -> Result<AnyEvent, EventError> {
        let kind = message
            .string_property(TYPE)
            .map(EventKind::from_marker)
            .unwrap_or(EventKind::Event);
        debug!(?kind, "Rebuilding event from message");

        Ok(match kind {
            EventKind::Event => AnyEvent::Event(Event::from_message(kind, message)?),
            EventKind::Status => AnyEvent::Status(StatusEvent::from_message(message)?),
            EventKind::Command => AnyEvent::Command(CommandEvent::from_message(message)?),
            EventKind::Log => AnyEvent::Log(LogEvent::from_message(message)?),
            EventKind::PipelineLog => {
                AnyEvent::PipelineLog(PipelineLogEvent::from_message(message)?)
            }
        })
    }
}

//! ## herald-core::events::status
//! **Status reports tagged with the identity of the reporting process**

use herald_protocol::PropertySet;

use super::event::{Event, ORIGINATOR};
use super::keywords::{EventKind, ORIGINATORID};
use crate::error::EventError;
use crate::identity::LocationId;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusEvent(Event);

event_view!(StatusEvent, EventKind::Status);

impl StatusEvent {
    pub fn new(
        run_id: &str,
        originator: &LocationId,
        properties: &PropertySet,
    ) -> Result<Self, EventError> {
        Self::with_filterable(run_id, originator, properties, &PropertySet::new())
    }

    /// Builds from a packed originator id. The host part of the returned
    /// [`StatusEvent::originator`] comes from HOSTID.
    pub fn from_id(
        run_id: &str,
        originator_id: i64,
        properties: &PropertySet,
    ) -> Result<Self, EventError> {
        Self::new(run_id, &LocationId::from_packed("", originator_id), properties)
    }

    pub fn with_filterable(
        run_id: &str,
        originator: &LocationId,
        properties: &PropertySet,
        filterable: &PropertySet,
    ) -> Result<Self, EventError> {
        let mut event = Event::build(EventKind::Status, run_id, properties, filterable)?;
        event.identity_set(&ORIGINATOR, originator);
        Ok(Self(event))
    }

    pub fn originator_id(&self) -> Result<i64, EventError> {
        self.0.long_of(ORIGINATORID)
    }

    pub fn originator(&self) -> Result<LocationId, EventError> {
        self.0.identity_of(&ORIGINATOR, self.0.host_id()?)
    }
}

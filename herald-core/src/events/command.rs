//! ## herald-core::events::command
//! **Commands addressed from one process to another**
//!
//! Both identities travel as headers: the packed id plus its three parts,
//! so selectors can match on, say, `DEST_PROCESSID` alone. Hostnames are
//! not carried; the originator's host is HOSTID and the destination's is
//! left empty.

use herald_protocol::PropertySet;

use super::event::{Event, DESTINATION, ORIGINATOR};
use super::keywords::{EventKind, DESTINATIONID, ORIGINATORID};
use crate::error::EventError;
use crate::identity::LocationId;

#[derive(Debug, Clone, PartialEq)]
pub struct CommandEvent(Event);

event_view!(CommandEvent, EventKind::Command);

impl CommandEvent {
    pub fn new(
        run_id: &str,
        originator: &LocationId,
        destination: &LocationId,
        properties: &PropertySet,
    ) -> Result<Self, EventError> {
        Self::with_filterable(
            run_id,
            originator,
            destination,
            properties,
            &PropertySet::new(),
        )
    }

    pub fn from_ids(
        run_id: &str,
        originator_id: i64,
        destination_id: i64,
        properties: &PropertySet,
    ) -> Result<Self, EventError> {
        Self::new(
            run_id,
            &LocationId::from_packed("", originator_id),
            &LocationId::from_packed("", destination_id),
            properties,
        )
    }

    pub fn with_filterable(
        run_id: &str,
        originator: &LocationId,
        destination: &LocationId,
        properties: &PropertySet,
        filterable: &PropertySet,
    ) -> Result<Self, EventError> {
        let mut event = Event::build(EventKind::Command, run_id, properties, filterable)?;
        event.identity_set(&ORIGINATOR, originator);
        event.identity_set(&DESTINATION, destination);
        Ok(Self(event))
    }

    pub fn originator_id(&self) -> Result<i64, EventError> {
        self.0.long_of(ORIGINATORID)
    }

    pub fn destination_id(&self) -> Result<i64, EventError> {
        self.0.long_of(DESTINATIONID)
    }

    pub fn originator(&self) -> Result<LocationId, EventError> {
        self.0.identity_of(&ORIGINATOR, self.0.host_id()?)
    }

    pub fn destination(&self) -> Result<LocationId, EventError> {
        self.0.identity_of(&DESTINATION, "")
    }
}

//! ## herald-core::events::keywords
//! **Reserved keys and the event kinds that own them**
//!
//! Each kind's reserved set is its parent's list followed by the kind's own
//! additions. Reserved keys travel as typed message headers and never in
//! the payload.

use herald_protocol::ValueKind;

pub const TYPE: &str = "TYPE";
pub const EVENTTIME: &str = "EVENTTIME";
pub const HOSTID: &str = "HOSTID";
pub const RUNID: &str = "RUNID";
pub const STATUS: &str = "STATUS";
pub const TOPIC: &str = "TOPIC";
pub const PUBTIME: &str = "PUBTIME";

pub const ORIGINATORID: &str = "ORIGINATORID";
pub const ORIG_LOCALID: &str = "ORIG_LOCALID";
pub const ORIG_PROCESSID: &str = "ORIG_PROCESSID";
pub const ORIG_IPID: &str = "ORIG_IPID";

pub const DESTINATIONID: &str = "DESTINATIONID";
pub const DEST_LOCALID: &str = "DEST_LOCALID";
pub const DEST_PROCESSID: &str = "DEST_PROCESSID";
pub const DEST_IPID: &str = "DEST_IPID";

pub const LEVEL: &str = "LEVEL";
pub const LOGGER: &str = "LOGGER";
pub const MESSAGE: &str = "MESSAGE";
pub const TIMESTAMP: &str = "TIMESTAMP";
pub const THREADNAME: &str = "THREADNAME";
pub const FILENAME: &str = "FILENAME";
pub const CLASSNAME: &str = "CLASSNAME";
pub const METHODNAME: &str = "METHODNAME";
pub const LINENUMBER: &str = "LINENUMBER";
pub const LOCATION: &str = "LOCATION";

pub const DATAID: &str = "DATAID";
pub const LOOPNUM: &str = "LOOPNUM";
pub const PIPELINE: &str = "PIPELINE";
pub const SLICEID: &str = "SLICEID";
pub const STAGEID: &str = "STAGEID";

/// Header set by queue publishers alongside TOPIC.
pub const QUEUE: &str = "QUEUE";

pub const TOPIC_UNINITIALIZED: &str = "uninitialized";
pub const STATUS_UNKNOWN: &str = "unknown";
pub const PUBTIME_UNPUBLISHED: i64 = 0;

/// A reserved key and the kind its value must have in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDescriptor {
    pub name: &'static str,
    pub kind: ValueKind,
}

const fn key(name: &'static str, kind: ValueKind) -> KeyDescriptor {
    KeyDescriptor { name, kind }
}

const BASE_KEYS: &[KeyDescriptor] = &[
    key(TYPE, ValueKind::String),
    key(EVENTTIME, ValueKind::Long),
    key(HOSTID, ValueKind::String),
    key(RUNID, ValueKind::String),
    key(STATUS, ValueKind::String),
    key(TOPIC, ValueKind::String),
    key(PUBTIME, ValueKind::Long),
];

const ORIGINATOR_KEYS: &[KeyDescriptor] = &[
    key(ORIGINATORID, ValueKind::Long),
    key(ORIG_LOCALID, ValueKind::Int),
    key(ORIG_PROCESSID, ValueKind::Int),
    key(ORIG_IPID, ValueKind::Int),
];

const DESTINATION_KEYS: &[KeyDescriptor] = &[
    key(DESTINATIONID, ValueKind::Long),
    key(DEST_LOCALID, ValueKind::Int),
    key(DEST_PROCESSID, ValueKind::Int),
    key(DEST_IPID, ValueKind::Int),
];

const LOG_KEYS: &[KeyDescriptor] = &[
    key(LEVEL, ValueKind::Int),
    key(LOGGER, ValueKind::String),
    key(MESSAGE, ValueKind::String),
    key(TIMESTAMP, ValueKind::Long),
    key(THREADNAME, ValueKind::String),
    key(FILENAME, ValueKind::String),
    key(CLASSNAME, ValueKind::String),
    key(METHODNAME, ValueKind::String),
    key(LINENUMBER, ValueKind::Int),
    key(LOCATION, ValueKind::String),
];

const PIPELINE_KEYS: &[KeyDescriptor] = &[
    key(DATAID, ValueKind::String),
    key(LOOPNUM, ValueKind::Int),
    key(PIPELINE, ValueKind::String),
    key(SLICEID, ValueKind::Int),
    key(STAGEID, ValueKind::Int),
];

/// The closed set of event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Event,
    Status,
    Command,
    Log,
    PipelineLog,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Event,
        EventKind::Status,
        EventKind::Command,
        EventKind::Log,
        EventKind::PipelineLog,
    ];

    /// Value of the TYPE header.
    pub fn type_marker(self) -> &'static str {
        match self {
            EventKind::Event => "_E",
            EventKind::Status => "_S",
            EventKind::Command => "_C",
            EventKind::Log => "_L",
            EventKind::PipelineLog => "_PL",
        }
    }

    /// Unknown markers map to the base kind.
    pub fn from_marker(marker: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_marker() == marker)
            .unwrap_or(EventKind::Event)
    }

    pub fn parent(self) -> Option<EventKind> {
        match self {
            EventKind::Event => None,
            EventKind::Status | EventKind::Command | EventKind::Log => Some(EventKind::Event),
            EventKind::PipelineLog => Some(EventKind::Log),
        }
    }

    fn layers(self) -> &'static [&'static [KeyDescriptor]] {
        match self {
            EventKind::Event => &[BASE_KEYS],
            EventKind::Status => &[BASE_KEYS, ORIGINATOR_KEYS],
            EventKind::Command => &[BASE_KEYS, ORIGINATOR_KEYS, DESTINATION_KEYS],
            EventKind::Log => &[BASE_KEYS, LOG_KEYS],
            EventKind::PipelineLog => &[BASE_KEYS, LOG_KEYS, PIPELINE_KEYS],
        }
    }

    /// Reserved keys in declaration order, parent keys first.
    pub fn reserved_keys(self) -> impl Iterator<Item = &'static KeyDescriptor> {
        self.layers().iter().flat_map(|layer| layer.iter())
    }

    pub fn descriptor(self, name: &str) -> Option<&'static KeyDescriptor> {
        self.reserved_keys().find(|d| d.name == name)
    }

    pub fn is_reserved(self, name: &str) -> bool {
        self.descriptor(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_strictly_extends_its_parent() {
        for kind in EventKind::ALL {
            let Some(parent) = kind.parent() else {
                continue;
            };
            let own: Vec<_> = kind.reserved_keys().map(|d| d.name).collect();
            let inherited: Vec<_> = parent.reserved_keys().map(|d| d.name).collect();
            assert!(own.len() > inherited.len(), "{kind:?}");
            assert_eq!(&own[..inherited.len()], inherited.as_slice(), "{kind:?}");
        }
    }

    #[test]
    fn reserved_names_are_unique_per_kind() {
        for kind in EventKind::ALL {
            let mut names: Vec<_> = kind.reserved_keys().map(|d| d.name).collect();
            let total = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), total, "{kind:?}");
        }
    }

    #[test]
    fn markers_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_marker(kind.type_marker()), kind);
        }
        assert_eq!(EventKind::from_marker("_X"), EventKind::Event);
    }

    #[test]
    fn command_reserves_both_identities() {
        assert!(EventKind::Command.is_reserved(ORIG_IPID));
        assert!(EventKind::Command.is_reserved(DEST_IPID));
        assert!(!EventKind::Status.is_reserved(DEST_IPID));
        assert_eq!(EventKind::PipelineLog.reserved_keys().count(), 22);
    }
}

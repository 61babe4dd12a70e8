//! ## herald-core::events::event
//! **The Event contract shared by every kind**
//!
//! An event owns one property set. Reserved keys (those of its kind plus
//! any user filterable names) are written to message headers so broker
//! selectors can see them; everything else is marshalled into the body.
//!
//! Construction from application data fills defaults for STATUS,
//! EVENTTIME and HOSTID when the caller leaves them out, and always sets
//! TYPE, RUNID, TOPIC and PUBTIME itself. TOPIC and PUBTIME change once
//! more, when a transmitter publishes the event.

use std::fmt;

use herald_protocol::{
    unmarshall, CodecWarning, Message, PropertyCodec, PropertySet, Value, ValueKind,
};

use super::keywords::*;
use crate::error::EventError;
use crate::host::HostInfo;
use crate::identity::LocationId;
use crate::time;

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    kind: EventKind,
    properties: PropertySet,
    filterable: Vec<String>,
}

impl Event {
    pub fn new(run_id: &str, properties: &PropertySet) -> Result<Self, EventError> {
        Self::build(EventKind::Event, run_id, properties, &PropertySet::new())
    }

    /// Like [`Event::new`], with extra properties that travel as headers so
    /// receivers can select on them.
    pub fn with_filterable(
        run_id: &str,
        properties: &PropertySet,
        filterable: &PropertySet,
    ) -> Result<Self, EventError> {
        Self::build(EventKind::Event, run_id, properties, filterable)
    }

    pub(crate) fn build(
        kind: EventKind,
        run_id: &str,
        properties: &PropertySet,
        filterable: &PropertySet,
    ) -> Result<Self, EventError> {
        let mut properties = properties.clone();

        check_string(&properties, STATUS)?;
        check_string(&properties, HOSTID)?;
        match properties.kind_of(EVENTTIME) {
            None | Some(ValueKind::Long) => {}
            Some(ValueKind::DateTime) => {
                if let Some(ns) = properties.get_datetime(EVENTTIME) {
                    properties.set(EVENTTIME, ns);
                }
            }
            Some(other) => {
                return Err(EventError::InvalidPropertySet(format!(
                    "{EVENTTIME} must be a long or datetime, got {other}"
                )))
            }
        }

        if !properties.exists(STATUS) {
            properties.set(STATUS, STATUS_UNKNOWN);
        }
        if !properties.exists(EVENTTIME) {
            properties.set(EVENTTIME, time::now_ns());
        }
        if !properties.exists(HOSTID) {
            properties.set(HOSTID, HostInfo::local().hostname());
        }

        properties.set(TYPE, kind.type_marker());
        properties.set(RUNID, run_id);
        properties.set(TOPIC, TOPIC_UNINITIALIZED);
        properties.set(PUBTIME, PUBTIME_UNPUBLISHED);

        let mut event = Self {
            kind,
            properties,
            filterable: Vec::new(),
        };
        for (name, values) in filterable.iter() {
            if kind.is_reserved(name) {
                return Err(EventError::InvalidPropertySet(format!(
                    "filterable property {name} shadows a reserved key"
                )));
            }
            event
                .properties
                .set_array(name, values.to_vec())
                .map_err(|err| EventError::InvalidPropertySet(err.to_string()))?;
            event.filterable.push(name.to_string());
        }
        Ok(event)
    }

    /// Rebuilds an event of `kind` from a received message: reserved and
    /// filterable keys from the headers, the rest from the body.
    ///
    /// Header properties the kind does not reserve become user filterable
    /// properties of the rebuilt event.
    pub fn from_message(kind: EventKind, message: &Message) -> Result<Self, EventError> {
        let mut properties = unmarshall(message.text()?)?;
        let mut filterable = Vec::new();

        for (name, values) in message.headers().iter() {
            if !kind.is_reserved(name) {
                filterable.push(name.to_string());
            }
            properties
                .set_array(name, values.to_vec())
                .map_err(|err| EventError::InvalidPropertySet(err.to_string()))?;
        }

        for descriptor in kind.reserved_keys() {
            match properties.kind_of(descriptor.name) {
                Some(found) if found == descriptor.kind => {}
                Some(found) => {
                    return Err(EventError::InvalidPropertySet(format!(
                        "header {} is a {found}, expected {}",
                        descriptor.name, descriptor.kind
                    )))
                }
                None => {
                    return Err(EventError::InvalidPropertySet(format!(
                        "message has no {} header",
                        descriptor.name
                    )))
                }
            }
        }

        Ok(Self {
            kind,
            properties,
            filterable,
        })
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Writes every reserved and filterable property into the message headers.
    pub fn populate_header(&self, message: &mut Message) {
        for name in self.filterable_property_names() {
            if let Some(value) = self.properties.get(name) {
                message.set_property(name, value.clone());
            }
        }
    }

    /// Fills headers and body. Returns the properties the codec had to skip.
    pub fn marshall(&self, message: &mut Message) -> Vec<CodecWarning> {
        self.populate_header(message);
        let encoded = PropertyCodec::new().encode(&self.custom_property_set());
        message.set_text(encoded.payload);
        encoded.skipped
    }

    pub fn is_filterable(&self, name: &str) -> bool {
        self.kind.is_reserved(name) || self.filterable.iter().any(|f| f == name)
    }

    /// Reserved names of this kind followed by user filterable names.
    pub fn filterable_property_names(&self) -> Vec<&str> {
        self.kind
            .reserved_keys()
            .map(|d| d.name)
            .chain(self.filterable.iter().map(String::as_str))
            .collect()
    }

    pub fn custom_property_names(&self) -> Vec<&str> {
        self.properties
            .names()
            .filter(|name| !self.is_filterable(name))
            .collect()
    }

    pub fn custom_property_set(&self) -> PropertySet {
        self.properties.filtered(|name| self.is_filterable(name))
    }

    /// Full copy, reserved keys included.
    pub fn property_set(&self) -> PropertySet {
        self.properties.clone()
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    pub fn type_name(&self) -> Result<&str, EventError> {
        self.string_of(TYPE)
    }

    pub fn status(&self) -> Result<&str, EventError> {
        self.string_of(STATUS)
    }

    pub fn run_id(&self) -> Result<&str, EventError> {
        self.string_of(RUNID)
    }

    pub fn host_id(&self) -> Result<&str, EventError> {
        self.string_of(HOSTID)
    }

    pub fn topic(&self) -> Result<&str, EventError> {
        self.string_of(TOPIC)
    }

    pub fn event_time(&self) -> Result<i64, EventError> {
        self.long_of(EVENTTIME)
    }

    pub fn pub_time(&self) -> Result<i64, EventError> {
        self.long_of(PUBTIME)
    }

    pub fn event_date(&self) -> Result<String, EventError> {
        Ok(time::format_ns(self.event_time()?))
    }

    /// Empty until the event has been published.
    pub fn pub_date(&self) -> Result<String, EventError> {
        match self.pub_time()? {
            PUBTIME_UNPUBLISHED => Ok(String::new()),
            ns => Ok(time::format_ns(ns)),
        }
    }

    pub fn is_published(&self) -> bool {
        self.properties.get_long(PUBTIME) != Some(PUBTIME_UNPUBLISHED)
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.properties.set(STATUS, status.into());
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.properties.set(TOPIC, topic.into());
    }

    pub fn set_pub_time(&mut self, ns: i64) {
        self.properties.set(PUBTIME, ns);
    }

    pub fn set_event_time(&mut self, ns: i64) {
        self.properties.set(EVENTTIME, ns);
    }

    pub fn update_event_time(&mut self) {
        self.set_event_time(time::now_ns());
    }

    pub(crate) fn reserved_set(&mut self, name: &'static str, value: impl Into<Value>) {
        debug_assert!(self.kind.is_reserved(name), "{name} is not reserved");
        self.properties.set(name, value);
    }

    pub(crate) fn string_of(&self, key: &'static str) -> Result<&str, EventError> {
        self.properties
            .get_string(key)
            .ok_or(EventError::InternalInvariantViolation(key))
    }

    pub(crate) fn long_of(&self, key: &'static str) -> Result<i64, EventError> {
        self.properties
            .get_long(key)
            .ok_or(EventError::InternalInvariantViolation(key))
    }

    pub(crate) fn int_of(&self, key: &'static str) -> Result<i32, EventError> {
        self.properties
            .get_int(key)
            .ok_or(EventError::InternalInvariantViolation(key))
    }

    pub(crate) fn identity_set(&mut self, keys: &IdentityKeys, location: &LocationId) {
        self.reserved_set(keys.id, location.packed());
        // Int headers hold the u32 bit pattern, so large values read back negative.
        self.reserved_set(keys.local, location.local_id() as i32);
        self.reserved_set(keys.process, location.process_id() as i32);
        self.reserved_set(keys.ip, location.ip_id() as i32);
    }

    pub(crate) fn identity_of(
        &self,
        keys: &IdentityKeys,
        hostname: &str,
    ) -> Result<LocationId, EventError> {
        let local = self.int_of(keys.local)? as u32;
        let process = self.int_of(keys.process)? as u32;
        let ip = self.int_of(keys.ip)? as u32;
        Ok(LocationId::from_parts(hostname, ip, process, local))
    }
}

impl AsRef<Event> for Event {
    fn as_ref(&self) -> &Event {
        self
    }
}

impl AsMut<Event> for Event {
    fn as_mut(&mut self) -> &mut Event {
        self
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.properties)
    }
}

/// The four header keys describing one packed identity.
pub(crate) struct IdentityKeys {
    pub id: &'static str,
    pub local: &'static str,
    pub process: &'static str,
    pub ip: &'static str,
}

pub(crate) const ORIGINATOR: IdentityKeys = IdentityKeys {
    id: ORIGINATORID,
    local: ORIG_LOCALID,
    process: ORIG_PROCESSID,
    ip: ORIG_IPID,
};

pub(crate) const DESTINATION: IdentityKeys = IdentityKeys {
    id: DESTINATIONID,
    local: DEST_LOCALID,
    process: DEST_PROCESSID,
    ip: DEST_IPID,
};

fn check_string(properties: &PropertySet, key: &str) -> Result<(), EventError> {
    match properties.kind_of(key) {
        None | Some(ValueKind::String) => Ok(()),
        Some(other) => Err(EventError::InvalidPropertySet(format!(
            "{key} must be a string, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_protocol::CodecError;

    fn sample() -> PropertySet {
        let mut ps = PropertySet::new();
        ps.set("DATAID", "exp001");
        ps.set("LOOPNUM", 3);
        ps.set("EXPTIME", 12.5);
        ps
    }

    #[test]
    fn defaults_are_injected() {
        let event = Event::new("run42", &sample()).unwrap();
        assert_eq!(event.status().unwrap(), STATUS_UNKNOWN);
        assert!(event.event_time().unwrap() > 0);
        assert_eq!(event.host_id().unwrap(), HostInfo::local().hostname());
        assert_eq!(event.type_name().unwrap(), "_E");
        assert_eq!(event.run_id().unwrap(), "run42");
        assert_eq!(event.topic().unwrap(), TOPIC_UNINITIALIZED);
        assert_eq!(event.pub_time().unwrap(), 0);
        assert!(!event.is_published());
    }

    #[test]
    fn caller_overrides_survive_but_framework_fields_do_not() {
        let mut ps = sample();
        ps.set(STATUS, "running");
        ps.set(HOSTID, "node7");
        ps.set(EVENTTIME, 99_i64);
        ps.set(TYPE, "_S");
        ps.set(RUNID, "other");
        ps.set(TOPIC, "elsewhere");
        ps.set(PUBTIME, 5_i64);

        let event = Event::new("run42", &ps).unwrap();
        assert_eq!(event.status().unwrap(), "running");
        assert_eq!(event.host_id().unwrap(), "node7");
        assert_eq!(event.event_time().unwrap(), 99);
        assert_eq!(event.type_name().unwrap(), "_E");
        assert_eq!(event.run_id().unwrap(), "run42");
        assert_eq!(event.topic().unwrap(), TOPIC_UNINITIALIZED);
        assert_eq!(event.pub_time().unwrap(), 0);
    }

    #[test]
    fn caller_set_is_not_mutated() {
        let ps = sample();
        let before = ps.clone();
        let mut event = Event::new("r", &ps).unwrap();
        event.set_status("changed");
        assert_eq!(ps, before);
    }

    #[test]
    fn datetime_event_time_is_accepted() {
        let mut ps = sample();
        ps.set(EVENTTIME, Value::DateTime(1_000));
        let event = Event::new("r", &ps).unwrap();
        assert_eq!(event.event_time().unwrap(), 1_000);
    }

    #[test]
    fn mistyped_overridable_keys_are_rejected() {
        let mut ps = sample();
        ps.set(STATUS, 7);
        assert!(matches!(
            Event::new("r", &ps),
            Err(EventError::InvalidPropertySet(_))
        ));

        let mut ps = sample();
        ps.set(EVENTTIME, "yesterday");
        assert!(matches!(
            Event::new("r", &ps),
            Err(EventError::InvalidPropertySet(_))
        ));
    }

    #[test]
    fn custom_view_excludes_reserved_keys() {
        let event = Event::new("r", &sample()).unwrap();
        assert_eq!(
            event.custom_property_names(),
            vec!["DATAID", "LOOPNUM", "EXPTIME"]
        );
        let custom = event.custom_property_set();
        assert!(custom.same_entries(&sample()));
        for name in event.filterable_property_names() {
            assert!(!custom.exists(name), "{name} leaked into custom view");
        }
    }

    #[test]
    fn marshall_splits_headers_from_body() {
        let event = Event::new("r", &sample()).unwrap();
        let mut message = Message::new();
        let skipped = event.marshall(&mut message);
        assert!(skipped.is_empty());

        assert_eq!(
            message.text().unwrap(),
            "nodelist||nodelist||3~~string||DATAID||exp001~~int||LOOPNUM||3~~double||EXPTIME||12.5~~"
        );
        assert_eq!(message.string_property(TYPE), Some("_E"));
        assert_eq!(message.string_property(RUNID), Some("r"));
        assert_eq!(message.long_property(PUBTIME), Some(0));
        assert_eq!(message.headers().len(), 7);
    }

    #[test]
    fn round_trip_through_message() {
        let mut event = Event::new("r", &sample()).unwrap();
        event.set_topic("pipeline.status");
        event.set_pub_time(1_234);
        let mut message = Message::new();
        event.marshall(&mut message);

        let rebuilt = Event::from_message(EventKind::Event, &message).unwrap();
        assert!(rebuilt.properties().same_entries(event.properties()));
        assert_eq!(rebuilt.topic().unwrap(), "pipeline.status");
        assert!(rebuilt.is_published());
    }

    #[test]
    fn filterable_properties_travel_as_headers() {
        let mut extra = PropertySet::new();
        extra.set("CCD", 4);
        let event = Event::with_filterable("r", &sample(), &extra).unwrap();
        assert!(event.filterable_property_names().contains(&"CCD"));
        assert!(!event.custom_property_set().exists("CCD"));

        let mut message = Message::new();
        event.marshall(&mut message);
        assert_eq!(message.long_property("CCD"), Some(4));
        assert!(!message.text().unwrap().contains("CCD"));

        let rebuilt = Event::from_message(EventKind::Event, &message).unwrap();
        assert_eq!(rebuilt.properties().get_int("CCD"), Some(4));
        assert!(rebuilt.filterable_property_names().contains(&"CCD"));
    }

    #[test]
    fn filterable_cannot_shadow_reserved() {
        let mut extra = PropertySet::new();
        extra.set(STATUS, "x");
        assert!(matches!(
            Event::with_filterable("r", &sample(), &extra),
            Err(EventError::InvalidPropertySet(_))
        ));
    }

    #[test]
    fn pub_date_is_empty_until_published() {
        let mut event = Event::new("r", &sample()).unwrap();
        assert_eq!(event.pub_date().unwrap(), "");
        event.set_pub_time(0);
        assert_eq!(event.pub_date().unwrap(), "");
        event.set_pub_time(1_000_000_000);
        assert_eq!(event.pub_date().unwrap(), "Thu Jan  1 00:00:01 1970");
        event.set_event_time(0);
        assert_eq!(event.event_date().unwrap(), "Thu Jan  1 00:00:00 1970");
    }

    #[test]
    fn update_event_time_moves_forward() {
        let mut ps = sample();
        ps.set(EVENTTIME, 1_i64);
        let mut event = Event::new("r", &ps).unwrap();
        event.update_event_time();
        assert!(event.event_time().unwrap() > 1);
    }

    #[test]
    fn malformed_body_is_reported() {
        let event = Event::new("r", &sample()).unwrap();
        let mut message = Message::new();
        event.populate_header(&mut message);
        message.set_text("int||LOOPNUM||three~~");
        assert!(matches!(
            Event::from_message(EventKind::Event, &message),
            Err(EventError::MalformedPayload(CodecError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn message_without_headers_is_invalid() {
        let message = Message::with_text("nodelist||nodelist||0~~");
        assert!(matches!(
            Event::from_message(EventKind::Event, &message),
            Err(EventError::InvalidPropertySet(_))
        ));
    }
}

//! ## herald-core::events::pipeline_log
//! **Log events carrying pipeline position**
//!
//! DATAID, LOOPNUM, PIPELINE, SLICEID and STAGEID are read from the record's
//! properties. Missing values become `"unknown"` or `-1`; a value of another
//! kind is coerced (`"7"` → 7, `7` → `"7"`). Construction never fails on
//! absent pipeline metadata.

use herald_protocol::{PropertySet, Value};
use tracing::warn;

use super::event::Event;
use super::keywords::*;
use super::log::{record_keys_set, LogEvent, LogRecord};
use crate::error::EventError;

const UNKNOWN_STRING: &str = "unknown";
const UNKNOWN_INT: i32 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineLogEvent(Event);

event_view!(PipelineLogEvent, EventKind::PipelineLog);

impl PipelineLogEvent {
    pub fn new(run_id: &str, record: &LogRecord) -> Result<Self, EventError> {
        let ps = &record.properties;
        let mut event = Event::build(EventKind::PipelineLog, run_id, ps, &PropertySet::new())?;
        record_keys_set(&mut event, record);

        event.reserved_set(DATAID, coerce_string(ps, DATAID));
        event.reserved_set(LOOPNUM, coerce_int(ps, LOOPNUM));
        event.reserved_set(PIPELINE, coerce_string(ps, PIPELINE));
        event.reserved_set(SLICEID, coerce_int(ps, SLICEID));
        event.reserved_set(STAGEID, coerce_int(ps, STAGEID));
        Ok(Self(event))
    }

    /// The same event seen through the log accessors.
    pub fn as_log(&self) -> LogEvent {
        LogEvent::from_pipeline(self.0.clone())
    }

    pub fn data_id(&self) -> Result<&str, EventError> {
        self.0.string_of(DATAID)
    }

    pub fn loop_num(&self) -> Result<i32, EventError> {
        self.0.int_of(LOOPNUM)
    }

    pub fn pipeline(&self) -> Result<&str, EventError> {
        self.0.string_of(PIPELINE)
    }

    pub fn slice_id(&self) -> Result<i32, EventError> {
        self.0.int_of(SLICEID)
    }

    pub fn stage_id(&self) -> Result<i32, EventError> {
        self.0.int_of(STAGEID)
    }
}

fn coerce_string(ps: &PropertySet, key: &str) -> String {
    match ps.get(key) {
        None => UNKNOWN_STRING.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn coerce_int(ps: &PropertySet, key: &str) -> i32 {
    let coerced = match ps.get(key) {
        None => return UNKNOWN_INT,
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(other) => other.as_i32(),
    };
    coerced.unwrap_or_else(|| {
        warn!(property = key, "Pipeline property is not an int, using {UNKNOWN_INT}");
        UNKNOWN_INT
    })
}

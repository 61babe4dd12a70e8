//! ## herald-core::events::log
//! **Log records shipped as events**
//!
//! Every field of the record becomes a reserved header, so a log collector
//! can filter by level or logger without decoding bodies. The record's
//! free-form properties go into the body.

use herald_protocol::PropertySet;

use super::event::Event;
use super::keywords::*;
use crate::error::EventError;
use crate::time;

/// A structured log line, independent of any logging framework.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogRecord {
    pub level: i32,
    pub logger: String,
    pub message: String,
    /// ns since the Unix epoch
    pub timestamp: i64,
    pub thread_name: String,
    pub file_name: String,
    pub class_name: String,
    pub method_name: String,
    pub line_number: i32,
    pub location: String,
    pub properties: PropertySet,
}

impl LogRecord {
    /// Record stamped with the current time and thread.
    pub fn new(logger: impl Into<String>, level: i32, message: impl Into<String>) -> Self {
        Self {
            level,
            logger: logger.into(),
            message: message.into(),
            timestamp: time::now_ns(),
            thread_name: std::thread::current()
                .name()
                .unwrap_or("unnamed")
                .to_string(),
            ..Self::default()
        }
    }

    /// Sets the source location; `location` is rendered as `class.method(file:line)`.
    pub fn at(
        mut self,
        file_name: impl Into<String>,
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        line_number: i32,
    ) -> Self {
        self.file_name = file_name.into();
        self.class_name = class_name.into();
        self.method_name = method_name.into();
        self.line_number = line_number;
        self.location = format!(
            "{}.{}({}:{})",
            self.class_name, self.method_name, self.file_name, self.line_number
        );
        self
    }

    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<herald_protocol::Value>,
    ) -> Self {
        self.properties.set(name, value);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent(Event);

event_view!(LogEvent, EventKind::Log);

impl LogEvent {
    pub fn new(run_id: &str, record: &LogRecord) -> Result<Self, EventError> {
        let mut event = Event::build(
            EventKind::Log,
            run_id,
            &record.properties,
            &PropertySet::new(),
        )?;
        record_keys_set(&mut event, record);
        Ok(Self(event))
    }

    pub(crate) fn from_pipeline(event: Event) -> Self {
        debug_assert_eq!(event.kind(), EventKind::PipelineLog);
        Self(event)
    }

    pub fn level(&self) -> Result<i32, EventError> {
        self.0.int_of(LEVEL)
    }

    pub fn logger(&self) -> Result<&str, EventError> {
        self.0.string_of(LOGGER)
    }

    pub fn message(&self) -> Result<&str, EventError> {
        self.0.string_of(MESSAGE)
    }

    pub fn timestamp(&self) -> Result<i64, EventError> {
        self.0.long_of(TIMESTAMP)
    }

    pub fn thread_name(&self) -> Result<&str, EventError> {
        self.0.string_of(THREADNAME)
    }

    pub fn file_name(&self) -> Result<&str, EventError> {
        self.0.string_of(FILENAME)
    }

    pub fn class_name(&self) -> Result<&str, EventError> {
        self.0.string_of(CLASSNAME)
    }

    pub fn method_name(&self) -> Result<&str, EventError> {
        self.0.string_of(METHODNAME)
    }

    pub fn line_number(&self) -> Result<i32, EventError> {
        self.0.int_of(LINENUMBER)
    }

    pub fn location(&self) -> Result<&str, EventError> {
        self.0.string_of(LOCATION)
    }
}

/// Copies the record fields into their reserved keys.
pub(crate) fn record_keys_set(event: &mut Event, record: &LogRecord) {
    event.reserved_set(LEVEL, record.level);
    event.reserved_set(LOGGER, record.logger.as_str());
    event.reserved_set(MESSAGE, record.message.as_str());
    event.reserved_set(TIMESTAMP, record.timestamp);
    event.reserved_set(THREADNAME, record.thread_name.as_str());
    event.reserved_set(FILENAME, record.file_name.as_str());
    event.reserved_set(CLASSNAME, record.class_name.as_str());
    event.reserved_set(METHODNAME, record.method_name.as_str());
    event.reserved_set(LINENUMBER, record.line_number);
    event.reserved_set(LOCATION, record.location.as_str());
}

//! ## herald-core::events
//! **Typed events over property sets**
//!
//! [`Event`] carries the shared contract. [`StatusEvent`], [`CommandEvent`],
//! [`LogEvent`] and [`PipelineLogEvent`] are views that wrap an `Event` of
//! the matching [`EventKind`] and add accessors for their reserved keys.
//! [`EventFactory`] rebuilds the right view from a received message.

/// Conversions shared by every typed view over [`Event`].
macro_rules! event_view {
    ($view:ident, $kind:expr) => {
        impl $view {
            pub fn event(&self) -> &$crate::events::Event {
                &self.0
            }

            pub fn event_mut(&mut self) -> &mut $crate::events::Event {
                &mut self.0
            }

            pub fn into_event(self) -> $crate::events::Event {
                self.0
            }

            /// Rebuilds the view from a received message.
            pub fn from_message(
                message: &herald_protocol::Message,
            ) -> Result<Self, $crate::error::EventError> {
                $crate::events::Event::from_message($kind, message).map(Self)
            }
        }

        impl TryFrom<$crate::events::Event> for $view {
            type Error = $crate::error::EventError;

            fn try_from(event: $crate::events::Event) -> Result<Self, Self::Error> {
                if event.kind() == $kind {
                    Ok(Self(event))
                } else {
                    Err($crate::error::EventError::InvalidPropertySet(format!(
                        "expected a {:?} event, got {:?}",
                        $kind,
                        event.kind()
                    )))
                }
            }
        }

        impl From<$view> for $crate::events::Event {
            fn from(view: $view) -> Self {
                view.0
            }
        }

        impl AsRef<$crate::events::Event> for $view {
            fn as_ref(&self) -> &$crate::events::Event {
                &self.0
            }
        }

        impl AsMut<$crate::events::Event> for $view {
            fn as_mut(&mut self) -> &mut $crate::events::Event {
                &mut self.0
            }
        }

        impl std::fmt::Display for $view {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

pub mod command;
pub mod event;
pub mod factory;
pub mod keywords;
pub mod log;
pub mod pipeline_log;
pub mod status;

pub use command::CommandEvent;
pub use event::Event;
pub use factory::{AnyEvent, EventFactory};
pub use keywords::{EventKind, KeyDescriptor};
pub use log::{LogEvent, LogRecord};
pub use pipeline_log::PipelineLogEvent;
pub use status::StatusEvent;

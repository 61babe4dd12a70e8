//! # herald-core
//!
//! Event data model layered on top of `herald-protocol` property sets.
//!
//! ### Key Submodules:
//! - `events`: the Event contract, its variants and the factory that rebuilds
//!   them from broker messages
//! - `identity`: packed 64-bit origin identifiers and the process-local counter
//! - `host`: hostname and IPv4 discovery for the local process
//! - `time`: nanosecond timestamps and their UTC rendering
//!
//! Everything here is synchronous. The only shared mutable state is the
//! atomic counter inside `IdentifierAllocator`.

pub mod error;
pub mod events;
pub mod host;
pub mod identity;
pub mod time;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::host::HostInfo;
    pub use crate::identity::*;
}

pub use error::EventError;

//! ## herald-core::identity
//! **Origin identifiers packed into 64 bits**
//!
//! ```text
//!  63            32 31        16 15         0
//! +----------------+------------+------------+
//! |   IPv4 (u32)   | pid (u16)  | local (u16)|
//! +----------------+------------+------------+
//! ```
//!
//! The local id comes from a 32-bit per-process counter. It is unique for
//! the lifetime of the process, not across restarts. Global uniqueness
//! relies on no two live processes sharing (host, pid).
//!
//! [`LocationId`] keeps the full pid and local id. Only the packed form
//! truncates both to their low 16 bits.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::host::HostInfo;

pub fn pack(ip: u32, pid: u16, local: u16) -> i64 {
    ((u64::from(ip) << 32) | (u64::from(pid) << 16) | u64::from(local)) as i64
}

pub fn extract_ip_id(id: i64) -> u32 {
    ((id as u64) >> 32) as u32
}

pub fn extract_process_id(id: i64) -> u16 {
    (((id as u64) >> 16) & 0xffff) as u16
}

pub fn extract_local_id(id: i64) -> u16 {
    ((id as u64) & 0xffff) as u16
}

/// Hands out local ids and packed identities for one process.
#[derive(Debug)]
pub struct IdentifierAllocator {
    host: HostInfo,
    next_local: AtomicU32,
}

impl IdentifierAllocator {
    pub fn new(host: HostInfo) -> Self {
        Self {
            host,
            next_local: AtomicU32::new(1),
        }
    }

    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    /// Next local id. Safe to call from any number of threads; no two calls
    /// return the same value.
    pub fn local_id_next(&self) -> u32 {
        self.next_local.fetch_add(1, Ordering::Relaxed)
    }

    pub fn create_identity(&self) -> i64 {
        pack(self.host.ip_id(), self.host.process_id(), low_bits(self.local_id_next()))
    }
}

impl Default for IdentifierAllocator {
    fn default() -> Self {
        Self::new(HostInfo::local().clone())
    }
}

/// Where an event came from or is addressed to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocationId {
    hostname: String,
    ip_id: u32,
    process_id: u32,
    local_id: u32,
}

impl LocationId {
    /// A fresh location for this process, taking the next local id.
    pub fn new(allocator: &IdentifierAllocator) -> Self {
        let host = allocator.host();
        Self {
            hostname: host.hostname().to_string(),
            ip_id: host.ip_id(),
            process_id: host.pid(),
            local_id: allocator.local_id_next(),
        }
    }

    pub fn from_parts(
        hostname: impl Into<String>,
        ip_id: u32,
        process_id: u32,
        local_id: u32,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            ip_id,
            process_id,
            local_id,
        }
    }

    /// Rebuilds a location from a packed id. The packed form carries no
    /// hostname, so the caller supplies one (possibly empty).
    pub fn from_packed(hostname: impl Into<String>, id: i64) -> Self {
        Self::from_parts(
            hostname,
            extract_ip_id(id),
            u32::from(extract_process_id(id)),
            u32::from(extract_local_id(id)),
        )
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn ip_id(&self) -> u32 {
        self.ip_id
    }

    pub fn process_id(&self) -> u32 {
        self.process_id
    }

    pub fn local_id(&self) -> u32 {
        self.local_id
    }

    /// Lossy above 16 bits of pid or local id.
    pub fn packed(&self) -> i64 {
        pack(self.ip_id, low_bits(self.process_id), low_bits(self.local_id))
    }
}

fn low_bits(value: u32) -> u16 {
    (value & 0xffff) as u16
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.hostname,
            std::net::Ipv4Addr::from(self.ip_id),
            self.process_id,
            self.local_id
        )
    }
}

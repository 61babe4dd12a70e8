//! ## herald-core::host
//! **Local host identity: name, IPv4 address and process id**
//!
//! Discovery never fails. An unresolvable hostname falls back to
//! `127.0.0.1` with a warning, since events must still carry an origin.

use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

static LOCAL: OnceCell<HostInfo> = OnceCell::new();

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostInfo {
    hostname: String,
    ip: Ipv4Addr,
    pid: u32,
}

impl HostInfo {
    pub fn new(hostname: impl Into<String>, ip: Ipv4Addr, pid: u32) -> Self {
        Self {
            hostname: hostname.into(),
            ip,
            pid,
        }
    }

    /// Host information for this process, discovered once and cached.
    pub fn local() -> &'static HostInfo {
        LOCAL.get_or_init(Self::discover)
    }

    pub fn discover() -> Self {
        let hostname = match nix::unistd::gethostname() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(err) => {
                warn!(%err, "Couldn't read hostname, using localhost");
                "localhost".to_string()
            }
        };
        let ip = resolve_ipv4(&hostname);
        debug!(%hostname, %ip, "Discovered local host");
        Self::new(hostname, ip, std::process::id())
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    /// IPv4 address as the 32-bit value used in packed identifiers.
    pub fn ip_id(&self) -> u32 {
        u32::from(self.ip)
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Low 16 bits of the pid; the packed identifier has no room for more.
    pub fn process_id(&self) -> u16 {
        (self.pid & 0xffff) as u16
    }
}

fn resolve_ipv4(hostname: &str) -> Ipv4Addr {
    let addrs: Vec<Ipv4Addr> = match (hostname, 0).to_socket_addrs() {
        Ok(addrs) => addrs
            .filter_map(|addr| match addr {
                SocketAddr::V4(v4) => Some(*v4.ip()),
                SocketAddr::V6(_) => None,
            })
            .collect(),
        Err(err) => {
            warn!(%hostname, %err, "Couldn't resolve hostname, using 127.0.0.1");
            return Ipv4Addr::LOCALHOST;
        }
    };

    // Prefer a routable address over a loopback alias in /etc/hosts
    addrs
        .iter()
        .find(|ip| !ip.is_loopback())
        .or_else(|| addrs.first())
        .copied()
        .unwrap_or_else(|| {
            warn!(%hostname, "Hostname has no IPv4 address, using 127.0.0.1");
            Ipv4Addr::LOCALHOST
        })
}

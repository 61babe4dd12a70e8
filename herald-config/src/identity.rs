//! Overrides for the host identity stamped on outgoing events.
//!
//! Unset fields are discovered from the machine at startup.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct IdentityConfig {
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub hostname: Option<String>,

    #[serde(default)]
    pub ip: Option<Ipv4Addr>,
}

//! Discovery scan output

use serde::{Deserialize, Serialize};

/// A live host found by a subnet sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    pub ip: String,
    pub mac: Option<String>,
    pub vendor: String,
}

pub const UNKNOWN_VENDOR: &str = "Unknown";

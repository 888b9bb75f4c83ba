//! Managed address ranges

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RangeStatus {
    #[default]
    Active,
    Inactive,
}

impl RangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeStatus::Active => "Active",
            RangeStatus::Inactive => "Inactive",
        }
    }
}

impl std::str::FromStr for RangeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(RangeStatus::Active),
            "Inactive" => Ok(RangeStatus::Inactive),
            _ => Err(format!("Invalid range status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpRange {
    pub id: Uuid,
    pub start_address: Ipv4Addr,
    pub end_address: Ipv4Addr,
    pub status: RangeStatus,
    pub created_at: DateTime<Utc>,
}

impl IpRange {
    /// Number of addresses in the inclusive range
    pub fn size(&self) -> u64 {
        let start = u32::from(self.start_address) as u64;
        let end = u32::from(self.end_address) as u64;
        if end < start {
            0
        } else {
            end - start + 1
        }
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.start_address <= addr && addr <= self.end_address
    }
}

/// Range with usage computed from the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpRangeUsage {
    pub id: Uuid,
    pub range: String,
    pub status: RangeStatus,
    pub allocated: u64,
    pub available: u64,
}

impl IpRangeUsage {
    pub fn new(range: &IpRange, allocated: u64) -> Self {
        Self {
            id: range.id,
            range: format!("{} - {}", range.start_address, range.end_address),
            status: range.status,
            allocated,
            available: range.size().saturating_sub(allocated),
        }
    }
}

//! Address registry models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Allocation state of a registry entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AddressStatus {
    Available,
    #[default]
    Allocated,
}

impl AddressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressStatus::Available => "Available",
            AddressStatus::Allocated => "Allocated",
        }
    }
}

impl std::fmt::Display for AddressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AddressStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(AddressStatus::Available),
            "Allocated" => Ok(AddressStatus::Allocated),
            _ => Err(format!("Invalid address status: {}", s)),
        }
    }
}

/// One IP address and its holder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    pub id: Uuid,
    pub ip_address: String,
    pub mac_address: Option<String>,
    pub user_name: String,
    pub user_email: String,
    pub mobile: String,
    pub designation: Option<String>,
    pub antivirus: String,
    pub antivirus_name: Option<String>,
    pub location: String,
    pub department: String,
    pub operating_system: Option<String>,
    pub remark: Option<String>,
    pub status: AddressStatus,
    pub employee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Holder fields written to the registry on allocation
#[derive(Debug, Clone)]
pub struct HolderInfo {
    pub employee_id: Uuid,
    pub mac_address: Option<String>,
    pub user_name: String,
    pub user_email: String,
    pub mobile: String,
    pub designation: Option<String>,
    pub antivirus: String,
    pub antivirus_name: Option<String>,
    pub location: String,
    pub department: String,
    pub operating_system: Option<String>,
    pub remark: Option<String>,
}

/// Pre-provisioned pool entry, used by seeding
#[derive(Debug, Clone)]
pub struct PoolEntry {
    pub ip_address: String,
    pub mac_address: Option<String>,
    pub location: String,
    pub department: String,
}

/// Exact-match registry filter; absent fields are unconstrained
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressFilter {
    pub ip: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
}

/// Registry row with its computed reachability
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbedAddress {
    pub id: Uuid,
    pub ip_address: String,
    pub mac_address: Option<String>,
    pub user_name: String,
    pub mobile: String,
    pub antivirus: String,
    pub antivirus_name: String,
    pub department: String,
    pub operating_system: String,
    pub is_working: bool,
}

impl ProbedAddress {
    pub fn new(record: &AddressRecord, is_working: bool) -> Self {
        let or_default = |value: &Option<String>, default: &str| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        Self {
            id: record.id,
            ip_address: record.ip_address.clone(),
            mac_address: record.mac_address.clone(),
            user_name: record.user_name.clone(),
            mobile: record.mobile.clone(),
            antivirus: if record.antivirus.is_empty() {
                "N".to_string()
            } else {
                record.antivirus.clone()
            },
            antivirus_name: or_default(&record.antivirus_name, "N/A"),
            department: record.department.clone(),
            operating_system: or_default(&record.operating_system, "Windows"),
            is_working,
        }
    }
}

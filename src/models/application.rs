//! IP application models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application state; `Allocated` is terminal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Allocated,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Allocated => "allocated",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "allocated" => Ok(ApplicationStatus::Allocated),
            _ => Err(format!("Invalid application status: {}", s)),
        }
    }
}

/// An employee's request for an address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub address: String,
    pub department: String,
    pub contact: String,
    pub email: String,
    pub location: String,
    pub ip_form: String,
    pub mac_address: Option<String>,
    pub antivirus: String,
    pub antivirus_name: Option<String>,
    pub operating_system: Option<String>,
    pub ip_address: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw submission fields as received from the form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFields {
    pub name: Option<String>,
    pub address: Option<String>,
    pub department: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub mac_address: Option<String>,
    pub antivirus: Option<String>,
    pub antivirus_name: Option<String>,
    pub operating_system: Option<String>,
}

/// Checked and normalised submission, ready to insert
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub user_id: Uuid,
    pub name: String,
    pub address: String,
    pub department: String,
    pub contact: String,
    pub email: String,
    pub location: String,
    pub ip_form: String,
    pub mac_address: Option<String>,
    pub antivirus: String,
    pub antivirus_name: Option<String>,
    pub operating_system: String,
}

/// Admin allocation request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateRequest {
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// Employee view of the currently allocated address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAllocation {
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Application> for CurrentAllocation {
    fn from(app: &Application) -> Self {
        Self {
            ip_address: app.ip_address.clone(),
            mac_address: app.mac_address.clone(),
            updated_at: app.updated_at,
        }
    }
}

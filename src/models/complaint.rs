//! Complaint models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ComplaintStatus {
    #[default]
    Open,
    Closed,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Open => "Open",
            ComplaintStatus::Closed => "Closed",
        }
    }
}

impl std::str::FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(ComplaintStatus::Open),
            "Closed" => Ok(ComplaintStatus::Closed),
            _ => Err(format!("Invalid complaint status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintRecord {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub description: String,
    pub location: String,
    pub department: String,
    pub status: ComplaintStatus,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What an employee sees of their own complaints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeComplaintView {
    pub id: Uuid,
    pub description: String,
    pub date: String,
    pub status: ComplaintStatus,
    pub remarks: String,
}

impl From<&ComplaintRecord> for EmployeeComplaintView {
    fn from(c: &ComplaintRecord) -> Self {
        Self {
            id: c.id,
            description: c.description.clone(),
            date: c.created_at.format("%Y-%m-%d").to_string(),
            status: c.status,
            remarks: c.remarks.clone(),
        }
    }
}

/// Admin listing row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminComplaintView {
    pub id: Uuid,
    pub employee_name: String,
    pub location: String,
    pub department: String,
    pub description: String,
    pub date: String,
    pub status: ComplaintStatus,
    pub remarks: String,
}

impl AdminComplaintView {
    pub fn new(c: &ComplaintRecord, employee_name: Option<String>) -> Self {
        Self {
            id: c.id,
            employee_name: employee_name.unwrap_or_else(|| "Unknown".to_string()),
            location: c.location.clone(),
            department: c.department.clone(),
            description: c.description.clone(),
            date: c.created_at.format("%Y-%m-%d").to_string(),
            status: c.status,
            remarks: c.remarks.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateComplaintRequest {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloseComplaintRequest {
    #[serde(default)]
    pub remarks: Option<String>,
}

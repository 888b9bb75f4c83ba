//! Activity log models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ACTIVITY_IP_APPLICATION: &str = "IP Application";
pub const ACTIVITY_IP_ALLOCATION: &str = "IP Allocation";
pub const ACTIVITY_COMPLAINT: &str = "Complaint";
pub const ACTIVITY_COMPLAINT_CLOSED: &str = "Complaint Closed";

/// Immutable audit entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: Uuid,
    pub employee_id: Uuid,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub description: String,
    pub location: String,
    pub department: String,
    pub created_at: DateTime<Utc>,
}

/// Entry to append
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub employee_id: Uuid,
    pub activity_type: String,
    pub description: String,
    pub location: String,
    pub department: String,
}

impl NewActivity {
    pub fn new(
        employee_id: Uuid,
        activity_type: &str,
        description: impl Into<String>,
        location: &str,
        department: &str,
    ) -> Self {
        Self {
            employee_id,
            activity_type: activity_type.to_string(),
            description: description.into(),
            location: location.to_string(),
            department: department.to_string(),
        }
    }
}

/// Activity joined with the employee it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityWithEmployee {
    #[serde(flatten)]
    pub activity: ActivityRecord,
    pub employee_name: Option<String>,
    pub employee_email: Option<String>,
}

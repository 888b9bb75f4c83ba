//! Complaint workflow: `Open -> Closed`, once.

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{
    db::{ActivityRepository, ComplaintRepository, UserRepository},
    models::{
        AdminComplaintView, ComplaintRecord, ComplaintStatus, EmployeeComplaintView, NewActivity,
        ACTIVITY_COMPLAINT, ACTIVITY_COMPLAINT_CLOSED,
    },
    utils::{validation::non_blank, IpamError, IpamResult},
};

const SUMMARY_CHARS: usize = 50;

pub struct ComplaintService {
    pool: SqlitePool,
}

impl ComplaintService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// File a complaint at the employee's own site
    pub async fn file_complaint(
        &self,
        employee_id: Uuid,
        description: Option<&str>,
    ) -> IpamResult<ComplaintRecord> {
        let description = non_blank(description)
            .ok_or_else(|| IpamError::InvalidFormat("Description is required".to_string()))?;

        let employee = UserRepository::new(&self.pool)
            .get_by_id(employee_id)
            .await?
            .ok_or_else(|| IpamError::NotFound("Current user not found".to_string()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| IpamError::Storage(e.into()))?;
        let complaint = ComplaintRepository::insert(
            &mut *tx,
            employee_id,
            description,
            &employee.location,
            &employee.department,
        )
        .await?;
        ActivityRepository::append(
            &mut *tx,
            &NewActivity::new(
                employee_id,
                ACTIVITY_COMPLAINT,
                format!("Submitted complaint: {}...", summary(description)),
                &employee.location,
                &employee.department,
            ),
        )
        .await?;
        tx.commit().await.map_err(|e| IpamError::Storage(e.into()))?;

        info!(complaint_id = %complaint.id, employee_id = %employee_id, "Complaint filed");
        Ok(complaint)
    }

    /// Close an open complaint with the admin's remarks
    pub async fn close(&self, complaint_id: Uuid, remarks: Option<&str>) -> IpamResult<()> {
        let complaint = ComplaintRepository::new(&self.pool)
            .get_by_id(complaint_id)
            .await?
            .ok_or_else(|| IpamError::NotFound("Complaint not found".to_string()))?;

        if complaint.status == ComplaintStatus::Closed {
            return Err(IpamError::AlreadyClosed(
                "Complaint is already closed".to_string(),
            ));
        }
        let remarks = non_blank(remarks).ok_or_else(|| {
            IpamError::InvalidFormat("Remarks are required to close a complaint".to_string())
        })?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| IpamError::Storage(e.into()))?;
        if !ComplaintRepository::close(&mut *tx, complaint.id, remarks).await? {
            return Err(IpamError::AlreadyClosed(
                "Complaint is already closed".to_string(),
            ));
        }
        ActivityRepository::append(
            &mut *tx,
            &NewActivity::new(
                complaint.employee_id,
                ACTIVITY_COMPLAINT_CLOSED,
                format!("Complaint {} closed by admin: {}", complaint.id, remarks),
                &complaint.location,
                &complaint.department,
            ),
        )
        .await?;
        tx.commit().await.map_err(|e| IpamError::Storage(e.into()))?;

        info!(complaint_id = %complaint.id, "Complaint closed");
        Ok(())
    }

    /// Own complaints, newest first
    pub async fn list_for_employee(&self, employee_id: Uuid) -> IpamResult<Vec<EmployeeComplaintView>> {
        Ok(ComplaintRepository::new(&self.pool)
            .list_by_employee(employee_id)
            .await?
            .iter()
            .map(EmployeeComplaintView::from)
            .collect())
    }

    pub async fn list_all(&self) -> IpamResult<Vec<AdminComplaintView>> {
        Ok(ComplaintRepository::new(&self.pool)
            .list_all()
            .await?
            .into_iter()
            .map(|(complaint, name)| AdminComplaintView::new(&complaint, name))
            .collect())
    }
}

fn summary(description: &str) -> String {
    description.chars().take(SUMMARY_CHARS).collect()
}

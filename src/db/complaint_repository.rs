//! Complaint repository

use anyhow::{Context, Result};
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::{now_timestamp, parse_db_timestamp, parse_uuid};
use crate::models::{ComplaintRecord, ComplaintStatus};

const COMPLAINT_COLUMNS: &str =
    "id, employee_id, description, location, department, status, remarks, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ComplaintRow {
    id: String,
    employee_id: String,
    description: String,
    location: String,
    department: String,
    status: String,
    remarks: String,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ComplaintJoinRow {
    #[sqlx(flatten)]
    complaint: ComplaintRow,
    employee_name: Option<String>,
}

pub struct ComplaintRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ComplaintRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<ComplaintRecord>> {
        let sql = format!("SELECT {} FROM complaints WHERE id = ?", COMPLAINT_COLUMNS);
        let row = sqlx::query_as::<_, ComplaintRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await
            .context("Failed to fetch complaint")?;

        Ok(row.map(row_to_complaint))
    }

    pub async fn list_by_employee(&self, employee_id: Uuid) -> Result<Vec<ComplaintRecord>> {
        let sql = format!(
            "SELECT {} FROM complaints WHERE employee_id = ? ORDER BY created_at DESC",
            COMPLAINT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ComplaintRow>(&sql)
            .bind(employee_id.to_string())
            .fetch_all(self.pool)
            .await
            .context("Failed to list complaints")?;

        Ok(rows.into_iter().map(row_to_complaint).collect())
    }

    /// All complaints with the filing employee's name, newest first
    pub async fn list_all(&self) -> Result<Vec<(ComplaintRecord, Option<String>)>> {
        let rows = sqlx::query_as::<_, ComplaintJoinRow>(
            r#"
            SELECT c.id, c.employee_id, c.description, c.location, c.department, c.status, c.remarks,
                   c.created_at, c.updated_at, u.name AS employee_name
            FROM complaints c
            LEFT JOIN users u ON u.id = c.employee_id
            ORDER BY c.created_at DESC
            "#,
        )
        .fetch_all(self.pool)
        .await
        .context("Failed to list complaints")?;

        Ok(rows
            .into_iter()
            .map(|row| (row_to_complaint(row.complaint), row.employee_name))
            .collect())
    }

    pub async fn insert<'e, E>(
        executor: E,
        employee_id: Uuid,
        description: &str,
        location: &str,
        department: &str,
    ) -> Result<ComplaintRecord>
    where
        E: SqliteExecutor<'e>,
    {
        let id = Uuid::new_v4();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO complaints (id, employee_id, description, location, department, status, remarks, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'Open', '', ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(employee_id.to_string())
        .bind(description)
        .bind(location)
        .bind(department)
        .bind(&now)
        .bind(&now)
        .execute(executor)
        .await
        .context("Failed to insert complaint")?;

        let created_at = parse_db_timestamp(&now);
        Ok(ComplaintRecord {
            id,
            employee_id,
            description: description.to_string(),
            location: location.to_string(),
            department: department.to_string(),
            status: ComplaintStatus::Open,
            remarks: String::new(),
            created_at,
            updated_at: created_at,
        })
    }

    /// Close an open complaint; `false` when it was not open
    pub async fn close<'e, E>(executor: E, id: Uuid, remarks: &str) -> Result<bool>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE complaints SET status = 'Closed', remarks = ?, updated_at = ? WHERE id = ? AND status = 'Open'",
        )
        .bind(remarks)
        .bind(now_timestamp())
        .bind(id.to_string())
        .execute(executor)
        .await
        .context("Failed to close complaint")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_complaint(row: ComplaintRow) -> ComplaintRecord {
    ComplaintRecord {
        id: parse_uuid(&row.id),
        employee_id: parse_uuid(&row.employee_id),
        description: row.description,
        location: row.location,
        department: row.department,
        status: row.status.parse().unwrap_or_default(),
        remarks: row.remarks,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    }
}

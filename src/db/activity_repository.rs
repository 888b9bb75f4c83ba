//! Activity log repository
//!
//! Insert and read only. The schema rejects updates and deletes.

use anyhow::{Context, Result};
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::{now_timestamp, parse_db_timestamp, parse_uuid};
use crate::models::{ActivityRecord, ActivityWithEmployee, NewActivity};

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: String,
    employee_id: String,
    activity_type: String,
    description: String,
    location: String,
    department: String,
    created_at: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ActivityJoinRow {
    id: String,
    employee_id: String,
    activity_type: String,
    description: String,
    location: String,
    department: String,
    created_at: String,
    employee_name: Option<String>,
    employee_email: Option<String>,
}

pub struct ActivityRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ActivityRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append<'e, E>(executor: E, activity: &NewActivity) -> Result<ActivityRecord>
    where
        E: SqliteExecutor<'e>,
    {
        let id = Uuid::new_v4();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO activities (id, employee_id, activity_type, description, location, department, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(activity.employee_id.to_string())
        .bind(&activity.activity_type)
        .bind(&activity.description)
        .bind(&activity.location)
        .bind(&activity.department)
        .bind(&now)
        .execute(executor)
        .await
        .context("Failed to append activity")?;

        Ok(ActivityRecord {
            id,
            employee_id: activity.employee_id,
            activity_type: activity.activity_type.clone(),
            description: activity.description.clone(),
            location: activity.location.clone(),
            department: activity.department.clone(),
            created_at: parse_db_timestamp(&now),
        })
    }

    /// Most recent activities for one employee, newest first
    pub async fn recent_for(&self, employee_id: Uuid, limit: i64) -> Result<Vec<ActivityRecord>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, employee_id, activity_type, description, location, department, created_at
            FROM activities
            WHERE employee_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(employee_id.to_string())
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .context("Failed to fetch recent activities")?;

        Ok(rows.into_iter().map(row_to_activity).collect())
    }

    pub async fn list_by_type(&self, activity_type: &str) -> Result<Vec<ActivityRecord>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, employee_id, activity_type, description, location, department, created_at
            FROM activities
            WHERE activity_type = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(activity_type)
        .fetch_all(self.pool)
        .await
        .context("Failed to list activities by type")?;

        Ok(rows.into_iter().map(row_to_activity).collect())
    }

    /// Every activity with its employee, newest first
    pub async fn list_all(&self) -> Result<Vec<ActivityWithEmployee>> {
        let rows = sqlx::query_as::<_, ActivityJoinRow>(
            r#"
            SELECT a.id, a.employee_id, a.activity_type, a.description, a.location, a.department, a.created_at,
                   u.name AS employee_name, u.email AS employee_email
            FROM activities a
            LEFT JOIN users u ON u.id = a.employee_id
            ORDER BY a.created_at DESC
            "#,
        )
        .fetch_all(self.pool)
        .await
        .context("Failed to list activities")?;

        Ok(rows
            .into_iter()
            .map(|row| ActivityWithEmployee {
                activity: ActivityRecord {
                    id: parse_uuid(&row.id),
                    employee_id: parse_uuid(&row.employee_id),
                    activity_type: row.activity_type,
                    description: row.description,
                    location: row.location,
                    department: row.department,
                    created_at: parse_db_timestamp(&row.created_at),
                },
                employee_name: row.employee_name,
                employee_email: row.employee_email,
            })
            .collect())
    }
}

fn row_to_activity(row: ActivityRow) -> ActivityRecord {
    ActivityRecord {
        id: parse_uuid(&row.id),
        employee_id: parse_uuid(&row.employee_id),
        activity_type: row.activity_type,
        description: row.description,
        location: row.location,
        department: row.department,
        created_at: parse_db_timestamp(&row.created_at),
    }
}

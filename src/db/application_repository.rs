//! IP application repository

use anyhow::{Context, Result};
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::{now_timestamp, parse_db_timestamp, parse_uuid};
use crate::models::{Application, ApplicationStatus, NewApplication};

const APPLICATION_COLUMNS: &str = "id, user_id, name, address, department, contact, email, location, ip_form, mac_address, antivirus, antivirus_name, operating_system, ip_address, status, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ApplicationRow {
    id: String,
    user_id: String,
    name: String,
    address: String,
    department: String,
    contact: String,
    email: String,
    location: String,
    ip_form: String,
    mac_address: Option<String>,
    antivirus: String,
    antivirus_name: Option<String>,
    operating_system: Option<String>,
    ip_address: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

pub struct ApplicationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ApplicationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Application>> {
        let sql = format!("SELECT {} FROM ip_applications WHERE id = ?", APPLICATION_COLUMNS);
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await
            .context("Failed to fetch application")?;

        Ok(row.map(row_to_application))
    }

    /// Pending applications, oldest first
    pub async fn list_pending(&self) -> Result<Vec<Application>> {
        let sql = format!(
            "SELECT {} FROM ip_applications WHERE status = 'pending' ORDER BY created_at ASC",
            APPLICATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .fetch_all(self.pool)
            .await
            .context("Failed to list pending applications")?;

        Ok(rows.into_iter().map(row_to_application).collect())
    }

    /// All of one employee's applications, newest first
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Application>> {
        let sql = format!(
            "SELECT {} FROM ip_applications WHERE user_id = ? ORDER BY created_at DESC",
            APPLICATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(user_id.to_string())
            .fetch_all(self.pool)
            .await
            .context("Failed to list applications")?;

        Ok(rows.into_iter().map(row_to_application).collect())
    }

    /// The employee's most recently allocated application
    pub async fn current_allocation(&self, user_id: Uuid) -> Result<Option<Application>> {
        let sql = format!(
            "SELECT {} FROM ip_applications WHERE user_id = ? AND status = 'allocated' ORDER BY updated_at DESC LIMIT 1",
            APPLICATION_COLUMNS
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(user_id.to_string())
            .fetch_optional(self.pool)
            .await
            .context("Failed to fetch current allocation")?;

        Ok(row.map(row_to_application))
    }

    /// Whether a not-yet-allocated application already claims this device
    pub async fn pending_mac_in_use(&self, mac_address: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM ip_applications WHERE mac_address = ? COLLATE NOCASE AND status <> 'allocated'",
        )
        .bind(mac_address)
        .fetch_one(self.pool)
        .await
        .context("Failed to check hardware address")?;

        Ok(count > 0)
    }

    /// Whether an application other than `except` holds this address
    pub async fn address_claimed(&self, ip_address: &str, except: Uuid) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM ip_applications WHERE ip_address = ? AND id <> ?")
                .bind(ip_address)
                .bind(except.to_string())
                .fetch_one(self.pool)
                .await
                .context("Failed to check address claim")?;

        Ok(count > 0)
    }

    pub async fn insert<'e, E>(executor: E, new: &NewApplication) -> Result<Application>
    where
        E: SqliteExecutor<'e>,
    {
        let id = Uuid::new_v4();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO ip_applications (id, user_id, name, address, department, contact, email, location, ip_form, mac_address, antivirus, antivirus_name, operating_system, ip_address, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, 'pending', ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(new.user_id.to_string())
        .bind(&new.name)
        .bind(&new.address)
        .bind(&new.department)
        .bind(&new.contact)
        .bind(&new.email)
        .bind(&new.location)
        .bind(&new.ip_form)
        .bind(new.mac_address.as_deref())
        .bind(&new.antivirus)
        .bind(new.antivirus_name.as_deref())
        .bind(&new.operating_system)
        .bind(&now)
        .bind(&now)
        .execute(executor)
        .await
        .context("Failed to insert application")?;

        let created_at = parse_db_timestamp(&now);
        Ok(Application {
            id,
            user_id: new.user_id,
            name: new.name.clone(),
            address: new.address.clone(),
            department: new.department.clone(),
            contact: new.contact.clone(),
            email: new.email.clone(),
            location: new.location.clone(),
            ip_form: new.ip_form.clone(),
            mac_address: new.mac_address.clone(),
            antivirus: new.antivirus.clone(),
            antivirus_name: new.antivirus_name.clone(),
            operating_system: Some(new.operating_system.clone()),
            ip_address: None,
            status: ApplicationStatus::Pending,
            created_at,
            updated_at: created_at,
        })
    }

    /// Move a pending application to allocated
    ///
    /// Returns `false` when the application is no longer pending.
    pub async fn mark_allocated<'e, E>(
        executor: E,
        id: Uuid,
        ip_address: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE ip_applications SET ip_address = ?, status = 'allocated', updated_at = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(ip_address)
        .bind(now_timestamp())
        .bind(id.to_string())
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_application(row: ApplicationRow) -> Application {
    Application {
        id: parse_uuid(&row.id),
        user_id: parse_uuid(&row.user_id),
        name: row.name,
        address: row.address,
        department: row.department,
        contact: row.contact,
        email: row.email,
        location: row.location,
        ip_form: row.ip_form,
        mac_address: row.mac_address,
        antivirus: row.antivirus,
        antivirus_name: row.antivirus_name,
        operating_system: row.operating_system,
        ip_address: row.ip_address,
        status: row.status.parse().unwrap_or_default(),
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    }
}

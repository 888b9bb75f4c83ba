//! User account repository

use anyhow::{Context, Result};
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::{now_timestamp, parse_db_timestamp, parse_uuid};
use crate::models::{Role, User};

/// First registration number handed out
pub const FIRST_REGISTRATION_NUMBER: i64 = 1000;

const USER_COLUMNS: &str = "id, name, email, password_hash, phone, designation, location, department, registration_number, role, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    phone: String,
    designation: String,
    location: String,
    department: String,
    registration_number: i64,
    role: String,
    created_at: String,
    updated_at: String,
}

/// Columns written on create
#[derive(Debug, Clone)]
pub struct UserInsert<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: &'a str,
    pub designation: &'a str,
    pub location: &'a str,
    pub department: &'a str,
    pub role: Role,
}

/// Columns written on an admin update
#[derive(Debug, Clone)]
pub struct UserUpdate<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub designation: Option<&'a str>,
    pub location: &'a str,
    pub department: &'a str,
    pub role: Option<Role>,
    pub password_hash: Option<&'a str>,
}

pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await
            .context("Failed to fetch user")?;

        Ok(row.map(row_to_user))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ? COLLATE NOCASE", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await
            .context("Failed to fetch user by email")?;

        Ok(row.map(row_to_user))
    }

    pub async fn list_all(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY registration_number", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(self.pool)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(row_to_user).collect())
    }

    pub async fn list_by_role(&self, role: Role) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE role = ? ORDER BY registration_number",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(role.as_str())
            .fetch_all(self.pool)
            .await
            .context("Failed to list users by role")?;

        Ok(rows.into_iter().map(row_to_user).collect())
    }

    /// Employees at a site, excluding one user
    pub async fn list_colleagues(
        &self,
        location: &str,
        department: &str,
        exclude: Uuid,
    ) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE location = ? AND department = ? AND role = 'employee' AND id <> ? ORDER BY registration_number",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(location)
            .bind(department)
            .bind(exclude.to_string())
            .fetch_all(self.pool)
            .await
            .context("Failed to list colleagues")?;

        Ok(rows.into_iter().map(row_to_user).collect())
    }

    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await
            .context("Failed to count users")
    }

    pub async fn count_by_role(&self, role: Role) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(self.pool)
            .await
            .context("Failed to count users by role")
    }

    /// Insert a user, assigning the next registration number
    pub async fn create(&self, user: &UserInsert<'_>) -> Result<User, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(registration_number) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        let registration_number = max.map_or(FIRST_REGISTRATION_NUMBER, |n| n + 1);

        let created = insert_user(&mut *tx, user, registration_number).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Insert a user with a fixed registration number
    pub async fn create_with_number(
        &self,
        user: &UserInsert<'_>,
        registration_number: i64,
    ) -> Result<User, sqlx::Error> {
        insert_user(self.pool, user, registration_number).await
    }

    pub async fn update(&self, id: Uuid, update: &UserUpdate<'_>) -> Result<Option<User>, sqlx::Error> {
        let now = now_timestamp();
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = ?,
                email = ?,
                phone = COALESCE(?, phone),
                designation = COALESCE(?, designation),
                location = ?,
                department = ?,
                role = COALESCE(?, role),
                password_hash = COALESCE(?, password_hash),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.name)
        .bind(update.email)
        .bind(update.phone)
        .bind(update.designation)
        .bind(update.location)
        .bind(update.department)
        .bind(update.role.map(|r| r.as_str()))
        .bind(update.password_hash)
        .bind(&now)
        .bind(id.to_string())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(row_to_user))
    }

    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(now_timestamp())
            .bind(id.to_string())
            .execute(self.pool)
            .await
            .context("Failed to update password")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }
}

async fn insert_user<'e, E>(
    executor: E,
    user: &UserInsert<'_>,
    registration_number: i64,
) -> Result<User, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = Uuid::new_v4();
    let now = now_timestamp();

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, phone, designation, location, department, registration_number, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(user.name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.phone)
    .bind(user.designation)
    .bind(user.location)
    .bind(user.department)
    .bind(registration_number)
    .bind(user.role.as_str())
    .bind(&now)
    .bind(&now)
    .execute(executor)
    .await?;

    let created_at = parse_db_timestamp(&now);
    Ok(User {
        id,
        name: user.name.to_string(),
        email: user.email.to_string(),
        password_hash: user.password_hash.to_string(),
        phone: user.phone.to_string(),
        designation: user.designation.to_string(),
        location: user.location.to_string(),
        department: user.department.to_string(),
        registration_number,
        role: user.role,
        created_at,
        updated_at: created_at,
    })
}

fn row_to_user(row: UserRow) -> User {
    User {
        id: parse_uuid(&row.id),
        name: row.name,
        email: row.email,
        password_hash: row.password_hash,
        phone: row.phone,
        designation: row.designation,
        location: row.location,
        department: row.department,
        registration_number: row.registration_number,
        role: row.role.parse().unwrap_or_default(),
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    }
}

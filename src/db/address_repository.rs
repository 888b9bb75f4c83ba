//! Address registry repository

use anyhow::{Context, Result};
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::{now_timestamp, parse_db_timestamp, parse_uuid};
use crate::models::{AddressFilter, AddressRecord, AddressStatus, HolderInfo, PoolEntry};

const ADDRESS_COLUMNS: &str = "id, ip_address, mac_address, user_name, user_email, mobile, designation, antivirus, antivirus_name, location, department, operating_system, remark, status, employee_id, created_at";

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: String,
    ip_address: String,
    mac_address: Option<String>,
    user_name: String,
    user_email: String,
    mobile: String,
    designation: Option<String>,
    antivirus: String,
    antivirus_name: Option<String>,
    location: String,
    department: String,
    operating_system: Option<String>,
    remark: Option<String>,
    status: String,
    employee_id: Option<String>,
    created_at: String,
}

pub struct AddressRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AddressRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Exact-match search; every present filter field is ANDed
    pub async fn find(&self, filter: &AddressFilter) -> Result<Vec<AddressRecord>> {
        let mut sql = format!("SELECT {} FROM ip_addresses WHERE 1 = 1", ADDRESS_COLUMNS);

        if filter.ip.is_some() {
            sql.push_str(" AND ip_address = ?");
        }
        if filter.department.is_some() {
            sql.push_str(" AND department = ?");
        }
        if filter.location.is_some() {
            sql.push_str(" AND location = ?");
        }
        sql.push_str(" ORDER BY created_at, ip_address");

        let mut q = sqlx::query_as::<_, AddressRow>(&sql);
        if let Some(ref ip) = filter.ip {
            q = q.bind(ip);
        }
        if let Some(ref department) = filter.department {
            q = q.bind(department);
        }
        if let Some(ref location) = filter.location {
            q = q.bind(location);
        }

        let rows = q
            .fetch_all(self.pool)
            .await
            .context("Failed to search address registry")?;

        Ok(rows.into_iter().map(row_to_address).collect())
    }

    pub async fn get_by_ip(&self, ip_address: &str) -> Result<Option<AddressRecord>> {
        let sql = format!("SELECT {} FROM ip_addresses WHERE ip_address = ?", ADDRESS_COLUMNS);
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(ip_address)
            .fetch_optional(self.pool)
            .await
            .context("Failed to fetch address record")?;

        Ok(row.map(row_to_address))
    }

    /// Whether any record holds this hardware address, in either separator form
    pub async fn mac_in_use(&self, mac_address: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM ip_addresses WHERE REPLACE(mac_address, '-', ':') = REPLACE(?, '-', ':') COLLATE NOCASE",
        )
        .bind(mac_address)
        .fetch_one(self.pool)
        .await
        .context("Failed to check hardware address")?;

        Ok(count > 0)
    }

    /// Addresses of every Allocated record
    pub async fn allocated_addresses(&self) -> Result<Vec<String>> {
        sqlx::query_scalar("SELECT ip_address FROM ip_addresses WHERE status = 'Allocated'")
            .fetch_all(self.pool)
            .await
            .context("Failed to list allocated addresses")
    }

    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM ip_addresses")
            .fetch_one(self.pool)
            .await
            .context("Failed to count address records")
    }

    /// Add an unallocated pool entry
    pub async fn insert_available(&self, entry: &PoolEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ip_addresses (id, ip_address, mac_address, user_name, user_email, mobile, antivirus, location, department, status, created_at)
            VALUES (?, ?, ?, 'Unallocated', 'unallocated@example.com', '0000000000', 'N', ?, ?, 'Available', ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&entry.ip_address)
        .bind(entry.mac_address.as_deref())
        .bind(&entry.location)
        .bind(&entry.department)
        .bind(now_timestamp())
        .execute(self.pool)
        .await
        .context("Failed to insert pool entry")?;

        Ok(())
    }

    /// Bind an address to a holder
    ///
    /// Inserts a new Allocated record, or takes over an existing record that
    /// is still Available. Returns `false` when the address is already
    /// Allocated. A unique violation from a concurrent writer is returned as
    /// the raw `sqlx::Error` so the caller can classify it.
    pub async fn upsert_allocated<'e, E>(
        executor: E,
        ip_address: &str,
        holder: &HolderInfo,
    ) -> Result<bool, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO ip_addresses (id, ip_address, mac_address, user_name, user_email, mobile, designation, antivirus, antivirus_name, location, department, operating_system, remark, status, employee_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'Allocated', ?, ?)
            ON CONFLICT (ip_address) DO UPDATE SET
                mac_address = excluded.mac_address,
                user_name = excluded.user_name,
                user_email = excluded.user_email,
                mobile = excluded.mobile,
                designation = excluded.designation,
                antivirus = excluded.antivirus,
                antivirus_name = excluded.antivirus_name,
                location = excluded.location,
                department = excluded.department,
                operating_system = excluded.operating_system,
                remark = excluded.remark,
                status = 'Allocated',
                employee_id = excluded.employee_id
            WHERE ip_addresses.status = 'Available'
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(ip_address)
        .bind(holder.mac_address.as_deref())
        .bind(&holder.user_name)
        .bind(&holder.user_email)
        .bind(&holder.mobile)
        .bind(holder.designation.as_deref())
        .bind(&holder.antivirus)
        .bind(holder.antivirus_name.as_deref())
        .bind(&holder.location)
        .bind(&holder.department)
        .bind(holder.operating_system.as_deref())
        .bind(holder.remark.as_deref())
        .bind(holder.employee_id.to_string())
        .bind(now_timestamp())
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_address(row: AddressRow) -> AddressRecord {
    AddressRecord {
        id: parse_uuid(&row.id),
        ip_address: row.ip_address,
        mac_address: row.mac_address,
        user_name: row.user_name,
        user_email: row.user_email,
        mobile: row.mobile,
        designation: row.designation,
        antivirus: row.antivirus,
        antivirus_name: row.antivirus_name,
        location: row.location,
        department: row.department,
        operating_system: row.operating_system,
        remark: row.remark,
        status: row.status.parse().unwrap_or(AddressStatus::Available),
        employee_id: row.employee_id.as_deref().and_then(|s| Uuid::parse_str(s).ok()),
        created_at: parse_db_timestamp(&row.created_at),
    }
}

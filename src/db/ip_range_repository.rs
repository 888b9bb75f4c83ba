//! Managed IP range repository

use std::net::Ipv4Addr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use super::{now_timestamp, parse_db_timestamp, parse_uuid};
use crate::models::{IpRange, RangeStatus};

#[derive(Debug, sqlx::FromRow)]
struct IpRangeRow {
    id: String,
    start_address: String,
    end_address: String,
    status: String,
    created_at: String,
}

pub struct IpRangeRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> IpRangeRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<IpRange>> {
        let rows = sqlx::query_as::<_, IpRangeRow>(
            "SELECT id, start_address, end_address, status, created_at FROM ip_ranges ORDER BY created_at",
        )
        .fetch_all(self.pool)
        .await
        .context("Failed to list IP ranges")?;

        Ok(rows.into_iter().filter_map(row_to_range).collect())
    }

    pub async fn insert(
        &self,
        start: Ipv4Addr,
        end: Ipv4Addr,
        status: RangeStatus,
    ) -> Result<IpRange> {
        let id = Uuid::new_v4();
        let now = now_timestamp();

        sqlx::query(
            "INSERT INTO ip_ranges (id, start_address, end_address, status, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(start.to_string())
        .bind(end.to_string())
        .bind(status.as_str())
        .bind(&now)
        .execute(self.pool)
        .await
        .context("Failed to insert IP range")?;

        Ok(IpRange {
            id,
            start_address: start,
            end_address: end,
            status,
            created_at: parse_db_timestamp(&now),
        })
    }
}

fn row_to_range(row: IpRangeRow) -> Option<IpRange> {
    let (start, end) = match (
        row.start_address.parse::<Ipv4Addr>(),
        row.end_address.parse::<Ipv4Addr>(),
    ) {
        (Ok(start), Ok(end)) => (start, end),
        _ => {
            warn!(range_id = %row.id, "Skipping IP range with unparseable bounds");
            return None;
        }
    };

    Some(IpRange {
        id: parse_uuid(&row.id),
        start_address: start,
        end_address: end,
        status: row.status.parse().unwrap_or_default(),
        created_at: parse_db_timestamp(&row.created_at),
    })
}

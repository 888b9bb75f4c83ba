//! Address registry
//!
//! Single source of truth for address-to-holder bindings. Uniqueness is
//! checked up front for a clear error and backed by the `UNIQUE` constraints
//! on `ip_addresses.ip_address` and `ip_applications.ip_address`.

use std::net::Ipv4Addr;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::{
    db::{AddressRepository, ApplicationRepository, IpRangeRepository},
    models::{AddressFilter, AddressRecord, AddressStatus, HolderInfo, IpRangeUsage},
    utils::{
        error::unique_violation_column,
        validation::{non_blank, parse_ipv4},
        IpamError, IpamResult,
    },
};

pub const DUPLICATE_ADDRESS: &str = "IP address already allocated";

pub struct AddressRegistry {
    pool: SqlitePool,
}

impl AddressRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check dotted-quad syntax, returning the trimmed address
    pub fn validate_address(address: Option<&str>) -> IpamResult<(String, Ipv4Addr)> {
        let address = non_blank(address)
            .ok_or_else(|| IpamError::InvalidFormat("IP address is required".to_string()))?;
        let parsed = parse_ipv4(address)
            .ok_or_else(|| IpamError::InvalidFormat("Invalid IP address format".to_string()))?;
        Ok((address.to_string(), parsed))
    }

    /// Fail with `DuplicateAddress` if a record or another application claims the address
    ///
    /// An `Available` pool entry does not count as a claim.
    pub async fn ensure_unclaimed(&self, address: &str, application_id: Uuid) -> IpamResult<()> {
        let existing = AddressRepository::new(&self.pool).get_by_ip(address).await?;
        if existing.is_some_and(|r| r.status == AddressStatus::Allocated) {
            return Err(IpamError::DuplicateAddress(DUPLICATE_ADDRESS.to_string()));
        }
        if ApplicationRepository::new(&self.pool)
            .address_claimed(address, application_id)
            .await?
        {
            return Err(IpamError::DuplicateAddress(DUPLICATE_ADDRESS.to_string()));
        }
        Ok(())
    }

    /// Bind an address to a holder inside the caller's transaction
    pub async fn allocate_in(
        conn: &mut SqliteConnection,
        address: &str,
        holder: &HolderInfo,
    ) -> IpamResult<()> {
        let written = AddressRepository::upsert_allocated(&mut *conn, address, holder)
            .await
            .map_err(classify_write_error)?;
        if !written {
            return Err(IpamError::DuplicateAddress(DUPLICATE_ADDRESS.to_string()));
        }
        debug!(address = %address, employee_id = %holder.employee_id, "Address record written");
        Ok(())
    }

    pub async fn find(&self, filter: &AddressFilter) -> IpamResult<Vec<AddressRecord>> {
        let filter = AddressFilter {
            ip: non_blank(filter.ip.as_deref()).map(String::from),
            department: non_blank(filter.department.as_deref()).map(String::from),
            location: non_blank(filter.location.as_deref()).map(String::from),
        };
        Ok(AddressRepository::new(&self.pool).find(&filter).await?)
    }

    pub async fn hardware_address_in_use(&self, mac_address: &str) -> IpamResult<bool> {
        Ok(AddressRepository::new(&self.pool)
            .mac_in_use(mac_address)
            .await?)
    }

    /// Managed ranges with usage computed from Allocated records
    pub async fn range_usage(&self) -> IpamResult<Vec<IpRangeUsage>> {
        let ranges = IpRangeRepository::new(&self.pool).list().await?;
        let allocated: Vec<Ipv4Addr> = AddressRepository::new(&self.pool)
            .allocated_addresses()
            .await?
            .iter()
            .filter_map(|a| parse_ipv4(a))
            .collect();

        Ok(ranges
            .iter()
            .map(|range| {
                let used = allocated.iter().filter(|a| range.contains(**a)).count() as u64;
                IpRangeUsage::new(range, used)
            })
            .collect())
    }
}

/// Translate a storage unique violation into the registry taxonomy
pub fn classify_write_error(err: sqlx::Error) -> IpamError {
    match unique_violation_column(&err).as_deref() {
        Some("ip_addresses.ip_address") | Some("ip_applications.ip_address") => {
            IpamError::DuplicateAddress(DUPLICATE_ADDRESS.to_string())
        }
        Some("ip_addresses.mac_address") | Some("ip_applications.mac_address") => {
            IpamError::DuplicateHardwareAddress("MAC address already in use".to_string())
        }
        _ => IpamError::Storage(anyhow::Error::new(err).context("Failed to write address record")),
    }
}

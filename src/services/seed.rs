//! Demo data for a fresh database (`--seed`)

use std::net::Ipv4Addr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    db::{
        user_repository::{UserInsert, FIRST_REGISTRATION_NUMBER},
        AddressRepository, ComplaintRepository, IpRangeRepository, UserRepository,
    },
    models::{HolderInfo, PoolEntry, RangeStatus, Role, User, SITES},
    services::auth::AuthService,
};

const ADMIN_EMAIL: &str = "admin@nic.com";
const ADMIN_PASSWORD: &str = "admin123";
const EMPLOYEE_PASSWORD: &str = "password123";
const ADMIN_SITE: &str = "NIC Office";

/// Populate an empty database; returns `false` when users already exist
pub async fn seed_demo_data(pool: &SqlitePool) -> Result<bool> {
    let users = UserRepository::new(pool);
    if users.count().await? > 0 {
        info!("Database already has users, skipping seed");
        return Ok(false);
    }

    let admin_hash = AuthService::hash_password(ADMIN_PASSWORD)?;
    users
        .create_with_number(
            &UserInsert {
                name: "Admin User",
                email: ADMIN_EMAIL,
                password_hash: &admin_hash,
                phone: "",
                designation: "Administrator",
                location: ADMIN_SITE,
                department: ADMIN_SITE,
                role: Role::Admin,
            },
            FIRST_REGISTRATION_NUMBER,
        )
        .await
        .context("Failed to seed admin")?;

    // One hash for every demo employee keeps seeding fast
    let employee_hash = AuthService::hash_password(EMPLOYEE_PASSWORD)?;
    let mut employees: Vec<User> = Vec::new();
    let mut number = FIRST_REGISTRATION_NUMBER + 1;
    for site in SITES {
        for department in site.departments {
            let name = format!("Employee {} {}", site.location, department);
            let email = format!("employee{}@example.com", number);
            let phone = format!("987654{:04}", number % 10_000);
            let user = users
                .create_with_number(
                    &UserInsert {
                        name: &name,
                        email: &email,
                        password_hash: &employee_hash,
                        phone: &phone,
                        designation: "Staff",
                        location: site.location,
                        department,
                        role: Role::Employee,
                    },
                    number,
                )
                .await
                .with_context(|| format!("Failed to seed employee {}", email))?;
            employees.push(user);
            number += 1;
        }
    }

    let ranges = IpRangeRepository::new(pool);
    for (third, status) in [
        (1, RangeStatus::Active),
        (2, RangeStatus::Inactive),
        (3, RangeStatus::Active),
    ] {
        ranges
            .insert(
                Ipv4Addr::new(192, 168, third, 0),
                Ipv4Addr::new(192, 168, third, 255),
                status,
            )
            .await?;
    }

    for (employee, text) in employees
        .iter()
        .zip(["Network issue in office", "Printer not working", "Slow internet speed"])
    {
        ComplaintRepository::insert(pool, employee.id, text, &employee.location, &employee.department)
            .await?;
    }

    let addresses = AddressRepository::new(pool);
    for (ip, mac) in [("192.168.1.2", "00:1B:44:11:3A:B8"), ("192.168.1.4", "00:1B:44:11:3A:BA")] {
        addresses
            .insert_available(&PoolEntry {
                ip_address: ip.to_string(),
                mac_address: Some(mac.to_string()),
                location: ADMIN_SITE.to_string(),
                department: ADMIN_SITE.to_string(),
            })
            .await?;
    }
    for (employee, (ip, mac)) in employees
        .iter()
        .zip([("192.168.1.1", "00:1B:44:11:3A:B7"), ("192.168.1.3", "00:1B:44:11:3A:B9")])
    {
        AddressRepository::upsert_allocated(pool, ip, &seeded_holder(employee, mac))
            .await
            .with_context(|| format!("Failed to seed address {}", ip))?;
    }

    info!(employees = employees.len(), admin = %ADMIN_EMAIL, "Database seeded");
    Ok(true)
}

fn seeded_holder(employee: &User, mac: &str) -> HolderInfo {
    HolderInfo {
        employee_id: employee.id,
        mac_address: Some(mac.to_string()),
        user_name: employee.name.clone(),
        user_email: employee.email.clone(),
        mobile: employee.phone.clone(),
        designation: Some(employee.designation.clone()),
        antivirus: "N".to_string(),
        antivirus_name: None,
        location: employee.location.clone(),
        department: employee.department.clone(),
        operating_system: Some("Windows".to_string()),
        remark: None,
    }
}

//! IP application workflow
//!
//! `pending -> allocated`, nothing else. Every precondition is checked before
//! the first write; allocation runs its three writes in one transaction.

use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::{ActivityRepository, ApplicationRepository, UserRepository},
    models::{
        Application, ApplicationFields, ApplicationStatus, CurrentAllocation, HolderInfo,
        NewActivity, NewApplication, Role, ACTIVITY_IP_ALLOCATION, ACTIVITY_IP_APPLICATION,
    },
    services::registry::{classify_write_error, AddressRegistry},
    utils::{
        validation::{non_blank, normalize_mac, validate_email, validate_mac, validate_phone},
        IpamError, IpamResult,
    },
};

const DEFAULT_OPERATING_SYSTEM: &str = "Windows";
const DEFAULT_ANTIVIRUS: &str = "N";

pub struct ApplicationService {
    pool: SqlitePool,
    registry: AddressRegistry,
}

impl ApplicationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            registry: AddressRegistry::new(pool.clone()),
            pool,
        }
    }

    /// File a new application for the calling employee
    pub async fn submit(
        &self,
        employee_id: Uuid,
        fields: &ApplicationFields,
        uploaded_form: Option<&str>,
    ) -> IpamResult<Application> {
        let ip_form = non_blank(uploaded_form).ok_or_else(|| {
            IpamError::InvalidFormat("IP application form (PDF) is required".to_string())
        })?;
        let mut new = check_fields(fields)?;

        let employee = UserRepository::new(&self.pool)
            .get_by_id(employee_id)
            .await?
            .ok_or_else(|| IpamError::NotFound("Current user not found".to_string()))?;
        if employee.role != Role::Employee {
            return Err(IpamError::Forbidden(
                "Only employees can apply for IPs".to_string(),
            ));
        }
        if new.location != employee.location || new.department != employee.department {
            return Err(IpamError::Forbidden(
                "Can only apply for IP in your own location and department".to_string(),
            ));
        }

        if let Some(ref mac) = new.mac_address {
            let pending_claim = ApplicationRepository::new(&self.pool)
                .pending_mac_in_use(mac)
                .await?;
            if pending_claim || self.registry.hardware_address_in_use(mac).await? {
                return Err(IpamError::DuplicateHardwareAddress(
                    "MAC address already in use".to_string(),
                ));
            }
        }

        new.user_id = employee_id;
        new.ip_form = ip_form.to_string();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| IpamError::Storage(e.into()))?;
        let application = ApplicationRepository::insert(&mut *tx, &new).await?;
        ActivityRepository::append(
            &mut *tx,
            &NewActivity::new(
                employee_id,
                ACTIVITY_IP_APPLICATION,
                "Submitted new IP application",
                &new.location,
                &new.department,
            ),
        )
        .await?;
        tx.commit().await.map_err(|e| IpamError::Storage(e.into()))?;

        info!(application_id = %application.id, employee_id = %employee_id, "IP application submitted");
        Ok(application)
    }

    /// Assign an address to a pending application
    pub async fn allocate(
        &self,
        application_id: Uuid,
        address: Option<&str>,
    ) -> IpamResult<Application> {
        let applications = ApplicationRepository::new(&self.pool);
        let application = applications
            .get_by_id(application_id)
            .await?
            .ok_or_else(|| IpamError::NotFound("Application not found".to_string()))?;

        if application.status == ApplicationStatus::Allocated {
            return Err(IpamError::AlreadyAllocated(
                "Application already has an allocated IP".to_string(),
            ));
        }

        let (address, _) = AddressRegistry::validate_address(address)?;
        self.registry
            .ensure_unclaimed(&address, application.id)
            .await?;

        let holder = HolderInfo {
            employee_id: application.user_id,
            mac_address: application.mac_address.clone(),
            user_name: application.name.clone(),
            user_email: application.email.clone(),
            mobile: application.contact.clone(),
            designation: None,
            antivirus: non_blank(Some(application.antivirus.as_str()))
                .unwrap_or(DEFAULT_ANTIVIRUS)
                .to_string(),
            antivirus_name: application.antivirus_name.clone(),
            location: application.location.clone(),
            department: application.department.clone(),
            operating_system: Some(
                non_blank(application.operating_system.as_deref())
                    .unwrap_or(DEFAULT_OPERATING_SYSTEM)
                    .to_string(),
            ),
            remark: None,
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| IpamError::Storage(e.into()))?;

        let moved = ApplicationRepository::mark_allocated(&mut *tx, application.id, &address)
            .await
            .map_err(classify_write_error)?;
        if !moved {
            warn!(application_id = %application.id, "Application left pending state concurrently");
            return Err(IpamError::AlreadyAllocated(
                "Application already has an allocated IP".to_string(),
            ));
        }

        AddressRegistry::allocate_in(&mut *tx, &address, &holder).await?;

        ActivityRepository::append(
            &mut *tx,
            &NewActivity::new(
                application.user_id,
                ACTIVITY_IP_ALLOCATION,
                format!("Allocated IP {} to {}", address, application.name),
                &application.location,
                &application.department,
            ),
        )
        .await?;

        tx.commit().await.map_err(classify_write_error)?;

        info!(
            application_id = %application.id,
            address = %address,
            employee_id = %application.user_id,
            "IP allocated"
        );

        Ok(Application {
            ip_address: Some(address),
            status: ApplicationStatus::Allocated,
            ..application
        })
    }

    /// Pending applications, oldest first
    pub async fn pending(&self) -> IpamResult<Vec<Application>> {
        Ok(ApplicationRepository::new(&self.pool).list_pending().await?)
    }

    pub async fn history(&self, employee_id: Uuid) -> IpamResult<Vec<Application>> {
        Ok(ApplicationRepository::new(&self.pool)
            .list_by_user(employee_id)
            .await?)
    }

    pub async fn current(&self, employee_id: Uuid) -> IpamResult<CurrentAllocation> {
        ApplicationRepository::new(&self.pool)
            .current_allocation(employee_id)
            .await?
            .map(|app| CurrentAllocation::from(&app))
            .ok_or_else(|| IpamError::NotFound("No allocated IP application found".to_string()))
    }
}

/// Field rules for a submission; user and form are filled in by the caller
fn check_fields(fields: &ApplicationFields) -> IpamResult<NewApplication> {
    let required = [
        non_blank(fields.name.as_deref()),
        non_blank(fields.address.as_deref()),
        non_blank(fields.department.as_deref()),
        non_blank(fields.contact.as_deref()),
        non_blank(fields.email.as_deref()),
        non_blank(fields.location.as_deref()),
    ];
    let [Some(name), Some(address), Some(department), Some(contact), Some(email), Some(location)] =
        required
    else {
        return Err(IpamError::InvalidFormat(
            "Name, address, department, contact, email, and location are required".to_string(),
        ));
    };

    if !validate_email(email) {
        return Err(IpamError::InvalidFormat("Invalid email format".to_string()));
    }
    if !validate_phone(contact) {
        return Err(IpamError::InvalidFormat("Contact must be 10 digits".to_string()));
    }

    let antivirus = non_blank(fields.antivirus.as_deref()).unwrap_or(DEFAULT_ANTIVIRUS);
    if antivirus != "Y" && antivirus != "N" {
        return Err(IpamError::InvalidFormat("Antivirus must be Y or N".to_string()));
    }

    let mac_address = match non_blank(fields.mac_address.as_deref()) {
        Some(mac) if validate_mac(mac) => Some(normalize_mac(mac)),
        Some(_) => {
            return Err(IpamError::InvalidFormat(
                "Invalid MAC address format".to_string(),
            ))
        }
        None => None,
    };

    Ok(NewApplication {
        user_id: Uuid::nil(),
        name: name.to_string(),
        address: address.to_string(),
        department: department.to_string(),
        contact: contact.to_string(),
        email: email.to_string(),
        location: location.to_string(),
        ip_form: String::new(),
        mac_address,
        antivirus: antivirus.to_string(),
        antivirus_name: non_blank(fields.antivirus_name.as_deref()).map(String::from),
        operating_system: non_blank(fields.operating_system.as_deref())
            .unwrap_or(DEFAULT_OPERATING_SYSTEM)
            .to_string(),
    })
}

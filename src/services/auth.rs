//! Authentication service
//!
//! Credential store: password hashing with Argon2, registration, role-scoped
//! login, admin user management and directory queries.

use std::collections::BTreeMap;

use anyhow::Result;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{AuthConfig, BootstrapAdminConfig},
    db::{
        user_repository::{UserInsert, UserUpdate},
        UserRepository,
    },
    models::{
        CreateUserRequest, DirectoryEntry, RegisterRequest, Role, UpdateUserRequest, User,
        UserPublic,
    },
    utils::{
        error::unique_violation_column,
        validation::{validate_email, validate_phone},
        AppError, AppResult,
    },
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Authentication service for user management
pub struct AuthService {
    pool: SqlitePool,
    password_min_length: usize,
}

impl AuthService {
    pub fn new(pool: SqlitePool, config: &AuthConfig) -> Self {
        Self {
            pool,
            password_min_length: config.password_min_length,
        }
    }

    /// Hash a password using Argon2id
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();
        Ok(password_hash)
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    fn repo(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool)
    }

    fn check_password(&self, password: &str) -> AppResult<()> {
        if password.trim().chars().count() < self.password_min_length {
            return Err(AppError::ValidationError(format!(
                "Password must be at least {} characters",
                self.password_min_length
            )));
        }
        Ok(())
    }

    /// Register a new employee account
    pub async fn register_employee(&self, request: &RegisterRequest) -> AppResult<User> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        if !validate_email(&email) {
            return Err(AppError::ValidationError("Invalid email format".to_string()));
        }
        let phone = request.phone.trim();
        if !validate_phone(phone) {
            return Err(AppError::ValidationError(
                "Phone number must be 10 digits".to_string(),
            ));
        }
        self.check_password(&request.password)?;

        if self.repo().get_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("User already exists"));
        }

        let password_hash = Self::hash_password(request.password.trim())?;
        let user = self
            .repo()
            .create(&UserInsert {
                name: request.name.trim(),
                email: &email,
                password_hash: &password_hash,
                phone,
                designation: request.designation.trim(),
                location: request.location.trim(),
                department: request.department.trim(),
                role: Role::Employee,
            })
            .await
            .map_err(user_write_error)?;

        info!(user_id = %user.id, registration_number = user.registration_number, "Employee registered");
        Ok(user)
    }

    /// Role-scoped login
    ///
    /// Unknown email, wrong role and wrong password are indistinguishable.
    pub async fn login(&self, email: &str, password: &str, role: Role) -> AppResult<User> {
        let email = email.trim();
        if email.is_empty() || password.trim().is_empty() {
            return Err(AppError::bad_request("Email and password are required"));
        }

        let user = self
            .repo()
            .get_by_email(email)
            .await?
            .filter(|u| u.role == role)
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !Self::verify_password(password.trim(), &user.password_hash)? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.repo()
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.repo().get_by_email(email.trim()).await?)
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserPublic>> {
        Ok(self
            .repo()
            .list_all()
            .await?
            .into_iter()
            .map(UserPublic::from)
            .collect())
    }

    pub async fn list_employees(&self) -> AppResult<Vec<User>> {
        Ok(self.repo().list_by_role(Role::Employee).await?)
    }

    /// Employees grouped under `"{location}_{department}"`
    pub async fn departments(&self) -> AppResult<BTreeMap<String, Vec<DirectoryEntry>>> {
        let mut grouped: BTreeMap<String, Vec<DirectoryEntry>> = BTreeMap::new();
        for user in self.repo().list_by_role(Role::Employee).await? {
            grouped
                .entry(format!("{}_{}", user.location, user.department))
                .or_default()
                .push(DirectoryEntry::from(&user));
        }
        Ok(grouped)
    }

    /// Other employees at the given site
    pub async fn colleagues(
        &self,
        caller: Uuid,
        location: &str,
        department: &str,
    ) -> AppResult<Vec<DirectoryEntry>> {
        let (location, department) = (location.trim(), department.trim());
        if location.is_empty() || department.is_empty() {
            return Err(AppError::bad_request("Location and department are required"));
        }

        Ok(self
            .repo()
            .list_colleagues(location, department, caller)
            .await?
            .iter()
            .map(DirectoryEntry::from)
            .collect())
    }

    pub async fn create_user(&self, request: &CreateUserRequest) -> AppResult<User> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();
        if !validate_email(&email) {
            return Err(AppError::ValidationError("Invalid email format".to_string()));
        }
        let phone = request.phone.as_deref().map(str::trim).unwrap_or("");
        if !phone.is_empty() && !validate_phone(phone) {
            return Err(AppError::ValidationError(
                "Phone number must be 10 digits".to_string(),
            ));
        }
        self.check_password(&request.password)?;

        if self.repo().get_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("User with this email already exists"));
        }

        let password_hash = Self::hash_password(request.password.trim())?;
        let user = self
            .repo()
            .create(&UserInsert {
                name: request.name.trim(),
                email: &email,
                password_hash: &password_hash,
                phone,
                designation: request.designation.as_deref().map(str::trim).unwrap_or(""),
                location: request.location.trim(),
                department: request.department.trim(),
                role: request.role.unwrap_or_default(),
            })
            .await
            .map_err(user_write_error)?;

        info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn update_user(&self, id: Uuid, request: &UpdateUserRequest) -> AppResult<User> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();
        if !validate_email(&email) {
            return Err(AppError::ValidationError("Invalid email format".to_string()));
        }
        let phone = request
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        if let Some(phone) = phone {
            if !validate_phone(phone) {
                return Err(AppError::ValidationError(
                    "Phone Number must be of 10 Digits".to_string(),
                ));
            }
        }
        let password = request
            .password
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        if let Some(password) = password {
            self.check_password(password)?;
        }

        let existing = self.get_user(id).await?;
        if existing.email != email && self.repo().get_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("User with this email already exists"));
        }

        let password_hash = password.map(Self::hash_password).transpose()?;
        let updated = self
            .repo()
            .update(
                id,
                &UserUpdate {
                    name: request.name.trim(),
                    email: &email,
                    phone,
                    designation: request.designation.as_deref().map(str::trim),
                    location: request.location.trim(),
                    department: request.department.trim(),
                    role: request.role,
                    password_hash: password_hash.as_deref(),
                },
            )
            .await
            .map_err(user_write_error)?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        info!(user_id = %id, "User updated");
        Ok(updated)
    }

    pub async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        if !self.repo().delete(id).await? {
            return Err(AppError::not_found("User not found"));
        }
        info!(user_id = %id, "User deleted");
        Ok(())
    }

    pub async fn set_password(&self, id: Uuid, new_password: &str) -> AppResult<()> {
        self.check_password(new_password)?;
        let hash = Self::hash_password(new_password.trim())?;
        if !self.repo().update_password(id, &hash).await? {
            return Err(AppError::not_found("User not found"));
        }
        Ok(())
    }

    /// Create the configured admin when no admin exists yet
    pub async fn ensure_bootstrap_admin(&self, admin: &BootstrapAdminConfig) -> AppResult<bool> {
        if self.repo().count_by_role(Role::Admin).await? > 0 {
            return Ok(false);
        }

        let password_hash = Self::hash_password(&admin.password)?;
        let user = self
            .repo()
            .create(&UserInsert {
                name: &admin.name,
                email: &admin.email.to_lowercase(),
                password_hash: &password_hash,
                phone: "",
                designation: "Administrator",
                location: &admin.location,
                department: &admin.department,
                role: Role::Admin,
            })
            .await
            .map_err(user_write_error)?;

        info!(user_id = %user.id, email = %user.email, "Bootstrap admin created");
        Ok(true)
    }
}

fn user_write_error(err: sqlx::Error) -> AppError {
    match unique_violation_column(&err).as_deref() {
        Some("users.email") => AppError::conflict("User with this email already exists"),
        Some(_) => AppError::conflict("User already exists"),
        None => AppError::from(err),
    }
}

//! One-time password reset
//!
//! Codes live only in an expiring in-process cache, hashed with SHA-256 and
//! keyed by the lower-cased email. A restart drops every pending code.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rand::{rngs::OsRng, Rng};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    config::{AuthConfig, OtpConfig},
    models::Role,
    services::{auth::AuthService, mail::Mailer},
    utils::{validation::validate_email, AppError, AppResult},
};

pub const OTP_SUBJECT: &str = "NIC Bilaspur Password Reset OTP";

/// Expiring store of hashed reset codes
#[derive(Clone)]
pub struct OtpStore {
    codes: Cache<String, String>,
    ttl: Duration,
}

impl OtpStore {
    pub fn new(config: &OtpConfig) -> Self {
        let ttl = Duration::from_secs(config.ttl_secs);
        Self {
            codes: Cache::builder()
                .max_capacity(config.max_entries)
                .time_to_live(ttl)
                .build(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn digest(code: &str) -> String {
        hex::encode(Sha256::digest(code.trim().as_bytes()))
    }

    pub async fn put(&self, email: &str, code: &str) {
        self.codes.insert(Self::key(email), Self::digest(code)).await;
    }

    /// `None` when no live code exists, otherwise whether it matches
    pub async fn check(&self, email: &str, code: &str) -> Option<bool> {
        self.codes
            .get(&Self::key(email))
            .await
            .map(|stored| stored == Self::digest(code))
    }

    pub async fn remove(&self, email: &str) {
        self.codes.invalidate(&Self::key(email)).await;
    }
}

/// Six decimal digits, zero padded
pub fn generate_code() -> String {
    format!("{:06}", OsRng.gen_range(0..1_000_000u32))
}

pub struct PasswordResetService {
    auth: AuthService,
    store: OtpStore,
    mailer: Arc<dyn Mailer>,
}

impl PasswordResetService {
    pub fn new(
        pool: SqlitePool,
        auth_config: &AuthConfig,
        store: OtpStore,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            auth: AuthService::new(pool, auth_config),
            store,
            mailer,
        }
    }

    fn require_email(email: Option<&str>) -> AppResult<&str> {
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::bad_request("Email is required"))?;
        if !validate_email(email) {
            return Err(AppError::bad_request("Invalid email format"));
        }
        Ok(email)
    }

    /// Issue a code to an employee's mailbox
    pub async fn request_reset(&self, email: Option<&str>) -> AppResult<()> {
        let email = Self::require_email(email)?;
        let user = self
            .auth
            .get_user_by_email(email)
            .await?
            .filter(|u| u.role == Role::Employee)
            .ok_or_else(|| AppError::not_found("No employee found with this email"))?;

        let code = generate_code();
        self.store.put(&user.email, &code).await;

        let minutes = (self.store.ttl().as_secs() / 60).max(1);
        let body = format!(
            "Your OTP for password reset is: {}. It is valid for {} minutes.",
            code, minutes
        );
        if let Err(e) = self.mailer.send(&user.email, OTP_SUBJECT, &body).await {
            warn!(user_id = %user.id, error = %e, "Failed to send OTP email");
            self.store.remove(&user.email).await;
            return Err(AppError::internal("Failed to send OTP"));
        }

        info!(user_id = %user.id, "Password reset OTP issued");
        Ok(())
    }

    /// Check a code without consuming it
    pub async fn verify(&self, email: Option<&str>, code: Option<&str>) -> AppResult<()> {
        let email = Self::require_email(email)?;
        let code = code
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::bad_request("OTP is required"))?;

        match self.store.check(email, code).await {
            None => Err(AppError::bad_request("No OTP found for this email")),
            Some(false) => Err(AppError::bad_request("Invalid OTP")),
            Some(true) => Ok(()),
        }
    }

    /// Verify, set the new password, then burn the code
    pub async fn reset(
        &self,
        email: Option<&str>,
        code: Option<&str>,
        new_password: Option<&str>,
    ) -> AppResult<()> {
        self.verify(email, code).await?;
        let email = Self::require_email(email)?;
        let new_password = new_password
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| AppError::bad_request("New password is required"))?;

        let user = self
            .auth
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        self.auth.set_password(user.id, new_password).await?;
        self.store.remove(email).await;

        info!(user_id = %user.id, "Password reset via OTP");
        Ok(())
    }
}

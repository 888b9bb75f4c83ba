//! NIC Intranet Library
//!
//! IP address lifecycle, network discovery, complaints and staff directory
//! for a district NIC office intranet.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use db::DbPool;
pub use middleware::{auth_middleware, AuthUser, Claims};
use services::{DiscoveryScanner, FileStore, Mailer, OtpStore, ReachabilityProber};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Database connection pool
    pub db: DbPool,
    /// Reachability prober for registry searches
    pub prober: Arc<ReachabilityProber>,
    /// Single-flight subnet scanner
    pub scanner: Arc<DiscoveryScanner>,
    /// Pending password reset codes
    pub otp: OtpStore,
    pub mailer: Arc<dyn Mailer>,
    /// Uploaded application forms
    pub files: FileStore,
}

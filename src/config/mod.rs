//! Configuration management
//!
//! YAML-based configuration with:
//! - Environment variable overrides
//! - Multiple configuration file locations
//! - Default values for every setting
//! - Network probing and discovery scan settings

use std::net::Ipv4Addr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    /// SMTP relay (when absent, OTP mails are only logged)
    #[serde(default)]
    pub mail: Option<MailConfig>,
    /// Administrator created on first start when no admin exists
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry")]
    pub token_expiry_hours: u64,
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,
}

fn default_token_expiry() -> u64 {
    24
}

fn default_password_min_length() -> usize {
    6
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Log output target (console, file or both)
    #[serde(default = "default_log_target")]
    pub target: LogTarget,
    /// Directory for log files (used when target is "file" or "both")
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
    #[serde(default = "default_log_rotation")]
    pub daily_rotation: bool,
}

/// Log output target
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Console,
    File,
    Both,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_target() -> LogTarget {
    LogTarget::Console
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/nic-intranet")
}

fn default_log_prefix() -> String {
    "nic-intranet".to_string()
}

fn default_log_rotation() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: default_log_target(),
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            daily_rotation: default_log_rotation(),
        }
    }
}

/// Reachability probing and discovery scan settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// ICMP echo timeout per address
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    /// Upper bound for the native ping fallback subprocess
    #[serde(default = "default_fallback_timeout")]
    pub fallback_timeout_secs: u64,
    /// Maximum number of probes in flight for a single search
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,
    /// Native ping binary used by the fallback path
    #[serde(default = "default_ping_command")]
    pub ping_command: String,
    /// Subnet swept by the discovery scan (CIDR notation)
    #[serde(default = "default_scan_subnet")]
    pub scan_subnet: String,
    #[serde(default = "default_scan_command")]
    pub scan_command: String,
    #[serde(default = "default_scan_args")]
    pub scan_args: Vec<String>,
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,
}

fn default_probe_timeout() -> u64 {
    2
}

fn default_fallback_timeout() -> u64 {
    5
}

fn default_max_concurrent_probes() -> usize {
    32
}

fn default_ping_command() -> String {
    "ping".to_string()
}

fn default_scan_subnet() -> String {
    "10.132.72.0/24".to_string()
}

fn default_scan_command() -> String {
    "nmap".to_string()
}

fn default_scan_args() -> Vec<String> {
    vec!["-sP".to_string()]
}

fn default_scan_timeout() -> u64 {
    120
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout(),
            fallback_timeout_secs: default_fallback_timeout(),
            max_concurrent_probes: default_max_concurrent_probes(),
            ping_command: default_ping_command(),
            scan_subnet: default_scan_subnet(),
            scan_command: default_scan_command(),
            scan_args: default_scan_args(),
            scan_timeout_secs: default_scan_timeout(),
        }
    }
}

/// Uploaded application form storage
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_upload_max_bytes")]
    pub max_bytes: usize,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_upload_max_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_bytes: default_upload_max_bytes(),
        }
    }
}

/// One-time password settings for password reset
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    #[serde(default = "default_otp_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_otp_max_entries")]
    pub max_entries: u64,
}

fn default_otp_ttl() -> u64 {
    300
}

fn default_otp_max_entries() -> u64 {
    10_000
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_otp_ttl(),
            max_entries: default_otp_max_entries(),
        }
    }
}

/// SMTP relay configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    pub from: String,
}

fn default_smtp_port() -> u16 {
    587
}

/// First administrator account
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapAdminConfig {
    #[serde(default = "default_admin_name")]
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_site")]
    pub location: String,
    #[serde(default = "default_admin_site")]
    pub department: String,
}

fn default_admin_name() -> String {
    "Admin User".to_string()
}

fn default_admin_site() -> String {
    "NIC Office".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                workers: default_workers(),
                request_timeout_secs: None,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production-minimum-32-characters-long".to_string(),
                token_expiry_hours: default_token_expiry(),
                password_min_length: default_password_min_length(),
            },
            database: DatabaseConfig {
                url: "sqlite://./data/nic.db".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            logging: LoggingConfig::default(),
            network: NetworkConfig::default(),
            uploads: UploadConfig::default(),
            otp: OtpConfig::default(),
            mail: None,
            bootstrap_admin: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Later sources override earlier ones:
    /// 1. Default values
    /// 2. Configuration file (YAML)
    /// 3. Environment variables
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config_path = std::env::var("NIC_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(Self::find_config_file);

        let mut config = match config_path {
            Some(ref path) if path.exists() => {
                eprintln!("[CONFIG] Loading configuration from: {:?}", path);
                Self::from_file(path)?
            }
            Some(ref path) => {
                eprintln!("[CONFIG] Config file not found: {:?}, using defaults", path);
                AppConfig::default()
            }
            None => {
                eprintln!("[CONFIG] No config file found, using defaults");
                AppConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse a YAML configuration file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_norway::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            PathBuf::from("config.yaml"),
            PathBuf::from("config/config.yaml"),
            PathBuf::from("/etc/nic-intranet/config.yaml"),
            dirs::config_dir()
                .map(|p| p.join("nic-intranet/config.yaml"))
                .unwrap_or_default(),
        ];

        paths.into_iter().find(|p| p.exists())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("NIC_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("NIC_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("NIC_LOG_FORMAT") {
            self.logging.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" => LogFormat::Compact,
                _ => LogFormat::Pretty,
            };
        }

        if let Ok(subnet) = std::env::var("NIC_SCAN_SUBNET") {
            self.network.scan_subnet = subnet;
        }
        if let Ok(dir) = std::env::var("NIC_UPLOAD_DIR") {
            self.uploads.dir = PathBuf::from(dir);
        }

        // SMTP overrides create the mail section on demand
        if let Ok(host) = std::env::var("SMTP_HOST") {
            let from = std::env::var("SMTP_FROM").unwrap_or_else(|_| format!("noreply@{}", host));
            let mail = self.mail.get_or_insert_with(|| MailConfig {
                smtp_host: host.clone(),
                smtp_port: default_smtp_port(),
                username: None,
                password: None,
                from,
            });
            mail.smtp_host = host;
        }
        if let Some(ref mut mail) = self.mail {
            if let Ok(user) = std::env::var("SMTP_USERNAME") {
                mail.username = Some(user);
            }
            if let Ok(pass) = std::env::var("SMTP_PASSWORD") {
                mail.password = Some(pass);
            }
            if let Ok(from) = std::env::var("SMTP_FROM") {
                mail.from = from;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < 32 {
            anyhow::bail!("JWT secret must be at least 32 characters long");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.network.max_concurrent_probes == 0 {
            anyhow::bail!("network.max_concurrent_probes must be at least 1");
        }

        if parse_cidr(&self.network.scan_subnet).is_none() {
            anyhow::bail!(
                "Invalid scan subnet: {}. Expected IPv4 CIDR such as 10.0.0.0/24",
                self.network.scan_subnet
            );
        }

        if let Some(ref admin) = self.bootstrap_admin {
            if admin.password.len() < self.auth.password_min_length {
                anyhow::bail!(
                    "Bootstrap admin password must be at least {} characters",
                    self.auth.password_min_length
                );
            }
        }

        Ok(())
    }
}

/// Parse `a.b.c.d/n` into its network address and prefix length
pub fn parse_cidr(cidr: &str) -> Option<(Ipv4Addr, u8)> {
    let (addr, prefix) = cidr.trim().split_once('/')?;
    let addr: Ipv4Addr = addr.parse().ok()?;
    let prefix: u8 = prefix.parse().ok()?;
    if prefix > 32 {
        return None;
    }
    Some((addr, prefix))
}

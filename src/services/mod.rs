//! Business logic services

pub mod applications;
pub mod auth;
pub mod command;
pub mod complaints;
pub mod discovery;
pub mod mail;
pub mod otp;
pub mod probe;
pub mod registry;
pub mod seed;
pub mod uploads;

pub use applications::ApplicationService;
pub use auth::AuthService;
pub use command::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use complaints::ComplaintService;
pub use discovery::{parse_scan_output, DiscoveryScanner};
pub use mail::{LogMailer, Mailer, SmtpMailer};
pub use otp::{OtpStore, PasswordResetService};
pub use probe::{IcmpProbe, NetworkProbe, ProbeOutcome, ReachabilityProber};
pub use registry::AddressRegistry;
pub use uploads::FileStore;

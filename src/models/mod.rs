//! Data models

pub mod activity;
pub mod address;
pub mod application;
pub mod complaint;
pub mod discovery;
pub mod ip_range;
pub mod site;
pub mod user;

pub use activity::*;
pub use address::*;
pub use application::*;
pub use complaint::*;
pub use discovery::*;
pub use ip_range::*;
pub use site::*;
pub use user::*;

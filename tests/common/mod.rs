//! Shared test helpers
//!
//! Factories, fixtures, mocks for the network and mail seams, and an
//! in-process application client.

pub mod factories;
pub mod fixtures;
pub mod test_app;

pub use factories::*;
pub use fixtures::*;
pub use mocks::*;
pub use test_app::*;

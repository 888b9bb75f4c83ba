//! Integration tests for the NIC intranet API
//!
//! These tests drive the HTTP endpoints against a real SQLite database,
//! with the network probe, subprocess runner and mailer mocked out.

mod api_tests;
mod application_tests;
mod auth_tests;
mod directory_tests;
mod network_tests;

//! Test factories for generating test data
//!
//! Factories create randomized, unique data for each test so that tests
//! sharing a database never collide on email or hardware address.

use std::sync::atomic::{AtomicU64, Ordering};

use fake::faker::name::en::Name;
use fake::Fake;
use rand::Rng;
use serde_json::{json, Value};

use super::fixtures::TEST_PASSWORD;

/// Factory for employee registration payloads
pub struct EmployeeFactory {
    counter: AtomicU64,
}

impl Default for EmployeeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EmployeeFactory {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    /// Create a unique employee at `site`
    pub fn create(&self, site: (&str, &str)) -> TestEmployeeBuilder {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let name: String = Name().fake();
        TestEmployeeBuilder {
            name,
            email: format!("employee_{}_{}@example.com", n, random_suffix()),
            phone: random_phone(),
            designation: "Data Entry Operator".to_string(),
            password: TEST_PASSWORD.to_string(),
            location: site.0.to_string(),
            department: site.1.to_string(),
        }
    }
}

/// Builder for employee registration payloads
pub struct TestEmployeeBuilder {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub designation: String,
    pub password: String,
    pub location: String,
    pub department: String,
}

impl TestEmployeeBuilder {
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = phone.to_string();
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "email": self.email,
            "phone": self.phone,
            "designation": self.designation,
            "password": self.password,
            "location": self.location,
            "department": self.department,
        })
    }
}

fn random_suffix() -> u32 {
    rand::thread_rng().gen_range(10_000..100_000)
}

/// Ten digits, never starting with zero
pub fn random_phone() -> String {
    format!("9{:09}", rand::thread_rng().gen_range(0..1_000_000_000u64))
}

/// Random colon-separated hardware address
pub fn random_mac() -> String {
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| format!("{:02X}", rng.gen::<u8>()))
        .collect::<Vec<_>>()
        .join(":")
}

/// Random host in 10.20.0.0/16, avoiding network and broadcast octets
pub fn random_host() -> String {
    let mut rng = rand::thread_rng();
    format!("10.20.{}.{}", rng.gen_range(0..=255), rng.gen_range(1..=254))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_emails_are_unique() {
        let factory = EmployeeFactory::new();
        let a = factory.create(("Collector Office", "Collector Room"));
        let b = factory.create(("Collector Office", "Collector Room"));
        assert_ne!(a.email, b.email);
    }

    #[test]
    fn test_random_values_are_well_formed() {
        assert_eq!(random_phone().len(), 10);
        let mac = random_mac();
        assert_eq!(mac.len(), 17);
        assert_eq!(mac.matches(':').count(), 5);
        assert!(random_host().parse::<std::net::Ipv4Addr>().is_ok());
    }
}

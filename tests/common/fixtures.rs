//! Test fixtures for common test data
//!
//! Fixtures provide pre-defined request bodies and sample files used across
//! the integration tests.

use axum::{body::Body, http::Request};
use serde_json::{json, Value};

use nic_intranet::models::SITES;

/// Minimal well-formed PDF
pub const SAMPLE_PDF: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\ntrailer << /Root 1 0 R >>\n%%EOF\n";

pub const TEST_PASSWORD: &str = "password123";

/// First site and department from the catalogue
pub fn home_site() -> (&'static str, &'static str) {
    (SITES[0].location, SITES[0].departments[0])
}

/// A second department at a different site
pub fn other_site() -> (&'static str, &'static str) {
    (SITES[1].location, SITES[1].departments[0])
}

/// Nmap `-sn` output for two hosts, one without a MAC line
pub const SCAN_OUTPUT: &str = "\
Starting Nmap 7.94 ( https://nmap.org ) at 2026-10-17 10:00 IST
Nmap scan report for 10.10.0.1
Host is up (0.0010s latency).
MAC Address: 00:1B:44:11:3A:B7 (Cisco Systems)
Nmap scan report for printer.local (10.10.0.20)
Host is up (0.0020s latency).
Nmap done: 256 IP addresses (2 hosts up) scanned in 2.51 seconds
";

/// Application fixtures
pub struct ApplicationFixtures;

impl ApplicationFixtures {
    /// A complete, valid submission for an employee at `site`
    pub fn form(site: (&str, &str), email: &str, mac: Option<&str>) -> MultipartForm {
        let mut form = MultipartForm::new()
            .text("name", "Asha Verma")
            .text("address", "Room 12, Collectorate")
            .text("department", site.1)
            .text("contact", "9876543210")
            .text("email", email)
            .text("location", site.0)
            .text("antivirus", "Y")
            .text("antivirusName", "Quick Heal")
            .text("operatingSystem", "Windows 11");
        if let Some(mac) = mac {
            form = form.text("macAddress", mac);
        }
        form.file("ipForm", "application.pdf", "application/pdf", SAMPLE_PDF)
    }
}

/// Request body fixtures
pub struct RequestFixtures;

impl RequestFixtures {
    pub fn login(email: &str, password: &str) -> Value {
        json!({ "email": email, "password": password })
    }

    pub fn admin_user(email: &str, site: (&str, &str)) -> Value {
        json!({
            "name": "Office Administrator",
            "email": email,
            "password": TEST_PASSWORD,
            "role": "admin",
            "location": site.0,
            "department": site.1,
            "designation": "System Analyst",
            "phone": "9000000001"
        })
    }
}

/// Hand-built `multipart/form-data` body
pub struct MultipartForm {
    boundary: String,
    parts: Vec<(String, Vec<u8>)>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: format!("nic-test-{}", uuid::Uuid::new_v4().simple()),
            parts: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        let part = format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
            name, value
        );
        self.parts.push((name.to_string(), part.into_bytes()));
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        let mut part = format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            name, file_name, content_type
        )
        .into_bytes();
        part.extend_from_slice(bytes);
        self.parts.push((name.to_string(), part));
        self
    }

    /// Drop every part named `name`; used to build incomplete submissions
    pub fn without(mut self, name: &str) -> Self {
        self.parts.retain(|(part_name, _)| part_name != name);
        self
    }

    pub fn into_request(self, uri: &str) -> Request<Body> {
        let mut body = Vec::new();
        for (_, part) in &self.parts {
            body.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            body.extend_from_slice(part);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", self.boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }
}

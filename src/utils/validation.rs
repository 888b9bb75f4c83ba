//! Input validation utilities

use std::net::Ipv4Addr;

use once_cell::sync::Lazy;
use regex::Regex;

/// Dotted-quad IPv4, each octet 0-255
static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$")
        .expect("static regex")
});

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static regex")
});

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").expect("static regex"));

/// Six hex pairs separated consistently by ':' or '-'
static MAC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5}$|^[0-9A-Fa-f]{2}(?:-[0-9A-Fa-f]{2}){5}$")
        .expect("static regex")
});

/// Validate a dotted-quad IPv4 address string
pub fn validate_ipv4(address: &str) -> bool {
    IPV4_REGEX.is_match(address)
}

/// Parse an address that already passed [`validate_ipv4`]
///
/// Leading zeros are accepted by the pattern ("010.0.0.1") but not by the
/// std parser, so octets are parsed individually.
pub fn parse_ipv4(address: &str) -> Option<Ipv4Addr> {
    if !validate_ipv4(address) {
        return None;
    }
    let mut octets = [0u8; 4];
    for (slot, part) in octets.iter_mut().zip(address.split('.')) {
        *slot = part.parse().ok()?;
    }
    Some(Ipv4Addr::from(octets))
}

/// Validate an email address
pub fn validate_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

/// Validate a 10 digit phone number
pub fn validate_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

/// Validate a hardware (MAC) address
pub fn validate_mac(mac: &str) -> bool {
    MAC_REGEX.is_match(mac)
}

/// Canonical form of a hardware address: upper-case, colon separated
pub fn normalize_mac(mac: &str) -> String {
    mac.trim().replace('-', ":").to_uppercase()
}

/// Trimmed value when present and non-blank
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

//! Discovery scanner
//!
//! Sweeps the configured subnet with an external host-discovery tool and
//! parses its line-oriented report. Concurrent callers share one in-flight
//! scan.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    config::NetworkConfig,
    models::{DiscoveredDevice, UNKNOWN_VENDOR},
    services::command::CommandRunner,
    utils::{IpamError, IpamResult},
};

const SCAN_FAILED: &str = "Scan failed";

static HOST_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Nmap scan report for .*?(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\)?\s*$")
        .expect("static regex")
});

static MAC_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^MAC Address:\s*([0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5})(?:\s*\((.*)\))?")
        .expect("static regex")
});

/// Parse a host-discovery report into device records
///
/// Each host line starts a new record; a following hardware line fills in
/// the MAC and vendor of the current record.
pub fn parse_scan_output(output: &str) -> Vec<DiscoveredDevice> {
    let mut devices = Vec::new();
    let mut current: Option<DiscoveredDevice> = None;

    for line in output.lines().map(str::trim) {
        if let Some(caps) = HOST_LINE.captures(line) {
            if let Some(done) = current.take() {
                devices.push(done);
            }
            current = Some(DiscoveredDevice {
                ip: caps[1].to_string(),
                mac: None,
                vendor: UNKNOWN_VENDOR.to_string(),
            });
        } else if let Some(caps) = MAC_LINE.captures(line) {
            if let Some(ref mut device) = current {
                device.mac = Some(caps[1].to_string());
                device.vendor = caps
                    .get(2)
                    .map(|m| m.as_str().trim())
                    .filter(|v| !v.is_empty())
                    .unwrap_or(UNKNOWN_VENDOR)
                    .to_string();
            }
        }
    }

    if let Some(done) = current {
        devices.push(done);
    }
    devices
}

pub struct DiscoveryScanner {
    runner: Arc<dyn CommandRunner>,
    command: String,
    args: Vec<String>,
    subnet: String,
    timeout: Duration,
    inflight: Cache<String, Arc<Vec<DiscoveredDevice>>>,
}

impl DiscoveryScanner {
    pub fn new(config: &NetworkConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            command: config.scan_command.clone(),
            args: config.scan_args.clone(),
            subnet: config.scan_subnet.clone(),
            timeout: Duration::from_secs(config.scan_timeout_secs),
            inflight: Cache::builder().max_capacity(16).build(),
        }
    }

    pub fn subnet(&self) -> &str {
        &self.subnet
    }

    /// Sweep the subnet, joining a scan already in flight if there is one
    pub async fn scan(&self) -> IpamResult<Arc<Vec<DiscoveredDevice>>> {
        let key = self.subnet.clone();
        let result = self
            .inflight
            .try_get_with(key.clone(), self.run_scan())
            .await;
        self.inflight.invalidate(&key).await;

        result.map_err(|e| {
            warn!(subnet = %self.subnet, error = %e, "Discovery scan failed");
            IpamError::ScanFailed(SCAN_FAILED.to_string())
        })
    }

    async fn run_scan(&self) -> IpamResult<Arc<Vec<DiscoveredDevice>>> {
        let mut args = self.args.clone();
        args.push(self.subnet.clone());

        info!(subnet = %self.subnet, command = %self.command, "Starting discovery scan");
        let output = self
            .runner
            .run(&self.command, &args, self.timeout)
            .await
            .map_err(|e| IpamError::ScanFailed(e.to_string()))?;

        let stderr = output.stderr.trim();
        if !stderr.is_empty() {
            return Err(IpamError::ScanFailed(stderr.to_string()));
        }

        let devices = parse_scan_output(&output.stdout);
        info!(subnet = %self.subnet, hosts = devices.len(), "Discovery scan finished");
        Ok(Arc::new(devices))
    }
}

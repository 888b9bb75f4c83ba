//! Reachability prober
//!
//! Best-effort "does this host answer" for registry records. Each address is
//! probed independently under a shared concurrency cap:
//!
//! 1. ICMP echo with a short timeout; alive means reachable.
//! 2. Not alive with an access-denied diagnostic, or a probe error, falls back
//!    to the platform `ping` and looks for a reply marker in its output.
//! 3. Anything that goes wrong in the fallback means unreachable.
//!
//! Callers only ever see a boolean.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use surge_ping::SurgeError;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{
    config::NetworkConfig,
    models::{AddressRecord, ProbedAddress},
    services::command::CommandRunner,
    utils::validation::parse_ipv4,
};

/// Diagnostic marker for a probe blocked by socket permissions
pub const ACCESS_DENIED: &str = "Access denied";
pub const TIMED_OUT: &str = "Request timed out";

/// Result of one primary probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub alive: bool,
    pub diagnostic: String,
}

impl ProbeOutcome {
    pub fn alive() -> Self {
        Self {
            alive: true,
            diagnostic: String::new(),
        }
    }

    pub fn dead(diagnostic: impl Into<String>) -> Self {
        Self {
            alive: false,
            diagnostic: diagnostic.into(),
        }
    }
}

#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn probe(&self, addr: Ipv4Addr, limit: Duration) -> Result<ProbeOutcome>;
}

/// ICMP echo via surge-ping
#[derive(Debug, Clone, Default)]
pub struct IcmpProbe;

#[async_trait]
impl NetworkProbe for IcmpProbe {
    async fn probe(&self, addr: Ipv4Addr, limit: Duration) -> Result<ProbeOutcome> {
        let payload = [0u8; 56];
        match timeout(limit, surge_ping::ping(IpAddr::V4(addr), &payload)).await {
            Ok(Ok((_packet, rtt))) => {
                debug!(address = %addr, rtt_ms = rtt.as_millis() as u64, "Echo reply");
                Ok(ProbeOutcome::alive())
            }
            Ok(Err(SurgeError::IOError(e))) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Ok(ProbeOutcome::dead(format!("{}: {}", ACCESS_DENIED, e)))
            }
            Ok(Err(SurgeError::Timeout { .. })) | Err(_) => Ok(ProbeOutcome::dead(TIMED_OUT)),
            Ok(Err(e)) => Err(anyhow::anyhow!("ICMP probe failed: {}", e)),
        }
    }
}

/// Whether native ping output reports a reply
///
/// Windows prints `Reply from ... bytes=`; Unix prints `bytes from ... ttl=`.
pub fn ping_output_has_reply(output: &str) -> bool {
    if output.contains("Reply from") && output.contains("bytes=") {
        return true;
    }
    let lower = output.to_lowercase();
    lower.contains("bytes from") && lower.contains("ttl=")
}

fn ping_count_flag() -> &'static str {
    if cfg!(windows) {
        "-n"
    } else {
        "-c"
    }
}

pub struct ReachabilityProber {
    probe: Arc<dyn NetworkProbe>,
    runner: Arc<dyn CommandRunner>,
    limiter: Arc<Semaphore>,
    probe_timeout: Duration,
    fallback_timeout: Duration,
    ping_command: String,
}

impl ReachabilityProber {
    pub fn new(
        config: &NetworkConfig,
        probe: Arc<dyn NetworkProbe>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            probe,
            runner,
            limiter: Arc::new(Semaphore::new(config.max_concurrent_probes.max(1))),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
            fallback_timeout: Duration::from_secs(config.fallback_timeout_secs),
            ping_command: config.ping_command.clone(),
        }
    }

    /// Reachability for one address; never fails
    pub async fn is_reachable(&self, address: &str) -> bool {
        let Some(addr) = parse_ipv4(address) else {
            debug!(address = %address, "Skipping probe for malformed address");
            return false;
        };

        let Ok(_permit) = self.limiter.acquire().await else {
            return false;
        };

        match self.probe.probe(addr, self.probe_timeout).await {
            Ok(outcome) if outcome.alive => true,
            Ok(outcome) if outcome.diagnostic.contains(ACCESS_DENIED) => {
                debug!(address = %addr, "ICMP not permitted, using native ping");
                self.fallback(addr).await
            }
            Ok(_) => false,
            Err(e) => {
                debug!(address = %addr, error = %e, "ICMP probe errored, using native ping");
                self.fallback(addr).await
            }
        }
    }

    async fn fallback(&self, addr: Ipv4Addr) -> bool {
        let args = vec![
            ping_count_flag().to_string(),
            "1".to_string(),
            addr.to_string(),
        ];
        match self
            .runner
            .run(&self.ping_command, &args, self.fallback_timeout)
            .await
        {
            Ok(output) => {
                ping_output_has_reply(&output.stdout) || ping_output_has_reply(&output.stderr)
            }
            Err(e) => {
                warn!(address = %addr, error = %e, "Native ping fallback failed");
                false
            }
        }
    }

    /// Probe every record, preserving input order
    pub async fn probe_records(&self, records: &[AddressRecord]) -> Vec<ProbedAddress> {
        let checks = records.iter().map(|r| self.is_reachable(&r.ip_address));
        let reachable = join_all(checks).await;

        records
            .iter()
            .zip(reachable)
            .map(|(record, alive)| ProbedAddress::new(record, alive))
            .collect()
    }
}

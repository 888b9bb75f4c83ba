//! Rate limiting middleware
//!
//! Per-client-IP limits using governor's keyed rate limiter.

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};
use tracing::{debug, warn};

use crate::utils::error::ErrorResponse;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Burst capacity (maximum requests allowed at once)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 30,
        }
    }
}

/// Stricter rate limit for authentication endpoints
pub fn auth_rate_limit_config() -> RateLimitConfig {
    RateLimitConfig {
        requests_per_second: 1,
        burst_size: 5,
    }
}

/// Standard API rate limit
pub fn api_rate_limit_config() -> RateLimitConfig {
    RateLimitConfig {
        requests_per_second: 50,
        burst_size: 100,
    }
}

/// Shared keyed limiter
#[derive(Clone)]
pub struct RateLimitState {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN));

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    pub fn check(&self, ip: IpAddr) -> bool {
        self.limiter.check_key(&ip).is_ok()
    }

    /// Drop state for clients whose quota has fully replenished
    pub fn cleanup(&self) {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        debug!(
            "Rate limiter cleanup: {} -> {} entries",
            before,
            self.limiter.len()
        );
    }
}

/// Rate limiting middleware for Axum
///
/// Requests without connection info (in-process callers) share one bucket.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if rate_limit.check(ip) {
        next.run(request).await
    } else {
        warn!(ip = %ip, "Rate limit exceeded");
        RateLimitExceeded.into_response()
    }
}

/// Rate limit exceeded response
pub struct RateLimitExceeded;

impl IntoResponse for RateLimitExceeded {
    fn into_response(self) -> Response {
        (
            StatusCode::TOO_MANY_REQUESTS,
            [("Retry-After", "1")],
            Json(ErrorResponse::new(
                "rate_limited",
                "Too many requests. Please try again later.",
            )),
        )
            .into_response()
    }
}

/// Spawn a background task to periodically clean up rate limiter state
pub fn spawn_rate_limit_cleanup(state: RateLimitState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            state.cleanup();
        }
    });
}

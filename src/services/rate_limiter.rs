use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::errors::AppError;

/// Peers without a known socket address share this bucket.
const UNKNOWN_CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Per-client sliding-window limiter for the analyze endpoint.
///
/// Each client keeps a log of its accepted request times; a request is let
/// through when fewer than `max_requests` of them fall inside the window.
pub struct ClientRateLimiter {
    hits: DashMap<IpAddr, VecDeque<Instant>>,
    max_requests: usize,
    window: Duration,
}

impl ClientRateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            hits: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Record a request from `client`, or reject it with the number of seconds
    /// until the oldest hit leaves the window.
    pub fn check(&self, client: IpAddr) -> Result<(), AppError> {
        let now = Instant::now();
        let mut log = self.hits.entry(client).or_default();

        while log
            .front()
            .is_some_and(|&hit| now.duration_since(hit) >= self.window)
        {
            log.pop_front();
        }

        if log.len() >= self.max_requests {
            let retry_after = log
                .front()
                .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)))
                .unwrap_or(self.window);
            let retry_after_secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
            warn!("Rate limit exceeded for {} (retry in {}s)", client, retry_after_secs);
            return Err(AppError::RateLimited { retry_after_secs });
        }

        log.push_back(now);
        Ok(())
    }

    /// Drop clients whose whole log has aged out of the window.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.hits.len();
        self.hits.retain(|_, log| {
            log.back()
                .is_some_and(|&last| now.duration_since(last) < self.window)
        });
        let removed = before.saturating_sub(self.hits.len());
        if removed > 0 {
            debug!("Rate limiter dropped {} idle clients", removed);
        }
        removed
    }

    pub fn tracked_clients(&self) -> usize {
        self.hits.len()
    }
}

/// Middleware applied to the analyze route only.
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<ClientRateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(UNKNOWN_CLIENT);

    limiter.check(client)?;
    Ok(next.run(request).await)
}

//! Per-client-IP token bucket, applied as axum middleware.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    allowance: f64,
    checked_at: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<IpAddr, Bucket>>>,
    per_sec: f64,
    burst: f64,
}

impl RateLimiter {
    pub fn new(per_sec: f64, burst: f64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            per_sec,
            burst: burst.max(1.0),
        }
    }

    /// Take one token for `ip`. Returns false when the bucket is empty.
    pub async fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry(ip).or_insert(Bucket {
            allowance: self.burst,
            checked_at: now,
        });

        let refill = now.duration_since(bucket.checked_at).as_secs_f64() * self.per_sec;
        bucket.allowance = (bucket.allowance + refill).min(self.burst);
        bucket.checked_at = now;

        if bucket.allowance < 1.0 {
            return false;
        }
        bucket.allowance -= 1.0;
        true
    }

    /// Forget clients idle for longer than `max_idle_secs`.
    pub async fn purge_idle(&self, max_idle_secs: f64) -> usize {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        buckets.retain(|_, b| now.duration_since(b.checked_at).as_secs_f64() < max_idle_secs);
        before - buckets.len()
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(ip) = client_ip(&req) {
        if !limiter.check(ip).await {
            tracing::warn!(ip = %ip, "rate limit exceeded");
            return ApiError::TooManyRequests.into_response();
        }
    }
    next.run(req).await
}

/// Peer address first, then the first `X-Forwarded-For` hop.
fn client_ip(req: &Request) -> Option<IpAddr> {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return Some(addr.ip());
    }

    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_then_refuse() {
        let limiter = RateLimiter::new(0.0, 3.0);
        let ip: IpAddr = "203.0.113.7".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.check(ip).await);
        }
        assert!(!limiter.check(ip).await);

        let other: IpAddr = "203.0.113.8".parse().unwrap();
        assert!(limiter.check(other).await);
    }

    #[tokio::test]
    async fn purge_drops_idle_clients() {
        let limiter = RateLimiter::new(1.0, 2.0);
        limiter.check("198.51.100.1".parse().unwrap()).await;
        limiter.check("198.51.100.2".parse().unwrap()).await;

        assert_eq!(limiter.purge_idle(0.0).await, 2);
        assert!(limiter.buckets.lock().await.is_empty());
    }
}

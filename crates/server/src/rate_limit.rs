//! Per-client fixed-window rate limiting.
//!
//! Clients are keyed by remote IP address. Requests without connection
//! info (in-process calls) share a single `unknown` bucket.

use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use docqa_core::{AppError, RateLimitSettings};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const WINDOW: Duration = Duration::from_secs(60);

/// Expired windows are pruned once this many clients are tracked.
const PRUNE_THRESHOLD: usize = 1024;

/// Counts requests per client within a fixed window.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    counters: Mutex<HashMap<String, (u32, Instant)>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, WINDOW)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Record a request from `client`; false once its allowance for the
    /// current window is spent.
    pub async fn check(&self, client: &str) -> bool {
        let mut counters = self.counters.lock().await;
        let now = Instant::now();

        if counters.len() >= PRUNE_THRESHOLD {
            counters.retain(|_, (_, start)| now.duration_since(*start) < self.window);
        }

        let (count, start) = counters.entry(client.to_string()).or_insert((0, now));

        if now.duration_since(*start) >= self.window {
            *count = 0;
            *start = now;
        }

        if *count >= self.max_requests {
            false
        } else {
            *count += 1;
            true
        }
    }
}

/// Limiters for the endpoints that reach the embedding provider or LLM.
#[derive(Debug, Clone)]
pub struct RouteLimits {
    pub retrieve: Arc<RateLimiter>,
    pub query: Arc<RateLimiter>,
}

impl RouteLimits {
    /// `None` when limiting is disabled.
    pub fn from_settings(settings: &RateLimitSettings) -> Option<Self> {
        settings.enabled.then(|| Self {
            retrieve: Arc::new(RateLimiter::per_minute(settings.retrieve_per_minute)),
            query: Arc::new(RateLimiter::per_minute(settings.query_per_minute)),
        })
    }
}

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware rejecting requests over the limiter's allowance with 429.
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);

    if !limiter.check(&client).await {
        tracing::warn!("Rate limit exceeded for {} on {}", client, request.uri().path());
        return ApiError(AppError::RateLimited(format!(
            "at most {} requests per minute, try again later",
            limiter.max_requests()
        )))
        .into_response();
    }

    next.run(request).await
}

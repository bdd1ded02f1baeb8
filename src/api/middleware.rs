//! Request-scoped middleware: request ids and timing, security headers and
//! per-client rate limiting.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::AppState;
use crate::config::RateLimitConfig;
use crate::errors::CostIntelError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const SLOW_REQUEST_MS: u128 = 1200;

/// Assign or echo `X-Request-ID`, log the request inside a span and attach
/// security headers to the response.
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let span = info_span!("request", request_id = %request_id, method = %method, path = %path);

    async move {
        let started = Instant::now();
        let mut response = next.run(request).await;
        let elapsed_ms = started.elapsed().as_millis();
        let status = response.status().as_u16();

        if elapsed_ms > SLOW_REQUEST_MS {
            warn!(status, elapsed_ms = elapsed_ms as u64, "Slow request");
        } else {
            info!(status, elapsed_ms = elapsed_ms as u64, "Request completed");
        }

        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(REQUEST_ID_HEADER, value);
        }
        apply_security_headers(headers);
        response
    }
    .instrument(span)
    .await
}

fn apply_security_headers(headers: &mut HeaderMap) {
    let pairs = [
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("referrer-policy", "no-referrer"),
    ];
    for (name, value) in pairs {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the oldest request in the window expires.
    pub reset_secs: u64,
    pub retry_after_secs: u64,
}

/// Sliding-window limiter keyed by client identifier.
///
/// Idle clients are dropped by a sweep that runs at most once per window, so
/// the map only holds clients seen within the last window.
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    max_requests: u32,
    window: Duration,
    hits: Arc<DashMap<String, VecDeque<Instant>>>,
    started: Instant,
    last_sweep_ms: Arc<AtomicU64>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_seconds),
            hits: Arc::new(DashMap::new()),
            started: Instant::now(),
            last_sweep_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn disabled() -> Self {
        Self::new(&RateLimitConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of clients currently holding window state.
    pub fn tracked_clients(&self) -> usize {
        self.hits.len()
    }

    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        // must run before `entry` takes a shard lock
        self.maybe_sweep(now);

        let mut entry = self.hits.entry(client.to_string()).or_default();
        let deque = entry.value_mut();
        prune(deque, now, self.window);

        let allowed = (deque.len() as u32) < self.max_requests;
        if allowed {
            deque.push_back(now);
        }
        let reset = deque
            .front()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(self.window);
        let reset_secs = ceil_secs(reset);

        if allowed {
            return RateDecision {
                allowed: true,
                limit: self.max_requests,
                remaining: self.max_requests - deque.len() as u32,
                reset_secs,
                retry_after_secs: 0,
            };
        }
        RateDecision {
            allowed: false,
            limit: self.max_requests,
            remaining: 0,
            reset_secs,
            retry_after_secs: reset_secs,
        }
    }

    fn maybe_sweep(&self, now: Instant) {
        let elapsed_ms = now.saturating_duration_since(self.started).as_millis() as u64;
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        let window_ms = self.window.as_millis() as u64;
        if elapsed_ms.saturating_sub(last) < window_ms.max(1) {
            return;
        }
        if self
            .last_sweep_ms
            .compare_exchange(last, elapsed_ms, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let before = self.hits.len();
        let window = self.window;
        self.hits.retain(|_, deque| {
            prune(deque, now, window);
            !deque.is_empty()
        });
        let removed = before.saturating_sub(self.hits.len());
        if removed > 0 {
            debug!(removed, remaining = self.hits.len(), "Swept idle rate-limit clients");
        }
    }
}

fn prune(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(front) = deque.front() {
        if now.saturating_duration_since(*front) >= window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    secs.max(1)
}

/// First `X-Forwarded-For` entry, else the peer IP, else `"unknown"`.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.rate_limiter.is_enabled() || request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(request.headers(), peer);
    let decision = state.rate_limiter.check(&client);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        warn!(client = %client, retry_after = decision.retry_after_secs, "Rate limit exceeded");
        CostIntelError::RateLimit { retry_after_secs: decision.retry_after_secs }.into_response()
    };

    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(decision.reset_secs));
    if !decision.allowed {
        headers.insert("retry-after", HeaderValue::from(decision.retry_after_secs));
    }
    response
}

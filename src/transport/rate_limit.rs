//! Per-client fixed-window rate limiting for the HTTP transport

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use tokio::sync::Mutex;

/// Length of one counting window
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Message returned to throttled clients
pub const RATE_LIMIT_MESSAGE: &str = "Překročen limit požadavků. Zkuste to znovu za minutu.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the current window closes
    pub reset_seconds: u64,
}

#[derive(Debug)]
struct WindowState {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window counter keyed by client
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<String, WindowState>>,
}

impl RateLimiter {
    pub fn new(limit: u32) -> Self {
        Self::with_window(limit, RATE_WINDOW)
    }

    pub fn with_window(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request for `key`
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut guard = self.windows.lock().await;

        guard.retain(|_, w| now < w.reset_at);

        let window = guard.entry(key.to_string()).or_insert(WindowState {
            count: 0,
            reset_at: now + self.window,
        });

        let allowed = window.count < self.limit;
        if allowed {
            window.count += 1;
        }

        RateLimitDecision {
            allowed,
            limit: self.limit,
            remaining: self.limit - window.count,
            reset_seconds: window.reset_at.saturating_duration_since(now).as_secs(),
        }
    }

    /// Number of clients with an open window
    pub async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.len()
    }
}

/// Client identity: first `x-forwarded-for` entry, then `x-real-ip`
pub fn client_key(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header("x-real-ip"))
        .unwrap_or("unknown")
        .to_string()
}

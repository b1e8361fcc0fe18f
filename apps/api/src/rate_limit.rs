//! # Rate Limiter
//!
//! Fixed-window request counter keyed by client address, guarding the read
//! path before any repository work happens. Exceeding the window yields a
//! 429 and does not consume a transaction.
//!
//! Injected per server instance (no process-global state), like the cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-key fixed-window counters.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, (Instant, u32)>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window` per key.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        RateLimiter {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Counts a request against `key`. Returns `false` when the window is
    /// exhausted.
    pub fn check(&self, key: &str) -> bool {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let now = Instant::now();

        let (window_start, count) = windows
            .entry(key.to_string())
            .or_insert((now, 0));

        if now.duration_since(*window_start) >= self.window {
            // new window
            *window_start = now;
            *count = 0;
        }

        if *count >= self.max_requests {
            return false;
        }

        *count += 1;
        true
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

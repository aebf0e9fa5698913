//! Sliding-window admission control per client and resource.
//!
//! Fixed-reset counter windows: each `(client, resource)` pair tracks a
//! window start and a count; when the window elapses the counter resets.
//! This is intentionally approximate: a double burst at a window boundary
//! is an accepted tradeoff for O(1) memory per client. State is sharded so
//! concurrent admissions on different clients do not contend on one lock,
//! and each check is a single read-increment-compare under its shard lock
//! so concurrent requests cannot slip past the limit.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const SHARD_COUNT: usize = 16;

/// Resource class being admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Answer queries
    Query,
    /// Profile uploads
    Upload,
}

impl Resource {
    /// Stable name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Upload => "upload",
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Request may proceed
    Allowed,
    /// Over the limit for the current window; retry later
    Denied,
}

#[derive(Debug)]
struct RateWindow {
    window_start: Instant,
    count: u32,
}

/// Sharded per-(client, resource) counters.
pub struct RateLimiter {
    shards: Vec<Mutex<HashMap<(String, Resource), RateWindow>>>,
}

impl RateLimiter {
    /// Create an empty limiter.
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    /// Check and record one admission for `(client_key, resource)`.
    pub fn admit(
        &self,
        client_key: &str,
        resource: Resource,
        limit: u32,
        window: Duration,
    ) -> Admission {
        self.admit_at(client_key, resource, limit, window, Instant::now())
    }

    /// Admission check against an explicit clock, used by tests to cross
    /// window boundaries without sleeping.
    pub fn admit_at(
        &self,
        client_key: &str,
        resource: Resource,
        limit: u32,
        window: Duration,
        now: Instant,
    ) -> Admission {
        let key = (client_key.to_string(), resource);
        let shard = &self.shards[shard_index(&key)];

        // Poisoning only happens if a holder panicked; the counters are
        // still structurally valid, so keep serving.
        let mut map = shard.lock().unwrap_or_else(|e| e.into_inner());

        let entry = map.entry(key).or_insert(RateWindow {
            window_start: now,
            count: 0,
        });

        if now.duration_since(entry.window_start) >= window {
            entry.window_start = now;
            entry.count = 0;
        }

        entry.count += 1;
        if entry.count > limit {
            tracing::debug!(
                client = client_key,
                resource = resource.as_str(),
                "rate limit denied admission"
            );
            Admission::Denied
        } else {
            Admission::Allowed
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn shard_index(key: &(String, Resource)) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() as usize) % SHARD_COUNT
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_limit_is_enforced_within_window() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for i in 0..30 {
            assert_eq!(
                limiter.admit_at("client-a", Resource::Query, 30, WINDOW, start),
                Admission::Allowed,
                "admission {} should pass",
                i + 1
            );
        }
        assert_eq!(
            limiter.admit_at("client-a", Resource::Query, 30, WINDOW, start),
            Admission::Denied
        );
    }

    #[test]
    fn test_window_elapse_resets_counter() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        for _ in 0..3 {
            limiter.admit_at("client-a", Resource::Query, 3, WINDOW, start);
        }
        assert_eq!(
            limiter.admit_at("client-a", Resource::Query, 3, WINDOW, start),
            Admission::Denied
        );

        let later = start + WINDOW;
        assert_eq!(
            limiter.admit_at("client-a", Resource::Query, 3, WINDOW, later),
            Admission::Allowed
        );
    }

    #[test]
    fn test_clients_are_isolated() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        assert_eq!(
            limiter.admit_at("client-a", Resource::Query, 1, WINDOW, start),
            Admission::Allowed
        );
        assert_eq!(
            limiter.admit_at("client-a", Resource::Query, 1, WINDOW, start),
            Admission::Denied
        );
        assert_eq!(
            limiter.admit_at("client-b", Resource::Query, 1, WINDOW, start),
            Admission::Allowed
        );
    }

    #[test]
    fn test_resources_are_isolated() {
        let limiter = RateLimiter::new();
        let start = Instant::now();

        assert_eq!(
            limiter.admit_at("client-a", Resource::Query, 1, WINDOW, start),
            Admission::Allowed
        );
        assert_eq!(
            limiter.admit_at("client-a", Resource::Upload, 1, WINDOW, start),
            Admission::Allowed
        );
    }

    #[test]
    fn test_concurrent_admissions_respect_limit() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new());
        let limit = 50u32;
        let mut handles = Vec::new();

        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            handles.push(std::thread::spawn(move || {
                let mut allowed = 0u32;
                for _ in 0..20 {
                    if limiter.admit("shared", Resource::Query, limit, WINDOW)
                        == Admission::Allowed
                    {
                        allowed += 1;
                    }
                }
                allowed
            }));
        }

        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, limit);
    }
}

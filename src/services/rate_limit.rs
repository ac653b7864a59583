//! Sliding-window rate limiter gating report generation.
//!
//! Policy: at most N requests in any trailing T-second interval per
//! identifier (defaults: 10 requests / 10 seconds). The window lives in
//! Redis when `REDIS_URL` is configured and in process otherwise; an
//! unconfigured store is a local fallback, not an error, and the limit is
//! still enforced.
//!
//! Store *failures* are resolved by an explicit `fail_open` policy flag:
//! fail-open allows the request (availability over strictness), fail-closed
//! denies it. The resolution is a pure function so both modes are testable.
//! One check per report request; there is no retry.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use redis::aio::ConnectionManager;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitDecision {
    pub allowed: bool,

    /// Window size the decision was made against
    pub limit: u32,

    /// Requests left in the current window
    pub remaining: u32,

    /// Time until the window frees a slot. For denials this is the
    /// wait-and-retry hint surfaced to the user.
    pub reset_in: Duration,
}

enum Backend {
    /// In-process window per identifier
    Memory(Mutex<HashMap<String, VecDeque<Instant>>>),
    /// Redis sorted set per identifier, scored by epoch milliseconds
    Redis(ConnectionManager),
}

/// Sliding-window limiter shared across requests.
pub struct RateLimiter {
    backend: Backend,
    limit: u32,
    window: Duration,
    fail_open: bool,
}

impl RateLimiter {
    /// Limiter with an in-process window (no external store configured).
    pub fn in_memory(limit: u32, window: Duration, fail_open: bool) -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(HashMap::new())),
            limit,
            window,
            fail_open,
        }
    }

    /// Limiter backed by a Redis connection manager.
    pub fn with_redis(
        connection: ConnectionManager,
        limit: u32,
        window: Duration,
        fail_open: bool,
    ) -> Self {
        Self {
            backend: Backend::Redis(connection),
            limit,
            window,
            fail_open,
        }
    }

    /// Check whether `identifier` may make another request.
    ///
    /// Never returns an error: store failures are folded into the decision
    /// according to the fail-open policy.
    pub async fn check(&self, identifier: &str) -> RateLimitDecision {
        match &self.backend {
            Backend::Memory(windows) => self.check_memory(windows, identifier).await,
            Backend::Redis(connection) => {
                let outcome = self.check_redis(connection.clone(), identifier).await;
                match outcome {
                    Ok(decision) => decision,
                    Err(err) => {
                        tracing::warn!(error = %err, "rate-limit store unreachable");
                        resolve_store_failure(self.fail_open, self.limit, self.window)
                    }
                }
            }
        }
    }

    async fn check_memory(
        &self,
        windows: &Mutex<HashMap<String, VecDeque<Instant>>>,
        identifier: &str,
    ) -> RateLimitDecision {
        let mut windows = windows.lock().await;
        let now = Instant::now();
        let entries = windows.entry(identifier.to_string()).or_default();

        // Drop timestamps that have left the trailing window
        while let Some(&oldest) = entries.front() {
            if now.duration_since(oldest) >= self.window {
                entries.pop_front();
            } else {
                break;
            }
        }

        if (entries.len() as u32) < self.limit {
            entries.push_back(now);
            let used = entries.len() as u32;
            let reset_in = entries
                .front()
                .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)))
                .unwrap_or(self.window);
            RateLimitDecision {
                allowed: true,
                limit: self.limit,
                remaining: self.limit - used,
                reset_in,
            }
        } else {
            // Denied attempts are not recorded, so a full window drains
            // after exactly `window` regardless of retries
            let reset_in = entries
                .front()
                .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)))
                .unwrap_or(self.window);
            RateLimitDecision {
                allowed: false,
                limit: self.limit,
                remaining: 0,
                reset_in,
            }
        }
    }

    async fn check_redis(
        &self,
        mut connection: ConnectionManager,
        identifier: &str,
    ) -> Result<RateLimitDecision, redis::RedisError> {
        let key = format!("ratelimit:{identifier}");
        let now_ms = chrono::Utc::now().timestamp_millis();
        let window_ms = self.window.as_millis() as i64;
        let member = format!("{now_ms}-{}", uuid::Uuid::new_v4());

        // Trim the window, count it, then record this request only if a
        // slot is free. Two small atomic pipelines keep the logic plain.
        let (count,): (u32,) = redis::pipe()
            .atomic()
            .cmd("ZREMRANGEBYSCORE")
            .arg(&key)
            .arg(0)
            .arg(now_ms - window_ms)
            .ignore()
            .cmd("ZCARD")
            .arg(&key)
            .query_async(&mut connection)
            .await?;

        if count < self.limit {
            redis::pipe()
                .atomic()
                .cmd("ZADD")
                .arg(&key)
                .arg(now_ms)
                .arg(&member)
                .ignore()
                .cmd("PEXPIRE")
                .arg(&key)
                .arg(window_ms)
                .ignore()
                .query_async::<()>(&mut connection)
                .await?;
        }

        let oldest: Vec<(String, i64)> = redis::cmd("ZRANGE")
            .arg(&key)
            .arg(0)
            .arg(0)
            .arg("WITHSCORES")
            .query_async(&mut connection)
            .await?;
        let reset_in = oldest
            .first()
            .map(|(_, score)| {
                let elapsed_ms = (now_ms - score).max(0) as u64;
                self.window.saturating_sub(Duration::from_millis(elapsed_ms))
            })
            .unwrap_or(self.window);

        Ok(RateLimitDecision {
            allowed: count < self.limit,
            limit: self.limit,
            remaining: self.limit.saturating_sub(count + 1).min(self.limit),
            reset_in,
        })
    }
}

/// Fold a store failure into a decision per the fail-open policy.
///
/// Fail-open allows the request; fail-closed denies it with a full-window
/// retry hint.
fn resolve_store_failure(fail_open: bool, limit: u32, window: Duration) -> RateLimitDecision {
    RateLimitDecision {
        allowed: fail_open,
        limit,
        remaining: 0,
        reset_in: window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(10);

    #[tokio::test(start_paused = true)]
    async fn eleventh_request_in_window_is_denied() {
        let limiter = RateLimiter::in_memory(10, WINDOW, true);

        for i in 0..10 {
            let decision = limiter.check("user-1").await;
            assert!(decision.allowed, "request {} should pass", i + 1);
        }

        let denied = limiter.check("user-1").await;
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert!(denied.reset_in <= WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn window_frees_up_after_it_elapses() {
        let limiter = RateLimiter::in_memory(10, WINDOW, true);

        for _ in 0..10 {
            assert!(limiter.check("user-1").await.allowed);
        }
        assert!(!limiter.check("user-1").await.allowed);

        tokio::time::advance(WINDOW).await;

        assert!(limiter.check("user-1").await.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_rather_than_resetting() {
        let limiter = RateLimiter::in_memory(2, WINDOW, true);

        assert!(limiter.check("user-1").await.allowed);
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(limiter.check("user-1").await.allowed);
        assert!(!limiter.check("user-1").await.allowed);

        // Five more seconds only expire the first timestamp
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(limiter.check("user-1").await.allowed);
        assert!(!limiter.check("user-1").await.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn identifiers_have_independent_windows() {
        let limiter = RateLimiter::in_memory(1, WINDOW, true);

        assert!(limiter.check("user-1").await.allowed);
        assert!(!limiter.check("user-1").await.allowed);
        assert!(limiter.check("user-2").await.allowed);
    }

    #[test]
    fn store_failure_resolves_by_policy() {
        let open = resolve_store_failure(true, 10, WINDOW);
        assert!(open.allowed);
        assert_eq!(open.limit, 10);

        let closed = resolve_store_failure(false, 10, WINDOW);
        assert!(!closed.allowed);
        assert_eq!(closed.reset_in, WINDOW);
    }
}

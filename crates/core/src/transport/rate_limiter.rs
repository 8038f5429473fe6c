//! Process-wide call rate limiter.
//!
//! Every outbound request passes through a shared [`RateLimiter`]. It is a
//! cooperative throttle: callers that arrive too early sleep until their
//! slot, they are never rejected.

use std::collections::VecDeque;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

/// Snapshot of the limiter state.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub max_calls_per_second: f64,
    /// Calls admitted during the last second.
    pub calls_in_window: usize,
    pub next_available_in_ms: Option<u64>,
}

/// Sliding one-second window limiter.
///
/// Consecutive calls are spaced at least `1 / max_calls_per_second` apart.
/// The lock is held while sleeping, so concurrent callers queue up behind
/// each other in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls_per_second: f64,
    min_interval: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

const WINDOW: Duration = Duration::from_secs(1);

impl RateLimiter {
    /// Create a limiter admitting up to `max_calls_per_second` calls.
    ///
    /// Non-positive rates disable throttling.
    pub fn new(max_calls_per_second: f64) -> Self {
        let min_interval = if max_calls_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / max_calls_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            max_calls_per_second,
            min_interval,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    /// Wait for a slot and record the call.
    pub async fn acquire(&self) {
        let mut calls = self.calls.lock().await;
        let now = Instant::now();
        prune(&mut calls, now);

        if let Some(last) = calls.back() {
            let elapsed = now.duration_since(*last);
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }

        calls.push_back(Instant::now());
    }

    pub async fn status(&self) -> RateLimitStatus {
        let mut calls = self.calls.lock().await;
        let now = Instant::now();
        prune(&mut calls, now);

        let next_available_in_ms = calls.back().and_then(|last| {
            let elapsed = now.duration_since(*last);
            (elapsed < self.min_interval)
                .then(|| (self.min_interval - elapsed).as_millis() as u64)
        });

        RateLimitStatus {
            max_calls_per_second: self.max_calls_per_second,
            calls_in_window: calls.len(),
            next_available_in_ms,
        }
    }
}

fn prune(calls: &mut VecDeque<Instant>, now: Instant) {
    while let Some(front) = calls.front() {
        if now.duration_since(*front) >= WINDOW {
            calls.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_rate_limiter_new() {
        let limiter = RateLimiter::new(10.0);
        assert_eq!(limiter.min_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_rate_limiter_zero_rate_disables() {
        let limiter = RateLimiter::new(0.0);
        assert_eq!(limiter.min_interval, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_first_call_is_immediate() {
        let limiter = RateLimiter::new(1.0);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_consecutive_calls_are_spaced() {
        let limiter = RateLimiter::new(20.0); // 50ms apart
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        // Two waits of ~50ms each
        assert!(start.elapsed() >= Duration::from_millis(95));
    }

    #[tokio::test]
    async fn test_status_counts_window() {
        let limiter = RateLimiter::new(100.0);
        limiter.acquire().await;
        limiter.acquire().await;

        let status = limiter.status().await;
        assert_eq!(status.calls_in_window, 2);
        assert_eq!(status.max_calls_per_second, 100.0);
    }

    #[tokio::test]
    async fn test_status_idle_limiter() {
        let limiter = RateLimiter::new(5.0);
        let status = limiter.status().await;
        assert_eq!(status.calls_in_window, 0);
        assert!(status.next_available_in_ms.is_none());
    }

    #[tokio::test]
    async fn test_shared_across_tasks() {
        let limiter = Arc::new(RateLimiter::new(20.0));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // Four callers, three enforced gaps of 50ms
        assert!(start.elapsed() >= Duration::from_millis(145));
    }
}

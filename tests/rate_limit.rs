//! Timing tests for the shared request budget
//!
//! All tests run on a paused tokio clock, so waits are instant and exact.

use futures::future::join_all;
use goctruyen::config::RateLimitConfig;
use goctruyen::net::{RateLimiter, RequestKind};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn limiter(requests_per_window: usize, window_ms: u64, ignore_images: bool) -> RateLimiter {
    RateLimiter::new(RateLimitConfig {
        requests_per_window,
        window_ms,
        ignore_images,
    })
}

/// Paused-clock timers fire on millisecond ticks, so compare at second resolution.
fn whole_seconds(elapsed: Duration) -> u64 {
    elapsed.as_secs()
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_budget_allows_burst_then_waits() {
        let limiter = limiter(5, 1000, true);
        let start = Instant::now();

        for _ in 0..5 {
            limiter.acquire(RequestKind::Document).await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire(RequestKind::Document).await;
        assert_eq!(whole_seconds(start.elapsed()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_refills_after_window() {
        let limiter = limiter(3, 500, true);

        for _ in 0..3 {
            limiter.acquire(RequestKind::Document).await;
        }
        tokio::time::advance(Duration::from_millis(500)).await;

        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire(RequestKind::Document).await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_images_are_exempt_when_configured() {
        let limiter = limiter(1, 1000, true);
        let start = Instant::now();

        limiter.acquire(RequestKind::Document).await;
        for _ in 0..50 {
            limiter.acquire(RequestKind::Image).await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_images_count_when_not_exempt() {
        let limiter = limiter(1, 1000, false);
        let start = Instant::now();

        limiter.acquire(RequestKind::Image).await;
        limiter.acquire(RequestKind::Image).await;
        assert_eq!(whole_seconds(start.elapsed()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_served_in_order() {
        let limiter = Arc::new(limiter(2, 1000, true));
        let completed = Arc::new(Mutex::new(Vec::new()));
        let start = Instant::now();

        let callers = (0..6).map(|index| {
            let limiter = Arc::clone(&limiter);
            let completed = Arc::clone(&completed);
            async move {
                limiter.acquire(RequestKind::Document).await;
                completed.lock().push((index, start.elapsed()));
            }
        });
        join_all(callers).await;

        let completed = completed.lock().clone();
        let order: Vec<usize> = completed.iter().map(|(index, _)| *index).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);

        let waits: Vec<u64> = completed
            .iter()
            .map(|(_, elapsed)| whole_seconds(*elapsed))
            .collect();
        assert_eq!(waits, vec![0, 0, 1, 1, 2, 2]);
    }
}

//! Per-source request pacing.
//!
//! Every external catalog owns exactly one [`RateLimiter`]; limiters are
//! never shared across sources. Pacing is proactive only; reactive
//! handling of HTTP 429 (and any server-supplied retry-after hint) is the
//! source integration's job, layered on top of this.

use crate::config::RateBudgetConfig;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// A request budget: at most `max_requests` request starts per `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateBudget {
    pub max_requests: u32,
    pub interval: Duration,
}

impl RateBudget {
    #[must_use]
    pub const fn new(max_requests: u32, interval: Duration) -> Self {
        Self {
            max_requests,
            interval,
        }
    }
}

impl From<RateBudgetConfig> for RateBudget {
    fn from(config: RateBudgetConfig) -> Self {
        Self::new(config.max_requests, config.interval())
    }
}

/// Sliding-window request pacer.
///
/// `wait_if_needed` suspends the caller until issuing the next request stays
/// within the budget. Waiters are served strictly FIFO: the window state
/// lives behind a fair async mutex that is held across the wait, so a later
/// caller can never overtake an earlier one. There is no request priority.
#[derive(Debug)]
pub struct RateLimiter {
    budget: RateBudget,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(budget: RateBudget) -> Self {
        debug!(
            max_requests = budget.max_requests,
            interval_ms = budget.interval.as_millis() as u64,
            "created rate limiter"
        );
        Self {
            budget,
            window: Mutex::new(VecDeque::with_capacity(budget.max_requests as usize)),
        }
    }

    /// Suspend until it is safe to issue the next request, then record the
    /// request start.
    pub async fn wait_if_needed(&self) {
        let mut window = self.window.lock().await;

        loop {
            let now = Instant::now();
            self.prune(&mut window, now);

            if (window.len() as u32) < self.budget.max_requests {
                window.push_back(now);
                return;
            }

            // Window full: the oldest recorded start bounds when a slot
            // frees up. The lock stays held through the sleep to keep
            // ordering strict.
            let oldest = *window.front().expect("window is non-empty when full");
            let ready_at = oldest + self.budget.interval;
            debug!(
                wait_ms = ready_at.saturating_duration_since(now).as_millis() as u64,
                "rate limiter pacing request"
            );
            sleep_until(ready_at).await;
        }
    }

    /// Whether a request would be admitted right now without waiting.
    pub async fn check(&self) -> bool {
        let mut window = self.window.lock().await;
        let now = Instant::now();
        self.prune(&mut window, now);
        (window.len() as u32) < self.budget.max_requests
    }

    /// Time until the next request would be admitted, `None` if immediately.
    pub async fn time_until_ready(&self) -> Option<Duration> {
        let mut window = self.window.lock().await;
        let now = Instant::now();
        self.prune(&mut window, now);

        if (window.len() as u32) < self.budget.max_requests {
            None
        } else {
            let oldest = *window.front().expect("window is non-empty when full");
            Some((oldest + self.budget.interval).saturating_duration_since(now))
        }
    }

    /// The configured budget
    #[must_use]
    pub const fn budget(&self) -> RateBudget {
        self.budget
    }

    fn prune(&self, window: &mut VecDeque<Instant>, now: Instant) {
        while let Some(front) = window.front() {
            if now.duration_since(*front) >= self.budget.interval {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_burst_is_immediate() {
        let limiter = RateLimiter::new(RateBudget::new(3, Duration::from_secs(5)));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.wait_if_needed().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(!limiter.check().await);
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_lower_bound_holds() {
        // 2 requests per 1s: 5 calls must take at least (ceil(5/2)-1) * 1s.
        let limiter = RateLimiter::new(RateBudget::new(2, Duration::from_secs(1)));
        let start = Instant::now();
        for _ in 0..5 {
            limiter.wait_if_needed().await;
        }
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn window_frees_after_interval() {
        let limiter = RateLimiter::new(RateBudget::new(1, Duration::from_secs(2)));
        limiter.wait_if_needed().await;
        assert!(!limiter.check().await);
        assert_eq!(
            limiter.time_until_ready().await,
            Some(Duration::from_secs(2))
        );

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(limiter.check().await);
        assert_eq!(limiter.time_until_ready().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_waiters_all_complete_within_budget() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(RateBudget::new(2, Duration::from_secs(1))));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..6 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.wait_if_needed().await;
                Instant::now()
            }));
        }

        let mut finish_times = Vec::new();
        for handle in handles {
            finish_times.push(handle.await.unwrap());
        }
        finish_times.sort();

        // 6 requests at 2/s: the last may start no earlier than 2s in.
        assert!(finish_times.last().unwrap().duration_since(start) >= Duration::from_secs(2));
        // And within any 1s window, at most 2 requests started.
        for pair in finish_times.windows(3) {
            assert!(pair[2].duration_since(pair[0]) >= Duration::from_secs(1));
        }
    }
}

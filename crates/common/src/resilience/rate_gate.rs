//! Rate gate enforcing a minimum interval between calls
//!
//! Unlike a token bucket, the gate never allows bursts: every permit starts
//! at least `min_interval` after the previous one. The check, the wait and
//! the timestamp update all happen while holding one async mutex, so
//! concurrent callers queue up behind each other instead of computing their
//! wait against the same stale timestamp.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::trace;

/// Serializes permits for one upstream API.
///
/// Construct one gate per API and share it with `Arc`.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use ledgerlink_common::resilience::RateGate;
///
/// # async fn example() {
/// let gate = RateGate::per_period(25, Duration::from_secs(5));
/// assert_eq!(gate.min_interval(), Duration::from_millis(200));
///
/// gate.acquire().await;
/// // ... issue the request
/// # }
/// ```
#[derive(Debug)]
pub struct RateGate {
    name: String,
    min_interval: Duration,
    last_permit: Mutex<Option<Instant>>,
}

impl RateGate {
    /// Create a gate with an explicit minimum interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self { name: String::from("default"), min_interval, last_permit: Mutex::new(None) }
    }

    /// Create a gate from a published limit of `limit` calls per `period`.
    ///
    /// A zero limit is treated as one call per period.
    #[must_use]
    pub fn per_period(limit: u32, period: Duration) -> Self {
        Self::new(period / limit.max(1))
    }

    /// Attach a name used in trace output.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a call is permitted, then record it.
    ///
    /// The first call on a fresh gate returns immediately.
    pub async fn acquire(&self) {
        let mut last_permit = self.last_permit.lock().await;

        if let Some(previous) = *last_permit {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                trace!(gate = %self.name, wait_ms = wait.as_millis() as u64, "Rate gate delaying call");
                sleep(wait).await;
            }
        }

        *last_permit = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn per_period_divides_window() {
        let gate = RateGate::per_period(25, Duration::from_secs(5));
        assert_eq!(gate.min_interval(), Duration::from_millis(200));

        let crm = RateGate::per_period(6000, Duration::from_secs(300));
        assert_eq!(crm.min_interval(), Duration::from_millis(50));
    }

    #[test]
    fn zero_limit_falls_back_to_whole_period() {
        let gate = RateGate::per_period(0, Duration::from_secs(1));
        assert_eq!(gate.min_interval(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let gate = RateGate::new(Duration::from_millis(200));
        let start = Instant::now();

        gate.acquire().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_calls_are_spaced() {
        let gate = RateGate::new(Duration::from_millis(200));
        let start = Instant::now();

        gate.acquire().await;
        gate.acquire().await;
        gate.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_never_share_a_slot() {
        let gate = Arc::new(RateGate::new(Duration::from_millis(200)));
        let permits = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            let permits = permits.clone();
            handles.push(tokio::spawn(async move {
                gate.acquire().await;
                let permitted_at = Instant::now();
                permits.lock().await.push(permitted_at);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut permits = permits.lock().await.clone();
        permits.sort();
        assert_eq!(permits.len(), 8);
        for pair in permits.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(200));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn idle_gate_does_not_delay() {
        let gate = RateGate::new(Duration::from_millis(200));
        gate.acquire().await;

        tokio::time::advance(Duration::from_millis(500)).await;
        let before = Instant::now();
        gate.acquire().await;

        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}

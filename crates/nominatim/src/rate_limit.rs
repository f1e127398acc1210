use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;

/// Process-wide outbound request gate.
///
/// Callers queue on a fair mutex holding the instant of the last request that
/// actually went out. The head of the queue waits until `min_interval` has
/// passed since then, so admissions are spaced regardless of how many tasks
/// are in flight.
pub struct RateLimiter {
    last_sent: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
}

/// The right to send exactly one request.
///
/// Holding a permit blocks every other caller. Call [`Permit::mark_sent`]
/// right before the request goes on the wire; a permit dropped without it
/// (cancelled caller, failed setup) gives its slot back.
pub struct Permit {
    guard: OwnedMutexGuard<Option<Instant>>,
    sent: bool,
}

impl RateLimiter {
    /// Create a limiter admitting at most one request per `min_interval`.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_sent: Arc::new(Mutex::new(None)),
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for the next free slot.
    pub async fn acquire(&self) -> Permit {
        let start = Instant::now();
        let guard = self.last_sent.clone().lock_owned().await;

        if let Some(last) = *guard {
            let ready_at = last + self.min_interval;
            if ready_at > Instant::now() {
                tracing::debug!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "Rate limiting geocoding request"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        metrics::histogram!("geocode.rate_limit.wait").record(start.elapsed().as_secs_f64());
        Permit { guard, sent: false }
    }
}

impl Permit {
    /// Consume the slot and let the next caller start its countdown.
    pub fn mark_sent(mut self) {
        *self.guard = Some(Instant::now());
        self.sent = true;
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if !self.sent {
            metrics::counter!("geocode.rate_limit.released").increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        limiter.acquire().await.mark_sent();
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_spaced_one_second_apart() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(1)));
        let mut handles = Vec::new();

        for _ in 0..4 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                let permit = limiter.acquire().await;
                let admitted = Instant::now();
                permit.mark_sent();
                admitted
            }));
        }

        let mut admissions = Vec::new();
        for handle in handles {
            admissions.push(handle.await.unwrap());
        }
        admissions.sort();

        for pair in admissions.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= Duration::from_millis(990), "gap too small: {gap:?}");
        }
    }

    #[tokio::test]
    async fn test_unsent_permit_returns_its_slot() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        limiter.acquire().await.mark_sent();

        // Reserved after the wait, then abandoned before sending.
        let permit = limiter.acquire().await;
        drop(permit);

        // The abandoned reservation did not push the schedule back.
        let start = Instant::now();
        limiter.acquire().await.mark_sent();
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_cancelled_waiter_does_not_consume_budget() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(300)));
        let first_sent = Instant::now();
        limiter.acquire().await.mark_sent();

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                let permit = limiter.acquire().await;
                permit.mark_sent();
            })
        };
        // Let the waiter take the lock and start sleeping, then abandon it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        waiter.abort();
        let _ = waiter.await;

        limiter.acquire().await.mark_sent();
        let elapsed = first_sent.elapsed();
        assert!(elapsed >= Duration::from_millis(290));
        assert!(elapsed < Duration::from_millis(550), "slot was consumed: {elapsed:?}");
    }

    #[tokio::test]
    async fn test_sent_permit_delays_next_caller() {
        let limiter = RateLimiter::new(Duration::from_millis(300));
        limiter.acquire().await.mark_sent();

        let start = Instant::now();
        limiter.acquire().await.mark_sent();
        assert!(start.elapsed() >= Duration::from_millis(290));
    }
}

//! Minimum-interval rate limiting shared by every caller of one client.

use std::time::Duration;

use tokio::{sync::Mutex, time::Instant};

/// Spaces request starts at least `min_interval` apart.
///
/// The lock is held while waiting so concurrent callers queue up behind each
/// other instead of all waking at the same instant.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait until the caller may issue its request.
    pub(crate) async fn acquire(&self) {
        let mut next_slot = self.next_slot.lock().await;
        if let Some(slot) = *next_slot {
            tokio::time::sleep_until(slot).await;
        }
        *next_slot = Some(Instant::now() + self.min_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to build Tokio runtime")
            .block_on(future)
    }

    #[rstest]
    fn first_call_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        let started = std::time::Instant::now();
        block_on(limiter.acquire());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[rstest]
    fn consecutive_calls_are_spaced() {
        let interval = Duration::from_millis(40);
        let limiter = RateLimiter::new(interval);
        let started = std::time::Instant::now();

        block_on(async {
            limiter.acquire().await;
            limiter.acquire().await;
            limiter.acquire().await;
        });

        assert!(started.elapsed() >= interval * 2);
    }
}

//! Single-writer guard ensuring one ingestion run at a time.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Hands out at most one [`RunToken`] at a time.
///
/// # Examples
///
/// ```
/// use pitwall_data::ingest::RunGuard;
///
/// let guard = RunGuard::default();
/// let token = guard.try_acquire().expect("first acquire succeeds");
/// assert!(guard.try_acquire().is_none());
/// drop(token);
/// assert!(guard.try_acquire().is_some());
/// ```
#[derive(Debug, Default)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    /// Claim the run slot, or `None` if a run already holds it.
    #[must_use]
    pub fn try_acquire(&self) -> Option<RunToken> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunToken {
                running: Arc::clone(&self.running),
            })
    }

    /// Whether a token is currently outstanding.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Proof that the holder owns the run slot; releases it on drop.
#[derive(Debug)]
pub struct RunToken {
    running: Arc<AtomicBool>,
}

impl Drop for RunToken {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn token_release_reopens_the_slot() {
        let guard = RunGuard::default();
        assert!(!guard.is_running());

        let token = guard.try_acquire();
        assert!(token.is_some());
        assert!(guard.is_running());
        assert!(guard.try_acquire().is_none());

        drop(token);
        assert!(!guard.is_running());
    }

    #[rstest]
    fn racing_threads_get_exactly_one_token() {
        let guard = Arc::new(RunGuard::default());
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    guard.try_acquire()
                })
            })
            .collect();
        let tokens: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread should not panic"))
            .collect();

        assert_eq!(tokens.iter().filter(|token| token.is_some()).count(), 1);
    }
}

//! Request-rate limiting shared across concurrent fetches

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;

/// Bounds outbound requests to a fixed number per time window.
///
/// [`acquire`](RateLimiter::acquire) never rejects a caller: when the window
/// budget is exhausted it suspends until an earlier permit expires. Clones
/// share the same budget, so one limiter can gate any number of concurrent
/// fetch tasks.
#[derive(Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    window: Duration,
}

impl RateLimiter {
    /// Create a rate limiter allowing `max_requests` per `window`
    ///
    /// # Arguments
    /// * `max_requests` - Maximum requests per window
    /// * `window` - Time window for the budget
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_requests)),
            window,
        }
    }

    /// Acquire a request slot, waiting until one is free
    ///
    /// The owned permit is held for the window duration and released by a
    /// background task, so at most `max_requests` acquisitions complete within
    /// any window of that length.
    pub async fn acquire(&self) {
        // The semaphore is owned by this limiter and never closed.
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("rate limiter semaphore is never closed");

        let window = self.window;
        tokio::spawn(async move {
            sleep(window).await;
            drop(permit);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_basic() {
        let limiter = RateLimiter::new(10, Duration::from_millis(100));
        limiter.acquire().await;
    }

    #[tokio::test]
    async fn test_clones_share_budget() {
        let limiter = RateLimiter::new(2, Duration::from_millis(100));
        let clone = limiter.clone();

        let start = std::time::Instant::now();
        limiter.acquire().await;
        clone.acquire().await;
        // Third acquisition exceeds the shared budget and must wait.
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}

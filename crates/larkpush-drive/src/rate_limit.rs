//! Sliding-window rate limiting for drive API calls
//!
//! The open platform enforces a per-app call budget; exceeding it gets the
//! tenant throttled for minutes at a time. Rather than reacting to rejection
//! responses, every API call in this crate first passes through a
//! [`SlidingWindowLimiter`] that proactively caps the admission rate.
//!
//! The limiter never rejects a call. A call that would exceed the window
//! bound sleeps until the oldest admitted call ages out, then retries.
//! It is shared across the whole worker pool via `Arc`.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Default number of calls admitted per window
pub const DEFAULT_MAX_CALLS: usize = 5;

/// Default window length
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

// ============================================================================
// SlidingWindowLimiter
// ============================================================================

/// Sliding-window rate limiter shared by all drive API calls
///
/// Keeps the admission timestamps of the last `max_calls` calls in a
/// deque. A new call is admitted when fewer than `max_calls` timestamps
/// fall within the trailing `period`; otherwise [`acquire`] sleeps until
/// the oldest timestamp exits the window.
///
/// Unlike a token bucket there is no burst credit: at most `max_calls`
/// admissions happen in any `period`-long interval, measured from each
/// admission instant.
///
/// [`acquire`]: SlidingWindowLimiter::acquire
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    /// Maximum number of admitted calls per window
    max_calls: usize,
    /// Window length
    period: Duration,
    /// Admission timestamps, oldest first
    window: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    /// Creates a new limiter admitting at most `max_calls` per `period`.
    ///
    /// A `max_calls` of zero is clamped to 1 so the limiter can never
    /// deadlock every caller.
    pub fn new(max_calls: usize, period: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            period,
            window: Mutex::new(VecDeque::new()),
        }
    }

    /// Returns the configured maximum calls per window.
    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    /// Returns the configured window length.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Admits one call, sleeping as long as the window is full.
    ///
    /// Prunes timestamps older than `period`, then either records the
    /// admission and returns, or sleeps until the oldest timestamp ages
    /// out and re-checks. The internal lock is only held for the prune
    /// and admission check, never across the sleep, so concurrent
    /// callers queue on the timer rather than on the mutex.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();

                while let Some(&oldest) = window.front() {
                    if now.duration_since(oldest) >= self.period {
                        window.pop_front();
                    } else {
                        break;
                    }
                }

                if window.len() < self.max_calls {
                    window.push_back(now);
                    return;
                }

                // Full window: the next slot opens when the oldest
                // admission leaves it.
                match window.front() {
                    Some(&oldest) => (oldest + self.period).saturating_duration_since(now),
                    None => Duration::ZERO,
                }
            };

            debug!(wait_ms = wait.as_millis() as u64, "Rate limit window full, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of admissions currently inside the window.
    ///
    /// Prunes expired timestamps first, so the count reflects the
    /// instant of the call.
    pub async fn in_flight(&self) -> usize {
        let mut window = self.window.lock().await;
        let now = Instant::now();
        while let Some(&oldest) = window.front() {
            if now.duration_since(oldest) >= self.period {
                window.pop_front();
            } else {
                break;
            }
        }
        window.len()
    }
}

impl Default for SlidingWindowLimiter {
    /// Returns a limiter with the platform defaults (5 calls per second).
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CALLS, DEFAULT_PERIOD)
    }
}

// ============================================================================
// Tests
// ============================================================================

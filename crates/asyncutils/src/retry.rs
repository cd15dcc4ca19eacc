//! Retry with exponential backoff.
//!
//! Remote listings and downloads fail transiently (rate limits, dropped
//! connections). [`with_retry`] re-runs such an operation a bounded number of
//! times, sleeping `base_delay × 2^(attempt - 1)` between attempts, and folds
//! the final failure into a single [`ErrorKind::Exhausted`] error.

use crate::error::{ErrorKind, Result};
use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

// Evaluated at compile time.
const DEFAULT_ATTEMPTS: NonZeroU32 = NonZeroU32::new(3).unwrap();
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// How many times to attempt an operation, and how long to wait in between.
///
/// Run-wide settings live in one policy; call sites that need a different
/// attempt count derive a copy with [`with_attempts`](Self::with_attempts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: NonZeroU32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: NonZeroU32, base_delay: Duration) -> Self {
        Self { attempts, base_delay }
    }

    /// Copy of this policy with a different attempt count.
    pub const fn with_attempts(self, attempts: NonZeroU32) -> Self {
        Self { attempts, ..self }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.get()
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay to wait after the given (1-indexed) failed attempt.
    ///
    /// Saturates instead of overflowing for absurd attempt counts.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

/// Run `operation` until it succeeds or the policy's attempts are used up.
///
/// Each failure except the last logs a warning carrying the attempt number
/// and the computed delay. When every attempt fails, the last error is raised
/// into [`ErrorKind::Exhausted`], whose message names the attempt count, the
/// `label` and the last error's message.
///
/// The operation must be safe to repeat: listing is naturally idempotent and
/// downloads overwrite the same fresh destination.
///
/// # Examples
///
/// ```
/// use senas_asyncutils::{RetryPolicy, with_retry};
/// # #[derive(Debug, derive_more::Display, derive_more::Error)]
/// # #[display("unreachable")]
/// # struct Never;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy = RetryPolicy::default();
/// let answer = with_retry(&policy, "compute answer", || async { Ok::<_, exn::Exn<Never>>(42) })
///     .await
///     .unwrap();
/// assert_eq!(answer, 42);
/// # }
/// ```
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, exn::Exn<E>>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= attempts => {
                let message = (*err).to_string();
                tracing::debug!(label, attempts, "Giving up after final attempt");
                return Err(err.raise(ErrorKind::Exhausted {
                    attempts,
                    label: label.to_string(),
                    message,
                }));
            },
            Err(err) => {
                let delay = policy.delay_after(attempt);
                let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(label, attempt, attempts, delay_ms, error = ?err, "Retry {attempt}/{attempts} for {label} in {delay_ms}ms");
                tokio::time::sleep(delay).await;
                attempt += 1;
            },
        }
    }
}

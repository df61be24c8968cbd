//! Bounded retries with exponential delay.

use super::{StateError, retry_if_possible};

use std::time::Duration;

use tracing::debug;

use crate::{Error, Result};

/// The fallback delay before the first retry, in milliseconds.
pub const DEFAULT_STARTING_DELAY_MS: u64 = 200;
/// The fallback number of attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// The fallback growth factor of the delay between attempts.
pub const DEFAULT_TIME_MULTIPLE: f64 = 2.0;

/// The starting delay, attempt ceiling and growth factor governing retry spacing.
///
/// After attempt `n` fails, the next attempt waits `starting_delay * time_multiple^(n - 1)`.
/// There is no jitter and no cap beyond `max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// The delay after the first failed attempt.
    pub starting_delay: Duration,
    /// The total number of attempts, including the first one.
    pub max_attempts: u32,
    /// The factor the delay grows by after each failed attempt.
    pub time_multiple: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            starting_delay: Duration::from_millis(DEFAULT_STARTING_DELAY_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            time_multiple: DEFAULT_TIME_MULTIPLE,
        }
    }
}

impl BackoffPolicy {
    /// Returns the delay to wait after the given (1-based) attempt fails.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.time_multiple.powf(f64::from(attempt.saturating_sub(1)));
        Duration::try_from_secs_f64(self.starting_delay.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX)
    }

    /// Runs a read-only operation, retrying on [`Error::is_retryable`] errors.
    ///
    /// See: [`Self::execute_with`]
    ///
    /// # Errors
    ///
    /// Returns the operation's error unchanged if it is not retryable, or [`Error::RetryExhausted`] once every attempt failed.
    pub async fn execute<T, F, Fut>(&self, name: &str, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute_with(name, Error::is_retryable, operation).await
    }

    /// Runs a read-only operation, retrying whenever `retry_if` accepts its error.
    ///
    /// Never use this for side-effecting calls: a dispatch must not be silently repeated.
    ///
    /// # Errors
    ///
    /// Returns the operation's error unchanged if `retry_if` rejects it, or [`Error::RetryExhausted`] wrapping the final error once every attempt failed.
    pub async fn execute_with<T, F, Fut, P>(
        &self,
        name: &str,
        retry_if: P,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&Error) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt: u32 = 1;

        loop {
            let err = match operation()
                .await
                .map_err(|err| StateError::classify(err, &retry_if))
            {
                Ok(value) => return Ok(value),
                Err(StateError::Cancelled(err)) => return Err(err),
                Err(StateError::Retry(err)) => err,
            };
            debug!("{name}: attempt {attempt} failed: {err}");

            let delay = self.delay_for(attempt);
            if !retry_if_possible(name, &mut attempt, max_attempts) {
                return Err(Error::RetryExhausted {
                    attempts: max_attempts,
                    source: Box::new(err),
                });
            }

            debug!("{name}: waiting {}ms…", delay.as_millis());
            tokio::time::sleep(delay).await;
        }
    }
}

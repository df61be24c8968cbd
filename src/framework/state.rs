use tracing::{error, warn};

use crate::Error;

/// An error that controls the flow of a retry loop.
#[non_exhaustive]
#[derive(Debug)]
pub enum StateError {
    /// The control flow should retry if possible.
    ///
    /// See: [`retry_if_possible`]
    Retry(Error),
    /// The control flow should exit immediately.
    Cancelled(Error),
}

impl StateError {
    /// Sorts an [`Error`] into [`StateError::Retry`] or [`StateError::Cancelled`] using a retry predicate.
    pub fn classify<P>(err: Error, retry_if: P) -> Self
    where
        P: Fn(&Error) -> bool,
    {
        if retry_if(&err) {
            Self::Retry(err)
        } else {
            Self::Cancelled(err)
        }
    }
}

/// Decides whether another attempt is allowed, advancing `attempt` to the next attempt number.
///
/// Returns `false` once `attempt` would exceed `max_attempts`.
pub fn retry_if_possible(name: &str, attempt: &mut u32, max_attempts: u32) -> bool {
    *attempt += 1;
    if *attempt > max_attempts {
        error!("{name}: retried for too many times ({max_attempts}), stopping!");
        false
    } else {
        warn!("{name}: retrying… ({attempt} / {max_attempts})");
        true
    }
}

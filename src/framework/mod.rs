//! A framework that retries read-only transactions with exponential backoff until they succeed, are cancelled, or run out of attempts.

mod backoff;
mod state;

pub use backoff::*;
pub use state::*;

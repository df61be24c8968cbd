//! Error types for dispatching and discovering workflow runs.
//!
//! [`Error`] covers every stage of an invocation. Configuration errors are
//! raised before any network call. Errors from read-only API calls can be
//! retried through [`crate::framework::BackoffPolicy`], while a failed dispatch
//! is never retried.

use thiserror::Error;

use crate::config::DispatchMethod;

/// Core error type for dispatching and discovering workflow runs.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// An input is missing, forbidden for the dispatch method, or malformed.
    #[error("invalid input '{field}': {message}")]
    ConfigValidation {
        /// The name of the offending input.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The `workflow-inputs` input is not a JSON object.
    #[error("failed to parse input 'workflow-inputs': {message}")]
    PayloadParse {
        /// The parser's complaint.
        message: String,
    },

    /// A `workflow_dispatch` input value is not a string.
    #[error(
        "workflow_dispatch only supports string inputs: key '{key}' is {actual}, expected {expected}"
    )]
    TypeValidation {
        /// The offending key.
        key: String,
        /// The JSON type that was supplied.
        actual: &'static str,
        /// The JSON type that is required.
        expected: &'static str,
    },

    /// A dispatch call answered with a status outside its accepted set.
    #[error("{method}: failed to dispatch, expected one of {expected:?} but received {status}")]
    Dispatch {
        /// The dispatch method used.
        method: DispatchMethod,
        /// The status received.
        status: u16,
        /// The accepted statuses.
        expected: &'static [u16],
    },

    /// A read-only API call did not succeed.
    #[error("{operation}: expected 200 but received {status}")]
    Http {
        /// The operation that was attempted.
        operation: &'static str,
        /// The status received.
        status: u16,
    },

    /// The request could not be sent or its response could not be read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A workflow or run could not be found.
    #[error("{message}")]
    NotFound {
        /// What was looked for.
        message: String,
    },

    /// A retried operation kept failing until its attempts ran out.
    #[error("gave up after {attempts} attempts: {source}")]
    RetryExhausted {
        /// The number of attempts made.
        attempts: u32,
        /// The error of the final attempt.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns whether a read-only operation failing with this error is worth retrying.
    ///
    /// Any transport failure is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::NotFound { .. } | Self::Request(_)
        )
    }

    pub(crate) fn config(field: &'static str, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
}

/// Result type alias for dispatching and discovering workflow runs.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation_displays_field() {
        let err = Error::config("ref", "required for workflow_dispatch");
        let msg = err.to_string();
        assert!(msg.contains("'ref'"));
        assert!(msg.contains("required for workflow_dispatch"));
    }

    #[test]
    fn type_validation_displays_key_and_types() {
        let err = Error::TypeValidation {
            key: "hello".into(),
            actual: "boolean",
            expected: "string",
        };
        let msg = err.to_string();
        assert!(msg.contains("'hello'"));
        assert!(msg.contains("boolean"));
        assert!(msg.contains("string"));
    }

    #[test]
    fn dispatch_displays_status() {
        let err = Error::Dispatch {
            method: DispatchMethod::RepositoryDispatch,
            status: 422,
            expected: &[204],
        };
        let msg = err.to_string();
        assert!(msg.contains("repository_dispatch"));
        assert!(msg.contains("422"));
    }

    #[test]
    fn read_only_failures_are_retryable() {
        assert!(
            Error::Http {
                operation: "list workflows",
                status: 500
            }
            .is_retryable()
        );
        assert!(Error::not_found("no run").is_retryable());
    }

    #[test]
    fn dispatch_and_config_failures_are_not_retryable() {
        let dispatch = Error::Dispatch {
            method: DispatchMethod::WorkflowDispatch,
            status: 401,
            expected: &[200, 204],
        };
        assert!(!dispatch.is_retryable());
        assert!(!Error::config("owner", "required").is_retryable());
        assert!(
            !Error::PayloadParse {
                message: "EOF".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn retry_exhausted_keeps_last_error() {
        let err = Error::RetryExhausted {
            attempts: 5,
            source: Box::new(Error::not_found("no run")),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("5 attempts"));
        assert!(std::error::Error::source(&err).is_some());
    }
}

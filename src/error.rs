//! Error types used by the initvisor runtime and initializers.
//!
//! This module defines two main error enums:
//!
//! - [`InitError`]: errors raised by an individual initializer. These are captured
//!   into that initializer's [`Outcome`](crate::Outcome) and never cancel siblings.
//! - [`RuntimeError`]: fatal errors raised by the gate itself. The host must abort
//!   its startup sequence when it receives one.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Fatal errors produced by the initvisor runtime.
///
/// Every variant means the process reached an unknown initialization state.
/// None of them is retried.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// All initializers finished, but at least one of them failed.
    #[error("initialization failed: {}/{total} initializers failed: {failed:?}", .failed.len())]
    AggregateFailure {
        /// Names of failed initializers, in submission order.
        failed: Vec<String>,
        /// Number of initializers that were run.
        total: usize,
        /// `(name, reason)` pairs for every failure.
        failures: Vec<(String, String)>,
    },

    /// The combined wait exceeded the global deadline.
    #[error(
        "initialization timed out after {timeout:?}; pending: {pending:?}; failed: {:?}",
        names(.failures)
    )]
    Timeout {
        /// The configured global deadline.
        timeout: Duration,
        /// Initializers that had not reported when the deadline fired.
        pending: Vec<String>,
        /// `(name, reason)` for every initializer that failed or never reported,
        /// in submission order.
        failures: Vec<(String, String)>,
    },

    /// The combined wait was interrupted (external token or termination signal).
    #[error(
        "initialization interrupted; pending: {pending:?}; failed: {:?}",
        names(.failures)
    )]
    Interrupted {
        /// Initializers that had not reported when the interruption arrived.
        pending: Vec<String>,
        /// `(name, reason)` for every initializer that failed or never reported,
        /// in submission order.
        failures: Vec<(String, String)>,
    },

    /// Orchestration itself failed outside any initializer (panicking provider
    /// or runtime construction failure).
    #[error("unexpected orchestration failure: {reason}")]
    Unexpected {
        /// What went wrong.
        reason: String,
    },

    /// A configuration value is missing or malformed.
    #[error("invalid configuration: {reason}")]
    Config {
        /// What was wrong with the value.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use initvisor::RuntimeError;
    ///
    /// let err = RuntimeError::Interrupted { pending: vec![], failures: vec![] };
    /// assert_eq!(err.as_label(), "runtime_interrupted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AggregateFailure { .. } => "runtime_aggregate_failure",
            RuntimeError::Timeout { .. } => "runtime_timeout",
            RuntimeError::Interrupted { .. } => "runtime_interrupted",
            RuntimeError::Unexpected { .. } => "runtime_unexpected",
            RuntimeError::Config { .. } => "runtime_config",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::AggregateFailure { failed, total, .. } => {
                format!("failed {}/{total}: {failed:?}", failed.len())
            }
            RuntimeError::Timeout {
                timeout,
                pending,
                failures,
            } => format!(
                "timeout after {timeout:?}; pending={pending:?}; failed={:?}",
                names(failures)
            ),
            RuntimeError::Interrupted { pending, failures } => format!(
                "interrupted; pending={pending:?}; failed={:?}",
                names(failures)
            ),
            RuntimeError::Unexpected { reason } => format!("unexpected: {reason}"),
            RuntimeError::Config { reason } => format!("config: {reason}"),
        }
    }

    /// Names of the initializers that failed or never reported, in submission order.
    ///
    /// Empty for [`RuntimeError::Unexpected`] and [`RuntimeError::Config`].
    pub fn failed(&self) -> Vec<String> {
        self.failures()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// `(name, reason)` for every initializer that failed or never reported.
    pub fn failures(&self) -> &[(String, String)] {
        match self {
            RuntimeError::AggregateFailure { failures, .. }
            | RuntimeError::Timeout { failures, .. }
            | RuntimeError::Interrupted { failures, .. } => failures,
            RuntimeError::Unexpected { .. } | RuntimeError::Config { .. } => &[],
        }
    }
}

fn names(failures: &[(String, String)]) -> Vec<&str> {
    failures.iter().map(|(name, _)| name.as_str()).collect()
}

/// # Errors produced by an initializer.
///
/// Returned from [`Initializer::initialize`](crate::Initializer::initialize).
/// The engine records them on the initializer's outcome; they do not propagate
/// past the aggregator as individual errors.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// Initialization failed with an unrecoverable condition.
    #[error("initialization failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Initializer observed cancellation of its context and stopped.
    #[error("context cancelled")]
    Canceled,
}

impl InitError {
    /// Shorthand for [`InitError::Fail`].
    ///
    /// ```
    /// use initvisor::InitError;
    ///
    /// let err = InitError::fail("boom");
    /// assert_eq!(err.to_string(), "initialization failed: boom");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        InitError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            InitError::Fail { .. } => "init_failed",
            InitError::Canceled => "init_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            InitError::Fail { error } => format!("error: {error}"),
            InitError::Canceled => "context cancelled".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_failure_display_names_counts() {
        let err = RuntimeError::AggregateFailure {
            failed: vec!["C".into()],
            total: 3,
            failures: vec![("C".into(), "boom".into())],
        };
        assert_eq!(
            err.to_string(),
            "initialization failed: 1/3 initializers failed: [\"C\"]"
        );
        assert_eq!(err.failed(), ["C".to_string()]);
        assert_eq!(err.as_label(), "runtime_aggregate_failure");
    }

    #[test]
    fn timeout_reports_failed_and_pending() {
        let err = RuntimeError::Timeout {
            timeout: Duration::from_millis(100),
            pending: vec!["slow".into()],
            failures: vec![
                ("fast-fail".into(), "initialization failed: boom".into()),
                ("slow".into(), "did not complete before the deadline".into()),
            ],
        };
        assert_eq!(err.failed(), ["fast-fail".to_string(), "slow".to_string()]);
        assert_eq!(err.as_label(), "runtime_timeout");
        assert_eq!(
            err.to_string(),
            "initialization timed out after 100ms; pending: [\"slow\"]; failed: [\"fast-fail\", \"slow\"]"
        );
    }

    #[test]
    fn init_error_labels() {
        assert_eq!(InitError::fail("x").as_label(), "init_failed");
        assert_eq!(InitError::Canceled.as_label(), "init_canceled");
        assert_eq!(InitError::fail("x").as_message(), "error: x");
    }
}

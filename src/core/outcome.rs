//! # Per-initializer outcome.
//!
//! An [`Outcome`] is produced exactly once per submitted initializer and never
//! mutated afterwards. Initializers that never reported (deadline, interruption)
//! get a synthetic outcome built by [`Outcome::incomplete`].
//!
//! Wall-clock timestamps use the same clock as [`Event::at`](crate::Event::at), so
//! outcomes can be correlated with bus events and host logs.

use std::time::{Duration, SystemTime};

/// Immutable result of one initializer execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    name: String,
    priority: i32,
    started_at: SystemTime,
    duration: Duration,
    error: Option<String>,
}

impl Outcome {
    pub(crate) fn succeeded(
        name: impl Into<String>,
        priority: i32,
        started_at: SystemTime,
        duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            started_at,
            duration,
            error: None,
        }
    }

    pub(crate) fn failed(
        name: impl Into<String>,
        priority: i32,
        started_at: SystemTime,
        duration: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            started_at,
            duration,
            error: Some(error.into()),
        }
    }

    /// Outcome for an initializer that never reported back.
    ///
    /// `submitted_at` is when the batch was submitted; `waited` is how long the engine
    /// waited for it.
    pub(crate) fn incomplete(
        name: impl Into<String>,
        priority: i32,
        submitted_at: SystemTime,
        waited: Duration,
        reason: impl Into<String>,
    ) -> Self {
        Self::failed(name, priority, submitted_at, waited, reason)
    }

    /// Initializer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Initializer priority at submission time.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Wall-clock time `initialize` was entered (submission time for incomplete outcomes).
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Wall-clock time the outcome was recorded.
    pub fn finished_at(&self) -> SystemTime {
        self.started_at + self.duration
    }

    /// Time spent inside `initialize` (or waited, for incomplete outcomes).
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// `true` if `initialize` returned `Ok(())`.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Failure description, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_at_follows_duration() {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let outcome = Outcome::succeeded("catalog", 0, start, Duration::from_millis(250));
        assert_eq!(outcome.started_at(), start);
        assert_eq!(outcome.finished_at(), start + Duration::from_millis(250));
    }

    #[test]
    fn incomplete_keeps_reason() {
        let start = SystemTime::UNIX_EPOCH;
        let outcome = Outcome::incomplete(
            "stuck",
            3,
            start,
            Duration::from_millis(100),
            "did not complete before the deadline",
        );
        assert!(!outcome.is_success());
        assert_eq!(outcome.error(), Some("did not complete before the deadline"));
        assert_eq!(outcome.priority(), 3);
    }
}

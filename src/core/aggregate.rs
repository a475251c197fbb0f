//! # Result aggregation.
//!
//! [`aggregate`] folds the outcome set of one run into an [`AggregateReport`].
//! [`AggregateReport::into_result`] applies the all-or-nothing policy: a single
//! failed initializer fails the whole run with [`RuntimeError::AggregateFailure`].
//!
//! ```text
//! Vec<Outcome> ──► aggregate() ──► AggregateReport ──► into_result()
//!                                                        ├─ failed == 0 → Ok(report)
//!                                                        └─ failed  > 0 → Err(AggregateFailure)
//! ```

use std::fmt;
use std::time::Duration;

use crate::core::outcome::Outcome;
use crate::error::RuntimeError;

/// Summary of one initialization run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateReport {
    elapsed: Duration,
    outcomes: Vec<Outcome>,
}

/// Builds the report for a finished run.
///
/// Pure: `outcomes` is kept in the order given (submission order when called by the gate).
pub fn aggregate(outcomes: Vec<Outcome>, elapsed: Duration) -> AggregateReport {
    AggregateReport { elapsed, outcomes }
}

impl AggregateReport {
    /// Total wall time of the run.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Every outcome, in submission order.
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Number of initializers that were run.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of successful initializers.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of failed initializers.
    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// `true` if no initializer failed (including the empty run).
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(Outcome::is_success)
    }

    /// Names of failed initializers, in submission order.
    pub fn failed_names(&self) -> Vec<String> {
        self.failures().map(|(name, _)| name.to_string()).collect()
    }

    /// `(name, reason)` for every failed initializer.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error().map(|err| (o.name(), err)))
    }

    /// Duration of the named initializer, if it was part of the run.
    pub fn duration_of(&self, name: &str) -> Option<Duration> {
        self.outcomes
            .iter()
            .find(|o| o.name() == name)
            .map(Outcome::duration)
    }

    /// Applies the all-or-nothing policy.
    pub fn into_result(self) -> Result<Self, RuntimeError> {
        if self.is_success() {
            return Ok(self);
        }
        let failures: Vec<(String, String)> = self
            .failures()
            .map(|(name, err)| (name.to_string(), err.to_string()))
            .collect();
        Err(RuntimeError::AggregateFailure {
            failed: failures.iter().map(|(name, _)| name.clone()).collect(),
            total: self.total(),
            failures,
        })
    }
}

impl fmt::Display for AggregateReport {
    /// One-line summary: `3 initializers in 104ms: a=10ms, b=50ms, c=100ms`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} initializers in {}ms",
            self.total(),
            self.elapsed.as_millis()
        )?;
        for (i, o) in self.outcomes.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{sep}{}={}ms", o.name(), o.duration().as_millis())?;
            if !o.is_success() {
                write!(f, " (failed)")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn at() -> SystemTime {
        SystemTime::UNIX_EPOCH
    }

    #[test]
    fn all_success_passes() {
        let report = aggregate(
            vec![
                Outcome::succeeded("a", 0, at(), ms(10)),
                Outcome::succeeded("b", 0, at(), ms(50)),
            ],
            ms(52),
        );
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.duration_of("b"), Some(ms(50)));
        assert_eq!(report.to_string(), "2 initializers in 52ms: a=10ms, b=50ms");
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn single_failure_fails_run_and_keeps_successes() {
        let report = aggregate(
            vec![
                Outcome::succeeded("A", 0, at(), ms(10)),
                Outcome::succeeded("B", 1, at(), ms(50)),
                Outcome::failed("C", 2, at(), ms(0), "boom"),
            ],
            ms(50),
        );
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed_names(), vec!["C".to_string()]);

        let err = report.into_result().unwrap_err();
        assert_eq!(
            err,
            RuntimeError::AggregateFailure {
                failed: vec!["C".into()],
                total: 3,
                failures: vec![("C".into(), "boom".into())],
            }
        );
    }

    #[test]
    fn empty_run_is_success() {
        let report = aggregate(Vec::new(), Duration::ZERO);
        assert!(report.is_success());
        assert_eq!(report.total(), 0);
        assert_eq!(report.to_string(), "0 initializers in 0ms");
    }

    #[test]
    fn incomplete_counts_as_failure() {
        let slow = Outcome::incomplete("slow", 0, at(), ms(100), "did not complete before the deadline");
        let report = aggregate(vec![slow], ms(100));
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.outcomes()[0].error(),
            Some("did not complete before the deadline")
        );
    }
}

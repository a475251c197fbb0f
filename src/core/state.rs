//! # Run state machine.
//!
//! ```text
//! NotStarted ──begin()──► Running ──complete()──► Completed
//!                                └───fail()─────► Failed
//! ```
//!
//! ## Rules
//! - `NotStarted → Running` happens at most once (compare-and-set, never locked)
//! - `Completed` and `Failed` are terminal for the life of the cell

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a [`Gate`](crate::Gate).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RunState {
    /// `start()` was never called.
    NotStarted = 0,
    /// Initializers are running; `start()` has not returned yet.
    Running = 1,
    /// Every initializer succeeded.
    Completed = 2,
    /// The run ended in a fatal error.
    Failed = 3,
}

impl RunState {
    /// Stable lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::NotStarted => "not_started",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        }
    }

    /// `true` for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => RunState::NotStarted,
            1 => RunState::Running,
            2 => RunState::Completed,
            _ => RunState::Failed,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic holder of a [`RunState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(RunState::NotStarted as u8))
    }

    pub(crate) fn load(&self) -> RunState {
        RunState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Attempts `NotStarted → Running`; returns the observed state on failure.
    pub(crate) fn begin(&self) -> Result<(), RunState> {
        self.transition(RunState::NotStarted, RunState::Running)
    }

    pub(crate) fn complete(&self) -> Result<(), RunState> {
        self.transition(RunState::Running, RunState::Completed)
    }

    pub(crate) fn fail(&self) -> Result<(), RunState> {
        self.transition(RunState::Running, RunState::Failed)
    }

    fn transition(&self, from: RunState, to: RunState) -> Result<(), RunState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(RunState::from_u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn begin_succeeds_once() {
        let cell = StateCell::new();
        assert_eq!(cell.begin(), Ok(()));
        assert_eq!(cell.begin(), Err(RunState::Running));
        assert_eq!(cell.complete(), Ok(()));
        assert_eq!(cell.begin(), Err(RunState::Completed));
        assert_eq!(cell.fail(), Err(RunState::Completed));
        assert!(cell.load().is_terminal());
    }

    #[test]
    fn concurrent_begin_has_single_winner() {
        let cell = Arc::new(StateCell::new());
        let winners: usize = (0..16)
            .map(|_| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || cell.begin().is_ok())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(winners, 1);
        assert_eq!(cell.load(), RunState::Running);
    }
}

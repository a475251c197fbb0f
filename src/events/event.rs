//! # Runtime events emitted by the gate and the execution engine.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Run events**: gate lifecycle (starting, skipped, completed, failed)
//! - **Initializer events**: per-initializer execution (starting, succeeded, failed)
//! - **Abort events**: deadline, interruption and forced teardown
//!
//! The [`Event`] struct carries additional metadata such as timestamps, initializer
//! name, reasons, durations and counts.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use initvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::InitializerFailed)
//!     .with_initializer("message-catalog")
//!     .with_reason("boom")
//!     .with_duration(Duration::from_millis(12));
//!
//! assert_eq!(ev.kind, EventKind::InitializerFailed);
//! assert_eq!(ev.initializer.as_deref(), Some("message-catalog"));
//! assert_eq!(ev.duration_ms, Some(12));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `initializer`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `initializer`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Run events ===
    /// Gate won the run-once transition and is collecting initializers.
    RunStarting,

    /// `start()` was called again after the first run began.
    ///
    /// Sets:
    /// - `reason`: run state observed by the duplicate call
    RunSkipped,

    /// Every initializer succeeded.
    ///
    /// Sets:
    /// - `total`: number of initializers run
    /// - `duration_ms`: total elapsed wall time
    RunCompleted,

    /// The run ended in a fatal error.
    ///
    /// Sets:
    /// - `total`, `failed`: counts (when known)
    /// - `reason`: fatal error message
    /// - `duration_ms`: total elapsed wall time
    RunFailed,

    // === Initializer events ===
    /// Initializer was submitted and acquired a pool slot.
    ///
    /// Sets:
    /// - `initializer`: initializer name
    /// - `priority`: initializer priority
    InitializerStarting,

    /// Initializer finished successfully.
    ///
    /// Sets:
    /// - `initializer`: initializer name
    /// - `duration_ms`: time spent inside `initialize`
    InitializerSucceeded,

    /// Initializer returned an error or panicked.
    ///
    /// Sets:
    /// - `initializer`: initializer name
    /// - `duration_ms`: time spent inside `initialize`
    /// - `reason`: failure message
    InitializerFailed,

    // === Abort events ===
    /// Global deadline fired before every initializer reported.
    ///
    /// Sets:
    /// - `timeout_ms`: configured deadline
    /// - `failed`: number of pending initializers
    TimeoutHit,

    /// Combined wait was interrupted (external token or OS signal).
    ///
    /// Sets:
    /// - `failed`: number of pending initializers
    Interrupted,

    /// Pool did not drain within the grace period; remaining tasks were detached.
    ///
    /// Sets:
    /// - `timeout_ms`: grace period
    /// - `failed`: number of tasks still running
    ForcedShutdown,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the initializer (or subscriber), if applicable.
    pub initializer: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Elapsed time in milliseconds.
    pub duration_ms: Option<u64>,
    /// Deadline or grace period in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Initializer priority.
    pub priority: Option<i32>,
    /// Number of initializers in the run.
    pub total: Option<usize>,
    /// Number of failed or pending initializers.
    pub failed: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            initializer: None,
            reason: None,
            duration_ms: None,
            timeout_ms: None,
            priority: None,
            total: None,
            failed: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an initializer name.
    #[inline]
    pub fn with_initializer(mut self, name: impl Into<Arc<str>>) -> Self {
        self.initializer = Some(name.into());
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_duration(mut self, d: Duration) -> Self {
        self.duration_ms = Some(millis(d));
        self
    }

    /// Attaches a deadline (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis(d));
        self
    }

    /// Attaches an initializer priority.
    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Attaches run counts.
    #[inline]
    pub fn with_counts(mut self, total: usize, failed: usize) -> Self {
        self.total = Some(total);
        self.failed = Some(failed);
        self
    }

    /// Attaches only the failed/pending count.
    #[inline]
    pub fn with_failed(mut self, failed: usize) -> Self {
        self.failed = Some(failed);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_initializer(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_initializer(subscriber)
            .with_reason(info)
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::RunStarting);
        let b = Event::new(EventKind::RunStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_fill_fields() {
        let ev = Event::new(EventKind::RunFailed)
            .with_counts(3, 1)
            .with_timeout(Duration::from_secs(2))
            .with_reason("boom");
        assert_eq!(ev.total, Some(3));
        assert_eq!(ev.failed, Some(1));
        assert_eq!(ev.timeout_ms, Some(2000));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }

    #[test]
    fn subscriber_overflow_names_subscriber() {
        let ev = Event::subscriber_overflow("metrics", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.initializer.as_deref(), Some("metrics"));
        assert_eq!(
            ev.reason.as_deref(),
            Some("subscriber=metrics reason=full")
        );
    }
}

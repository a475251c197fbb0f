//! # LogWriter: `tracing` event renderer
//!
//! A minimal subscriber that renders incoming [`Event`]s through `tracing`.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see the output.
//!
//! ## Example output
//! ```text
//! INFO  initvisor: [run-starting]
//! DEBUG initvisor: [starting] initializer="message-catalog" priority=0
//! INFO  initvisor: [succeeded] initializer="message-catalog" duration_ms=12
//! ERROR initvisor: [failed] initializer="error-codes" duration_ms=3 err="boom"
//! ERROR initvisor: [timeout] timeout_ms=300000 pending=1
//! ERROR initvisor: [run-failed] failed=1 total=3 err="..."
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let name = e.initializer.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::RunStarting => info!(target: "initvisor", "[run-starting]"),
            EventKind::RunSkipped => {
                warn!(target: "initvisor", state = reason, "[run-skipped] duplicate start()")
            }
            EventKind::RunCompleted => info!(
                target: "initvisor",
                total = e.total,
                duration_ms = e.duration_ms,
                "[run-completed]"
            ),
            EventKind::RunFailed => error!(
                target: "initvisor",
                total = e.total,
                failed = e.failed,
                duration_ms = e.duration_ms,
                err = reason,
                "[run-failed]"
            ),
            EventKind::InitializerStarting => debug!(
                target: "initvisor",
                initializer = name,
                priority = e.priority,
                "[starting]"
            ),
            EventKind::InitializerSucceeded => info!(
                target: "initvisor",
                initializer = name,
                duration_ms = e.duration_ms,
                "[succeeded]"
            ),
            EventKind::InitializerFailed => error!(
                target: "initvisor",
                initializer = name,
                duration_ms = e.duration_ms,
                err = reason,
                "[failed]"
            ),
            EventKind::TimeoutHit => error!(
                target: "initvisor",
                timeout_ms = e.timeout_ms,
                pending = e.failed,
                "[timeout]"
            ),
            EventKind::Interrupted => {
                error!(target: "initvisor", pending = e.failed, "[interrupted]")
            }
            EventKind::ForcedShutdown => warn!(
                target: "initvisor",
                grace_ms = e.timeout_ms,
                still_running = e.failed,
                "[forced-shutdown]"
            ),
            EventKind::SubscriberOverflow => {
                warn!(target: "initvisor", subscriber = name, reason, "[subscriber-overflow]")
            }
            EventKind::SubscriberPanicked => {
                error!(target: "initvisor", subscriber = name, info = reason, "[subscriber-panicked]")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

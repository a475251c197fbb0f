//! # Run a single initializer.
//!
//! Executes one [`Initializer`] with timing and panic isolation, publishes lifecycle
//! events to [`Bus`] and folds the result into an [`Outcome`].
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   publish InitializerStarting → initialize() → Ok(())  → publish InitializerSucceeded
//!
//! Failure:
//!   publish InitializerStarting → initialize() → Err(e)  → publish InitializerFailed
//!
//! Panic:
//!   publish InitializerStarting → initialize() → panic   → publish InitializerFailed
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event: `InitializerSucceeded` or `InitializerFailed`
//! - Never returns an error: failures are data, siblings keep running
//! - A panic is caught and recorded as this initializer's failure

use std::time::SystemTime;

use futures::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    core::outcome::Outcome,
    events::{Bus, Event, EventKind},
    initializers::Initializer,
    subscribers::panic_message,
};

/// Runs `init` once and returns its outcome.
///
/// `ctx` is handed to the initializer; the engine cancels it on deadline or interruption.
pub(crate) async fn run_one<I: Initializer + ?Sized>(
    init: &I,
    ctx: CancellationToken,
    bus: &Bus,
) -> Outcome {
    let name = init.name();
    let priority = init.priority();
    bus.publish(
        Event::new(EventKind::InitializerStarting)
            .with_initializer(name)
            .with_priority(priority),
    );

    let started_at = SystemTime::now();
    let start = Instant::now();
    let res = std::panic::AssertUnwindSafe(init.initialize(ctx))
        .catch_unwind()
        .await;
    let duration = start.elapsed();

    let error = match res {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(panic_err) => Some(format!("panicked: {}", panic_message(&*panic_err))),
    };

    match error {
        None => {
            bus.publish(
                Event::new(EventKind::InitializerSucceeded)
                    .with_initializer(name)
                    .with_duration(duration),
            );
            Outcome::succeeded(name, priority, started_at, duration)
        }
        Some(err) => {
            bus.publish(
                Event::new(EventKind::InitializerFailed)
                    .with_initializer(name)
                    .with_duration(duration)
                    .with_reason(err.as_str()),
            );
            Outcome::failed(name, priority, started_at, duration, err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InitError;
    use crate::initializers::InitFn;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn success_is_timed() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let init = InitFn::arc("sleepy", |_ctx: CancellationToken| async {
            tokio::time::sleep(Duration::from_millis(40)).await;
            Ok(())
        });

        let outcome = run_one(init.as_ref(), CancellationToken::new(), &bus).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.duration(), Duration::from_millis(40));

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::InitializerStarting);
        let done = rx.recv().await.unwrap();
        assert_eq!(done.kind, EventKind::InitializerSucceeded);
        assert_eq!(done.duration_ms, Some(40));
    }

    #[tokio::test]
    async fn error_is_captured() {
        let bus = Bus::new(16);
        let init = InitFn::arc("C", |_ctx: CancellationToken| async {
            Err(InitError::fail("boom"))
        });

        let outcome = run_one(init.as_ref(), CancellationToken::new(), &bus).await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.error(), Some("initialization failed: boom"));
    }

    #[tokio::test]
    async fn panic_is_captured() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let init = InitFn::arc("explodes", |_ctx: CancellationToken| async {
            if true {
                panic!("kaboom");
            }
            Ok(())
        });

        let outcome = run_one(init.as_ref(), CancellationToken::new(), &bus).await;
        assert_eq!(outcome.error(), Some("panicked: kaboom"));

        let _starting = rx.recv().await.unwrap();
        let failed = rx.recv().await.unwrap();
        assert_eq!(failed.kind, EventKind::InitializerFailed);
        assert_eq!(failed.reason.as_deref(), Some("panicked: kaboom"));
    }
}

//! # Parallel execution engine.
//!
//! Runs an ordered batch of initializers on a bounded pool and waits for all of
//! them under a single global deadline.
//!
//! ## Architecture
//! ```text
//! run_all(initializers)
//!   ├─► empty? ──► Ok([])                        (no pool is created)
//!   ├─► Semaphore(pool_size) + JoinSet
//!   ├─► submit in priority order: spawn(acquire permit ─► runner::run_one)
//!   ├─► select! {
//!   │      all reported       ─► AllReported
//!   │      sleep(timeout)     ─► DeadlineHit  ─► publish TimeoutHit, cancel ctx, abort_all
//!   │      interrupt token    ─► Interrupted  ─► publish Interrupted, cancel ctx, abort_all
//!   │      OS signal          ─► Interrupted
//!   │   }
//!   └─► teardown (always): drain within grace, else publish ForcedShutdown and detach
//!
//! Err(Aborted { error, outcomes })   outcomes that reported + synthetic ones for pending
//! ```
//!
//! ## Rules
//! - One failing initializer never cancels its siblings
//! - The deadline covers the whole batch, not each initializer
//! - Teardown runs on every path; dropping the engine future aborts the pool as well
//! - Initializers that never reported are listed as pending in the fatal error
//! - On a fatal error the outcomes gathered so far are still returned for diagnostics
//! - Dropping the engine future cancels every initializer context

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::{
    sync::Semaphore,
    task::JoinSet,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{config::Config, outcome::Outcome, runner::run_one, shutdown::TermSignals},
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    initializers::InitializerRef,
};

/// How the combined wait resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    AllReported,
    DeadlineHit,
    Interrupted,
}

/// A fatal engine result together with every outcome, in submission order.
///
/// Initializers that never reported carry a synthetic failed outcome.
#[derive(Debug)]
pub(crate) struct Aborted {
    pub(crate) error: RuntimeError,
    pub(crate) outcomes: Vec<Outcome>,
}

/// Submitted initializers and their (eventual) outcomes, indexed by submission order.
struct Pool {
    set: JoinSet<(usize, Outcome)>,
    submitted: Vec<(String, i32)>,
    submitted_at: SystemTime,
    slots: Vec<Option<Outcome>>,
}

impl Pool {
    fn with_capacity(n: usize) -> Self {
        Self {
            set: JoinSet::new(),
            submitted: Vec::with_capacity(n),
            submitted_at: SystemTime::now(),
            slots: Vec::with_capacity(n),
        }
    }

    fn submit(
        &mut self,
        init: InitializerRef,
        semaphore: Arc<Semaphore>,
        ctx: CancellationToken,
        bus: Bus,
    ) {
        let index = self.submitted.len();
        self.submitted
            .push((init.name().to_string(), init.priority()));
        self.slots.push(None);

        self.set.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => run_one(init.as_ref(), ctx, &bus).await,
                Err(_closed) => Outcome::failed(
                    init.name(),
                    init.priority(),
                    SystemTime::now(),
                    Duration::ZERO,
                    "worker pool closed",
                ),
            };
            (index, outcome)
        });
    }

    /// Joins tasks until the set is empty. Aborted tasks leave their slot empty.
    async fn drain(&mut self) {
        while let Some(res) = self.set.join_next().await {
            if let Ok((index, outcome)) = res {
                if let Some(slot) = self.slots.get_mut(index) {
                    *slot = Some(outcome);
                }
            }
        }
    }

    /// Forced shutdown: interrupt initializers and abort every outstanding task.
    fn force(&mut self, ctx: &CancellationToken) {
        ctx.cancel();
        self.set.abort_all();
    }

    /// Waits up to `grace` for the pool to empty; detaches whatever is left.
    async fn teardown(&mut self, grace: Duration, bus: &Bus) {
        if time::timeout(grace, self.drain()).await.is_err() {
            bus.publish(
                Event::new(EventKind::ForcedShutdown)
                    .with_timeout(grace)
                    .with_failed(self.set.len()),
            );
            self.set.abort_all();
            self.set.detach_all();
        }
    }

    /// Names of initializers that never reported, in submission order.
    fn pending(&self) -> Vec<String> {
        self.submitted
            .iter()
            .zip(&self.slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|((name, _), _)| name.clone())
            .collect()
    }

    fn into_outcomes(self, waited: Duration, reason: &str) -> Vec<Outcome> {
        let submitted_at = self.submitted_at;
        self.submitted
            .into_iter()
            .zip(self.slots)
            .map(|((name, priority), slot)| {
                slot.unwrap_or_else(|| {
                    Outcome::incomplete(name, priority, submitted_at, waited, reason)
                })
            })
            .collect()
    }
}

/// Runs every initializer in `initializers` and returns their outcomes in submission order.
///
/// ### Errors
/// - [`RuntimeError::Timeout`] when `cfg.timeout` elapses before every initializer reported
/// - [`RuntimeError::Interrupted`] when `interrupt` is cancelled or a termination signal
///   arrives (with `cfg.handle_signals`)
///
/// Individual failures are **not** errors here; they are recorded on the outcomes.
pub(crate) async fn run_all(
    initializers: Vec<InitializerRef>,
    cfg: &Config,
    bus: &Bus,
    interrupt: &CancellationToken,
) -> Result<Vec<Outcome>, Aborted> {
    if initializers.is_empty() {
        return Ok(Vec::new());
    }
    let signals = TermSignals::register(cfg.handle_signals);
    run_with_signals(initializers, cfg, bus, interrupt, signals).await
}

async fn run_with_signals(
    initializers: Vec<InitializerRef>,
    cfg: &Config,
    bus: &Bus,
    interrupt: &CancellationToken,
    mut signals: TermSignals,
) -> Result<Vec<Outcome>, Aborted> {
    let semaphore = Arc::new(Semaphore::new(cfg.pool_size_for(initializers.len())));
    let run_token = interrupt.child_token();
    let _cancel_on_drop = run_token.clone().drop_guard();
    let mut pool = Pool::with_capacity(initializers.len());

    let started = Instant::now();
    for init in initializers {
        pool.submit(
            init,
            Arc::clone(&semaphore),
            run_token.child_token(),
            bus.clone(),
        );
    }

    let verdict = tokio::select! {
        biased;
        _ = pool.drain() => Verdict::AllReported,
        _ = time::sleep(cfg.timeout) => Verdict::DeadlineHit,
        _ = interrupt.cancelled() => Verdict::Interrupted,
        _ = signals.recv() => Verdict::Interrupted,
    };
    let waited = started.elapsed();

    match verdict {
        Verdict::AllReported => {}
        Verdict::DeadlineHit => {
            bus.publish(
                Event::new(EventKind::TimeoutHit)
                    .with_timeout(cfg.timeout)
                    .with_failed(pool.set.len()),
            );
            pool.force(&run_token);
        }
        Verdict::Interrupted => {
            bus.publish(Event::new(EventKind::Interrupted).with_failed(pool.set.len()));
            pool.force(&run_token);
        }
    }

    pool.teardown(cfg.grace, bus).await;

    let reason = match verdict {
        Verdict::AllReported => return Ok(pool.into_outcomes(waited, "did not report")),
        Verdict::DeadlineHit => "did not complete before the deadline",
        Verdict::Interrupted => "interrupted before completion",
    };

    let pending = pool.pending();
    for name in &pending {
        bus.publish(
            Event::new(EventKind::InitializerFailed)
                .with_initializer(name.as_str())
                .with_duration(waited)
                .with_reason(reason),
        );
    }

    let outcomes = pool.into_outcomes(waited, reason);
    let failures: Vec<(String, String)> = outcomes
        .iter()
        .filter_map(|o| o.error().map(|err| (o.name().to_string(), err.to_string())))
        .collect();

    let error = match verdict {
        Verdict::DeadlineHit => RuntimeError::Timeout {
            timeout: cfg.timeout,
            pending,
            failures,
        },
        _ => RuntimeError::Interrupted { pending, failures },
    };
    Err(Aborted { error, outcomes })
}

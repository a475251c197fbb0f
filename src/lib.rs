//! # initvisor
//!
//! **Initvisor** runs a host application's startup initializers exactly once, in
//! parallel, before the host starts accepting traffic.
//!
//! The host registers [`Initializer`]s through a [`Provider`], builds a [`Gate`] and
//! calls [`Gate::start`] from its lifecycle hook. The call returns only when every
//! initializer reported, and any failure, timeout or interruption is fatal.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ Initializer  │   │ Initializer  │   │ Initializer  │
//!     │ (prio -10)   │   │ (prio 0)     │   │ (prio 5)     │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            └──────────────────┼──────────────────┘
//!                               ▼
//!                      Provider::enumerate()
//!                               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Gate (run-once lifecycle hook)                                   │
//! │  - RunState (NotStarted → Running → Completed | Failed)           │
//! │  - registry::collect (filter + stable priority sort)              │
//! │  - engine (Semaphore-bounded JoinSet, global deadline)            │
//! │  - aggregate (per-initializer outcomes → pass/fail)               │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │  run_one     │   │  run_one     │   │  run_one     │   │
//!     │ (timed,      │   │ (timed,      │   │ (timed,      │   │
//!     │  isolated)   │   │  isolated)   │   │  isolated)   │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ InitializerStarting / InitializerSucceeded / ...      │ RunStarting
//!      ▼                  ▼                  ▼                 ▼ RunCompleted
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                   (capacity: Config::bus_capacity)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                           delivery listener
//!                                   ▼
//!                             SubscriberSet
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      sub1.on   sub2.on   subN.on
//!                      _event()  _event()  _event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! Gate::start()
//!   ├─► CAS NotStarted → Running     (lost? warn, Ok(Startup::Skipped))
//!   ├─► collect: enumerate, keep requires_initialization(), sort by priority
//!   ├─► empty? ──► Completed, Ok(Startup::Ran(empty report))
//!   ├─► submit all to a pool of min(n, parallelism) slots
//!   ├─► wait for all, bounded by Config::timeout
//!   │       ├─ deadline hit  ─► TimeoutHit, abort pool   ─► Err(Timeout)
//!   │       └─ interrupted   ─► Interrupted, abort pool  ─► Err(Interrupted)
//!   ├─► teardown pool (always, bounded by Config::grace)
//!   └─► aggregate
//!           ├─ no failures ─► Completed ─► Ok(Startup::Ran(report))
//!           └─ failures    ─► Failed    ─► Err(AggregateFailure)
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------------|---------------------------------------------|
//! | **Initializers**  | Define startup work as trait impls or closures.                    | [`Initializer`], [`InitFn`], [`InitializerRef`] |
//! | **Discovery**     | Let the host enumerate its registered initializers.                | [`Provider`], [`ProviderFn`]                |
//! | **Gate**          | Run-once orchestration with a pass/fail verdict.                   | [`Gate`], [`GateBuilder`], [`Startup`]      |
//! | **Reporting**     | Per-initializer timing and failures.                               | [`AggregateReport`], [`Outcome`]            |
//! | **Subscriber API**| Hook into runtime events (logging, metrics, custom subscribers).   | [`Subscribe`]                               |
//! | **Errors**        | Typed errors for the gate and for initializers.                    | [`RuntimeError`], [`InitError`]             |
//! | **Configuration** | Deadline, pool size, grace period, env overrides.                  | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a subscriber rendering events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use initvisor::{Config, Gate, InitError, InitFn, InitializerRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         timeout: Duration::from_secs(30),
//!         handle_signals: false,
//!         ..Config::default()
//!     };
//!
//!     let initializers: Vec<InitializerRef> = vec![
//!         InitFn::arc("schema-check", |_ctx: CancellationToken| async { Ok(()) }),
//!         InitFn::new("cache-warmup", |ctx: CancellationToken| async move {
//!             tokio::select! {
//!                 _ = ctx.cancelled() => Err(InitError::Canceled),
//!                 _ = tokio::time::sleep(Duration::from_millis(10)) => Ok(()),
//!             }
//!         })
//!         .with_priority(10)
//!         .into_ref(),
//!     ];
//!
//!     let gate = Gate::builder(cfg).with_provider(initializers).build()?;
//!     let startup = gate.start().await?;
//!     assert_eq!(startup.report().map(|r| r.total()), Some(2));
//!     assert!(gate.is_ready());
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod initializers;
mod subscribers;

// ---- Public re-exports ----

pub use core::{
    AggregateReport, Config, ENV_GRACE_SECS, ENV_HANDLE_SIGNALS, ENV_POOL_SIZE, ENV_TIMEOUT_SECS,
    Gate, GateBuilder, Outcome, Phase, RunState, Startup, aggregate, collect,
};
pub use error::{InitError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use initializers::{InitFn, Initializer, InitializerRef, Provider, ProviderFn};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a built-in subscriber rendering events through `tracing`.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

//! Runtime core: orchestration and lifecycle.
//!
//! The only entry point from this module is [`Gate`], which discovers initializers,
//! runs them on a bounded pool under a global deadline and turns the outcomes into
//! a single pass/fail verdict.
//!
//! Internal modules:
//! - [`registry`]: asks the host provider for initializers, filters and orders them;
//! - [`engine`]: bounded parallel execution, global deadline, interruption, teardown;
//! - [`runner`]: runs one initializer with timing, panic isolation and event publishing;
//! - [`aggregate`]: folds outcomes into an [`AggregateReport`];
//! - [`state`]: run-once state machine;
//! - [`shutdown`]: cross-platform termination signal handling.

mod aggregate;
mod builder;
mod config;
mod engine;
mod gate;
mod outcome;
mod phase;
mod registry;
mod runner;
mod shutdown;
mod state;

pub use aggregate::{AggregateReport, aggregate};
pub use builder::GateBuilder;
pub use config::{Config, ENV_GRACE_SECS, ENV_HANDLE_SIGNALS, ENV_POOL_SIZE, ENV_TIMEOUT_SECS};
pub use gate::{Gate, Startup};
pub use outcome::Outcome;
pub use phase::Phase;
pub use registry::collect;
pub use state::RunState;

//! # Event subscribers for the initvisor gate.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! used by the gate to deliver events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Engine ── publish(Event) ──► Bus ──► gate listener ──► SubscriberSet::emit(&Event)
//!                                                            │
//!                                               ┌────────────┼────────────┐
//!                                               ▼            ▼            ▼
//!                                           LogWriter     Metrics      Custom
//! ```

mod set;
mod subscriber;

#[cfg(feature = "logging")]
mod log;

pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;

//! # Initializer abstraction.
//!
//! This module defines the [`Initializer`] trait: a unit of startup work with a
//! stable name, a priority, a "should I run?" predicate and an async action.
//! The common handle type is [`InitializerRef`], an `Arc<dyn Initializer>`
//! suitable for sharing between the host and the gate.
//!
//! An initializer receives a [`CancellationToken`]; the token is cancelled when the
//! global deadline fires or the run is interrupted. Implementations should exit
//! promptly once it is cancelled.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::InitError;

/// Shared handle to an initializer.
pub type InitializerRef = Arc<dyn Initializer>;

/// # Pluggable unit of startup work.
///
/// Initializers are owned by the host; the gate only borrows them for one run.
/// They must not depend on each other's side effects: execution is parallel and
/// priority only decides submission order.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use initvisor::{InitError, Initializer};
///
/// struct MessageCatalog;
///
/// #[async_trait]
/// impl Initializer for MessageCatalog {
///     fn name(&self) -> &str { "message-catalog" }
///
///     fn priority(&self) -> i32 { -10 }
///
///     async fn initialize(&self, ctx: CancellationToken) -> Result<(), InitError> {
///         if ctx.is_cancelled() {
///             return Err(InitError::Canceled);
///         }
///         // load bundles...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Initializer: Send + Sync + 'static {
    /// Returns a stable, human-readable name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Submission priority; lower values are submitted first.
    ///
    /// Default: `0`.
    fn priority(&self) -> i32 {
        0
    }

    /// Whether this initializer has work to do in this process.
    ///
    /// Called once per run, before anything is submitted. Must be cheap and must not block.
    ///
    /// Default: `true`.
    fn requires_initialization(&self) -> bool {
        true
    }

    /// Performs the initialization.
    ///
    /// May take arbitrary time; the gate bounds it with the global deadline.
    async fn initialize(&self, ctx: CancellationToken) -> Result<(), InitError>;
}

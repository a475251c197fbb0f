//! # Host-side initializer discovery.
//!
//! [`Provider`] is the only thing the gate knows about the host container: a way
//! to enumerate the initializers registered at the moment the gate starts.

use std::sync::Arc;

use crate::initializers::initializer::InitializerRef;

/// Enumerates the initializers registered by the host.
///
/// Implementations must return a stable collection for the duration of one call.
/// The gate calls [`Provider::enumerate`] exactly once per run and never mutates
/// the result.
///
/// Implemented for `Vec<InitializerRef>` and `Arc<[InitializerRef]>`; wrap a
/// closure in [`ProviderFn`] to enumerate lazily.
pub trait Provider: Send + Sync + 'static {
    /// Returns every registered initializer, in discovery order.
    fn enumerate(&self) -> Vec<InitializerRef>;
}

impl Provider for Vec<InitializerRef> {
    fn enumerate(&self) -> Vec<InitializerRef> {
        self.clone()
    }
}

impl Provider for Arc<[InitializerRef]> {
    fn enumerate(&self) -> Vec<InitializerRef> {
        self.to_vec()
    }
}

/// Closure-backed provider, evaluated on every [`Provider::enumerate`] call.
///
/// ```
/// use tokio_util::sync::CancellationToken;
/// use initvisor::{InitFn, Provider, ProviderFn};
///
/// let provider = ProviderFn::new(|| {
///     vec![InitFn::arc("cache-warmup", |_ctx: CancellationToken| async { Ok(()) })]
/// });
/// assert_eq!(provider.enumerate().len(), 1);
/// ```
pub struct ProviderFn<F>(F);

impl<F> ProviderFn<F>
where
    F: Fn() -> Vec<InitializerRef> + Send + Sync + 'static,
{
    /// Wraps `f` as a provider.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Provider for ProviderFn<F>
where
    F: Fn() -> Vec<InitializerRef> + Send + Sync + 'static,
{
    fn enumerate(&self) -> Vec<InitializerRef> {
        (self.0)()
    }
}

//! # Function-backed initializer (`InitFn`)
//!
//! [`InitFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a fresh
//! future per call. Priority and the "requires initialization" flag are set with
//! builder methods.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use initvisor::{InitFn, InitializerRef, InitError};
//!
//! let init: InitializerRef = InitFn::new("error-codes", |_ctx: CancellationToken| async move {
//!     // register resolvers...
//!     Ok::<_, InitError>(())
//! })
//! .with_priority(5)
//! .into_ref();
//!
//! assert_eq!(init.name(), "error-codes");
//! assert_eq!(init.priority(), 5);
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::InitError;
use crate::initializers::initializer::{Initializer, InitializerRef};

/// Function-backed initializer implementation.
#[derive(Debug)]
pub struct InitFn<F> {
    name: Cow<'static, str>,
    priority: i32,
    required: bool,
    f: F,
}

impl<F> InitFn<F> {
    /// Creates a new function-backed initializer with priority `0` that always runs.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            required: true,
            f,
        }
    }

    /// Sets the submission priority (lower first).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the value returned by [`Initializer::requires_initialization`].
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

impl<F, Fut> InitFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), InitError>> + Send + 'static,
{
    /// Creates the initializer and returns it as a shared handle.
    ///
    /// Shorthand for `InitFn::new(name, f).into_ref()`.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> InitializerRef {
        Arc::new(Self::new(name, f))
    }

    /// Converts the configured initializer into a shared handle.
    pub fn into_ref(self) -> InitializerRef {
        Arc::new(self)
    }
}

#[async_trait]
impl<F, Fut> Initializer for InitFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), InitError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn requires_initialization(&self) -> bool {
        self.required
    }

    async fn initialize(&self, ctx: CancellationToken) -> Result<(), InitError> {
        (self.f)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closure_is_invoked_with_context() {
        let init = InitFn::arc("ctx", |ctx: CancellationToken| async move {
            if ctx.is_cancelled() {
                Err(InitError::Canceled)
            } else {
                Ok(())
            }
        });

        let token = CancellationToken::new();
        assert_eq!(init.initialize(token.clone()).await, Ok(()));
        token.cancel();
        assert_eq!(init.initialize(token).await, Err(InitError::Canceled));
    }

    #[test]
    fn builder_sets_metadata() {
        let init = InitFn::new("skip", |_ctx: CancellationToken| async { Ok(()) })
            .with_priority(-3)
            .with_required(false)
            .into_ref();
        assert_eq!(init.priority(), -3);
        assert!(!init.requires_initialization());
    }
}

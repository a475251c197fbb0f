//! # Initializer abstractions.
//!
//! This module provides the initializer-related types:
//! - [`Initializer`] - trait for async, cancelable startup work
//! - [`InitFn`] - function-backed initializer implementation
//! - [`InitializerRef`] - shared reference to an initializer (`Arc<dyn Initializer>`)
//! - [`Provider`] - host capability enumerating registered initializers

mod init_fn;
mod initializer;
mod provider;

pub use init_fn::InitFn;
pub use initializer::{Initializer, InitializerRef};
pub use provider::{Provider, ProviderFn};

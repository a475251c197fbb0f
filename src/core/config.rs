//! # Gate runtime configuration.
//!
//! Provides [`Config`] centralized settings for one initialization run.
//!
//! Config is used in two ways:
//! 1. **Gate creation**: `Gate::builder(config)`
//! 2. **Environment overrides**: [`Config::from_env`] layers `INITVISOR_*` variables over defaults
//!
//! ## Sentinel values
//! - `pool_size = 0` → auto (`min(initializer count, available parallelism)`)
//! - `grace = 0s` → no graceful wait, outstanding tasks are aborted immediately

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::error::RuntimeError;

/// Environment variable overriding [`Config::timeout`] (whole seconds).
pub const ENV_TIMEOUT_SECS: &str = "INITVISOR_TIMEOUT_SECS";
/// Environment variable overriding [`Config::pool_size`].
pub const ENV_POOL_SIZE: &str = "INITVISOR_POOL_SIZE";
/// Environment variable overriding [`Config::grace`] (whole seconds).
pub const ENV_GRACE_SECS: &str = "INITVISOR_GRACE_SECS";
/// Environment variable overriding [`Config::handle_signals`] (`true`/`false`/`1`/`0`).
pub const ENV_HANDLE_SIGNALS: &str = "INITVISOR_HANDLE_SIGNALS";

/// Global configuration for one initialization run.
///
/// ## Field semantics
/// - `timeout`: Deadline for the whole batch, not per initializer (must be `> 0`)
/// - `pool_size`: Maximum initializers running at once (`0` = auto)
/// - `grace`: Maximum wait for the pool to drain during teardown
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `handle_signals`: Treat OS termination signals during the wait as interruption
#[derive(Clone, Debug)]
pub struct Config {
    /// Global deadline covering every submitted initializer.
    ///
    /// Exceeding it is fatal: the gate returns [`RuntimeError::Timeout`].
    pub timeout: Duration,

    /// Upper bound on concurrently running initializers.
    ///
    /// - `0` = `min(n, available_parallelism)`
    /// - `n > 0` = `min(count, n)`
    pub pool_size: usize,

    /// Maximum time teardown waits for the pool to drain before detaching it.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Whether SIGINT/SIGTERM/SIGQUIT (Ctrl-C on Windows) interrupt the run.
    ///
    /// Off by default. Enabling it installs tokio signal handlers that stay in place
    /// for the life of the process: after the gate returns, those signals no longer
    /// terminate the process unless the host handles them itself.
    pub handle_signals: bool,
}

impl Config {
    /// Builds a config from defaults overridden by `INITVISOR_*` environment variables.
    ///
    /// Unset variables keep their defaults. Malformed values are rejected with
    /// [`RuntimeError::Config`].
    pub fn from_env() -> Result<Self, RuntimeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup(ENV_TIMEOUT_SECS) {
            cfg.timeout = Duration::from_secs(parse_u64(ENV_TIMEOUT_SECS, &v)?);
        }
        if let Some(v) = lookup(ENV_POOL_SIZE) {
            cfg.pool_size = parse_u64(ENV_POOL_SIZE, &v)? as usize;
        }
        if let Some(v) = lookup(ENV_GRACE_SECS) {
            cfg.grace = Duration::from_secs(parse_u64(ENV_GRACE_SECS, &v)?);
        }
        if let Some(v) = lookup(ENV_HANDLE_SIGNALS) {
            cfg.handle_signals = parse_bool(ENV_HANDLE_SIGNALS, &v)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects settings the engine cannot honor.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.timeout.is_zero() {
            return Err(RuntimeError::Config {
                reason: "timeout must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Returns the worker pool size for `count` initializers.
    ///
    /// Always `>= 1`; never larger than `count` unless `count == 0`.
    #[inline]
    pub fn pool_size_for(&self, count: usize) -> usize {
        let cap = match self.pool_size {
            0 => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            n => n,
        };
        count.min(cap).max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `timeout = 300s`
    /// - `pool_size = 0` (auto)
    /// - `grace = 10s`
    /// - `bus_capacity = 1024`
    /// - `handle_signals = false`
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            pool_size: 0,
            grace: Duration::from_secs(10),
            bus_capacity: 1024,
            handle_signals: false,
        }
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, RuntimeError> {
    raw.trim().parse::<u64>().map_err(|e| RuntimeError::Config {
        reason: format!("{key}={raw:?}: {e}"),
    })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, RuntimeError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RuntimeError::Config {
            reason: format!("{key}={raw:?}: expected a boolean"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.timeout, Duration::from_secs(300));
        assert_eq!(cfg.grace, Duration::from_secs(10));
        assert_eq!(cfg.pool_size, 0);
        assert!(!cfg.handle_signals);
    }

    #[test]
    fn pool_size_is_bounded_by_task_count() {
        let mut cfg = Config::default();
        cfg.pool_size = 8;
        assert_eq!(cfg.pool_size_for(3), 3);
        assert_eq!(cfg.pool_size_for(20), 8);
        assert_eq!(cfg.pool_size_for(0), 1);

        cfg.pool_size = 0;
        assert!(cfg.pool_size_for(1) == 1);
        assert!(cfg.pool_size_for(1000) >= 1);
    }

    #[test]
    fn env_overrides_apply() {
        let cfg = Config::from_lookup(lookup(&[
            (ENV_TIMEOUT_SECS, "30"),
            (ENV_POOL_SIZE, "4"),
            (ENV_GRACE_SECS, "2"),
            (ENV_HANDLE_SIGNALS, "on"),
        ]))
        .unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.pool_size, 4);
        assert_eq!(cfg.grace, Duration::from_secs(2));
        assert!(cfg.handle_signals);
    }

    #[test]
    fn malformed_env_is_rejected() {
        let err = Config::from_lookup(lookup(&[(ENV_POOL_SIZE, "many")])).unwrap_err();
        assert_eq!(err.as_label(), "runtime_config");

        let err = Config::from_lookup(lookup(&[(ENV_HANDLE_SIGNALS, "maybe")])).unwrap_err();
        assert!(err.to_string().contains(ENV_HANDLE_SIGNALS));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = Config::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "0")])).unwrap_err();
        assert!(matches!(err, RuntimeError::Config { .. }));
    }
}

//! # OS termination signals as an interruption source.
//!
//! The engine races [`TermSignals::recv`] against the combined wait when
//! [`Config::handle_signals`](crate::Config::handle_signals) is set. A signal during
//! startup ends the run with [`RuntimeError::Interrupted`](crate::RuntimeError::Interrupted).
//!
//! Registering a listener replaces the default disposition of those signals for the
//! rest of the process (tokio never uninstalls its handlers). After the gate returns,
//! the host must handle termination signals itself.
//!
//! ## Signals
//! **Unix platforms:** `SIGINT`, `SIGTERM`, `SIGQUIT`
//!
//! **Windows platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`]

use std::future;

/// Registered termination-signal listeners; empty when disabled.
pub(crate) struct TermSignals {
    #[cfg(unix)]
    streams: Vec<tokio::signal::unix::Signal>,
    #[cfg(not(unix))]
    enabled: bool,
}

impl TermSignals {
    /// A listener that never fires.
    pub(crate) fn disabled() -> Self {
        Self {
            #[cfg(unix)]
            streams: Vec::new(),
            #[cfg(not(unix))]
            enabled: false,
        }
    }

    /// Registers the termination signals when `enabled`.
    ///
    /// Registration failure is logged and degrades to a listener that never fires.
    /// Must be called inside a tokio runtime with signals enabled.
    pub(crate) fn register(enabled: bool) -> Self {
        if !enabled {
            return Self::disabled();
        }

        #[cfg(unix)]
        {
            use tokio::signal::unix::SignalKind;

            let kinds = [
                SignalKind::interrupt(),
                SignalKind::terminate(),
                SignalKind::quit(),
            ];
            match Self::with_kinds(&kinds) {
                Ok(signals) => signals,
                Err(e) => {
                    tracing::warn!(target: "initvisor", error = %e, "cannot register signal handlers");
                    Self::disabled()
                }
            }
        }

        #[cfg(not(unix))]
        {
            Self { enabled: true }
        }
    }

    /// Registers listeners for an explicit set of signals.
    #[cfg(unix)]
    pub(crate) fn with_kinds(kinds: &[tokio::signal::unix::SignalKind]) -> std::io::Result<Self> {
        let streams = kinds
            .iter()
            .map(|kind| tokio::signal::unix::signal(*kind))
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self { streams })
    }

    /// Completes when any registered signal arrives; pending forever otherwise.
    #[cfg(unix)]
    pub(crate) async fn recv(&mut self) {
        if self.streams.is_empty() {
            return future::pending().await;
        }
        let waits = self.streams.iter_mut().map(|s| Box::pin(s.recv()));
        let _ = futures::future::select_all(waits).await;
    }

    /// Completes on Ctrl-C; pending forever when disabled or on listener failure.
    #[cfg(not(unix))]
    pub(crate) async fn recv(&mut self) {
        if !self.enabled || tokio::signal::ctrl_c().await.is_err() {
            future::pending::<()>().await;
        }
    }
}

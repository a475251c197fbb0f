use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    core::{config::Config, gate::Gate},
    error::RuntimeError,
    initializers::{InitializerRef, Provider},
    subscribers::Subscribe,
};

/// Builder for constructing a [`Gate`].
pub struct GateBuilder {
    cfg: Config,
    provider: Arc<dyn Provider>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    interrupt: Option<CancellationToken>,
}

impl GateBuilder {
    /// Creates a new builder with the given configuration and no initializers.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            provider: Arc::new(Vec::<InitializerRef>::new()),
            subscribers: Vec::new(),
            interrupt: None,
        }
    }

    /// Sets the host registry queried once per run.
    pub fn with_provider(mut self, provider: impl Provider) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets an external interruption token.
    ///
    /// Cancelling it while initializers run ends the run with
    /// [`RuntimeError::Interrupted`].
    pub fn with_interrupt(mut self, token: CancellationToken) -> Self {
        self.interrupt = Some(token);
        self
    }

    /// Validates the configuration and builds the gate.
    ///
    /// ### Errors
    /// - [`RuntimeError::Config`] when the configuration is invalid
    pub fn build(self) -> Result<Arc<Gate>, RuntimeError> {
        self.cfg.validate()?;
        Ok(Arc::new(Gate::new_internal(
            self.cfg,
            self.provider,
            self.subscribers,
            self.interrupt.unwrap_or_default(),
        )))
    }
}

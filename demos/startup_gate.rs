//! # Example: startup_gate
//!
//! A host service that must not accept traffic before its initializers finish.
//!
//! Shows how to:
//! - Implement [`Initializer`] on a host type and as a closure via [`InitFn`].
//! - Expose the host registry through a [`Provider`].
//! - Attach the built-in [`LogWriter`] and render it with `tracing_subscriber`.
//! - Block in the lifecycle hook with [`Gate::start`] before "listening".
//!
//! ## Flow
//! ```text
//! main ──► Config::from_env()
//!      ──► Gate::builder(cfg).with_provider(Registry).with_subscribers([LogWriter])
//!      ──► gate.start().await
//!             ├─ Ok  ──► "listening"
//!             └─ Err ──► exit(1)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=initvisor=debug cargo run --example startup_gate
//! INITVISOR_POOL_SIZE=1 cargo run --example startup_gate
//! ```

use std::{sync::Arc, time::Duration};

use initvisor::{
    Config, Gate, InitError, InitFn, Initializer, InitializerRef, LogWriter, Provider, Subscribe,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Loads a message catalog; runs early.
struct MessageCatalog {
    locales: Vec<&'static str>,
}

#[async_trait::async_trait]
impl Initializer for MessageCatalog {
    fn name(&self) -> &str {
        "message-catalog"
    }

    fn priority(&self) -> i32 {
        -10
    }

    async fn initialize(&self, ctx: CancellationToken) -> Result<(), InitError> {
        for locale in &self.locales {
            tokio::select! {
                _ = ctx.cancelled() => return Err(InitError::Canceled),
                _ = tokio::time::sleep(Duration::from_millis(30)) => {
                    tracing::debug!(locale, "catalog loaded");
                }
            }
        }
        Ok(())
    }
}

/// Host-side registry of startup work.
struct Registry;

impl Provider for Registry {
    fn enumerate(&self) -> Vec<InitializerRef> {
        vec![
            Arc::new(MessageCatalog {
                locales: vec!["en", "de", "ja"],
            }),
            InitFn::arc("error-codes", |_ctx: CancellationToken| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(())
            }),
            InitFn::new("cache-warmup", |_ctx: CancellationToken| async {
                tokio::time::sleep(Duration::from_millis(120)).await;
                Ok(())
            })
            .with_priority(10)
            .into_ref(),
            // Disabled in this deployment; never runs.
            InitFn::new("search-index", |_ctx: CancellationToken| async {
                Err(InitError::fail("must not run"))
            })
            .with_required(false)
            .into_ref(),
        ]
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("initvisor=info")),
        )
        .init();

    let cfg = Config::from_env()?;
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let gate = Gate::builder(cfg)
        .with_provider(Registry)
        .with_subscribers(subs)
        .build()?;

    match gate.start().await {
        Ok(startup) => {
            if let Some(report) = startup.report() {
                println!("ready: {report}");
            }
            println!("listening (phase {})", gate.phase().value());
            Ok(())
        }
        Err(err) => {
            eprintln!("startup aborted [{}]: {err}", err.as_label());
            std::process::exit(1);
        }
    }
}

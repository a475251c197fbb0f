//! # Example: failing_startup
//!
//! Demonstrates how a failing or hanging initializer aborts the host's startup.
//!
//! Shows how to:
//! - Implement a custom [`Subscribe`] that tracks initializer timings.
//! - Inspect [`RuntimeError::AggregateFailure`] and [`RuntimeError::Timeout`].
//! - Drive the gate from synchronous code with [`Gate::start_blocking`].
//!
//! ## Flow
//! ```text
//! round 1: A(10ms) B(50ms) C(fails)   ──► Err(AggregateFailure{ failed: [C] })
//! round 2: fast(10ms) stuck(forever)  ──► Err(Timeout{ pending: [stuck] }) after 500ms
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example failing_startup
//! ```

use std::{sync::Arc, time::Duration};

use initvisor::{
    Config, Event, EventKind, Gate, InitError, InitFn, InitializerRef, RuntimeError, Subscribe,
};
use tokio_util::sync::CancellationToken;

/// Prints initializer completions as they happen.
struct ConsoleSubscriber;

#[async_trait::async_trait]
impl Subscribe for ConsoleSubscriber {
    async fn on_event(&self, ev: &Event) {
        let name = ev.initializer.as_deref().unwrap_or("<gate>");
        match ev.kind {
            EventKind::InitializerSucceeded => {
                println!("[sub] ok:      {name} in {}ms", ev.duration_ms.unwrap_or(0));
            }
            EventKind::InitializerFailed => {
                println!(
                    "[sub] failed:  {name} reason={}",
                    ev.reason.as_deref().unwrap_or("<none>")
                );
            }
            EventKind::TimeoutHit => {
                println!(
                    "[sub] timeout: after {}ms, {} still running",
                    ev.timeout_ms.unwrap_or(0),
                    ev.failed.unwrap_or(0)
                );
            }
            EventKind::RunFailed => println!("[sub] run failed"),
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

fn sleeper(name: &'static str, ms: u64) -> InitializerRef {
    InitFn::arc(name, move |ctx: CancellationToken| async move {
        tokio::select! {
            _ = ctx.cancelled() => Err(InitError::Canceled),
            _ = tokio::time::sleep(Duration::from_millis(ms)) => Ok(()),
        }
    })
}

fn run(label: &str, cfg: Config, initializers: Vec<InitializerRef>) {
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(ConsoleSubscriber)];
    let gate = match Gate::builder(cfg)
        .with_provider(initializers)
        .with_subscribers(subs)
        .build()
    {
        Ok(gate) => gate,
        Err(err) => {
            eprintln!("{label}: invalid config: {err}");
            return;
        }
    };

    match gate.start_blocking() {
        Ok(_) => println!("{label}: unexpectedly ready"),
        Err(RuntimeError::AggregateFailure {
            failed, failures, ..
        }) => {
            println!("{label}: aborting startup, failed={failed:?}");
            for (name, reason) in failures {
                println!("  {name}: {reason}");
            }
        }
        Err(RuntimeError::Timeout {
            timeout,
            pending,
            failures,
        }) => {
            println!("{label}: aborting startup after {timeout:?}, pending={pending:?}");
            for (name, reason) in failures {
                println!("  {name}: {reason}");
            }
        }
        Err(other) => println!("{label}: aborting startup: {other}"),
    }
    println!("{label}: state={}", gate.state());
}

fn main() {
    let base = Config {
        handle_signals: false,
        grace: Duration::from_millis(200),
        ..Config::default()
    };

    run(
        "round 1",
        base.clone(),
        vec![
            sleeper("A", 10),
            sleeper("B", 50),
            InitFn::arc("C", |_ctx: CancellationToken| async {
                Err(InitError::fail("boom"))
            }),
        ],
    );

    run(
        "round 2",
        Config {
            timeout: Duration::from_millis(500),
            ..base
        },
        vec![sleeper("fast", 10), sleeper("stuck", 3_600_000)],
    );
}

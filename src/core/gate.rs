//! # Gate: run-once startup initialization.
//!
//! The [`Gate`] owns the event bus, the host [`Provider`] and the run state. The host
//! calls [`Gate::start`] once it is ready and must not accept traffic before the call
//! returns `Ok`.
//!
//! ## High-level architecture
//! ```text
//! host ──► Gate::start()
//!            ├─ state.begin()  (CAS NotStarted → Running)
//!            │     └─ lost? ──► warn + RunSkipped ──► Ok(Startup::Skipped)
//!            ├─ delivery listener: Bus ─► SubscriberSet::emit(&Event)
//!            ├─ registry::collect(provider)
//!            ├─ engine::run_all(initializers)        (bounded pool, global deadline)
//!            ├─ aggregate(outcomes).into_result()
//!            ├─ Ok  ──► state = Completed, RunCompleted ──► Ok(Startup::Ran(report))
//!            └─ Err ──► state = Failed,    RunFailed    ──► Err(RuntimeError)  (host aborts)
//! ```
//!
//! ## Rules
//! - Initializers run at most once per gate, no matter how often `start()` is called
//! - `start()` returns only after a terminal state is reached
//! - Every fatal error leaves the gate in `Failed`; nothing is retried
//! - Dropping the `start()` future also leaves the gate in `Failed`
//! - Subscribers receive every event of the run before `start()` returns (bounded by `grace`)

use std::sync::{Arc, OnceLock};

use futures::FutureExt;
use tokio::{
    sync::broadcast::error::RecvError,
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    core::{
        aggregate::{AggregateReport, aggregate},
        builder::GateBuilder,
        config::Config,
        engine,
        phase::Phase,
        registry,
        state::{RunState, StateCell},
    },
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    initializers::Provider,
    subscribers::{Subscribe, SubscriberSet, panic_message},
};

/// Result of a successful [`Gate::start`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Startup {
    /// This call ran the initializers and all of them succeeded.
    Ran(AggregateReport),
    /// Another call already won the run-once transition; nothing was executed.
    Skipped(RunState),
}

impl Startup {
    /// The report, if this call performed the run.
    pub fn report(&self) -> Option<&AggregateReport> {
        match self {
            Startup::Ran(report) => Some(report),
            Startup::Skipped(_) => None,
        }
    }

    /// `true` for duplicate invocations.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Startup::Skipped(_))
    }
}

/// Run-once startup gate.
pub struct Gate {
    cfg: Config,
    bus: Bus,
    provider: Arc<dyn Provider>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    interrupt: CancellationToken,
    state: StateCell,
    report: OnceLock<AggregateReport>,
}

impl Gate {
    /// Creates a builder with the given configuration.
    pub fn builder(cfg: Config) -> GateBuilder {
        GateBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        provider: Arc<dyn Provider>,
        subscribers: Vec<Arc<dyn Subscribe>>,
        interrupt: CancellationToken,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            cfg,
            bus,
            provider,
            subscribers,
            interrupt,
            state: StateCell::new(),
            report: OnceLock::new(),
        }
    }

    /// Runs every registered initializer that requires it, once per gate.
    ///
    /// Returns only when the run reached a terminal state. Duplicate calls log a
    /// warning and return [`Startup::Skipped`] immediately.
    ///
    /// ### Errors
    /// Any error is fatal; the host must abort its startup:
    /// - [`RuntimeError::AggregateFailure`] at least one initializer failed
    /// - [`RuntimeError::Timeout`] the global deadline elapsed
    /// - [`RuntimeError::Interrupted`] the interrupt token fired or a termination signal arrived
    /// - [`RuntimeError::Unexpected`] orchestration itself panicked
    ///
    /// ### Cancellation
    /// Dropping the returned future before it completes (e.g. inside
    /// `tokio::time::timeout`) cancels every initializer context, aborts the pool and
    /// moves the gate to [`RunState::Failed`] with a `RunFailed` event. The run is not
    /// resumed by a later call.
    pub async fn start(&self) -> Result<Startup, RuntimeError> {
        if let Err(state) = self.state.begin() {
            warn!(
                target: "initvisor",
                state = %state,
                "initialization already started; duplicate start() ignored"
            );
            self.bus
                .publish(Event::new(EventKind::RunSkipped).with_reason(state.as_str()));
            return Ok(Startup::Skipped(state));
        }

        let _abandoned = FailOnDrop { gate: self };
        let delivery = self.spawn_delivery();
        self.bus.publish(Event::new(EventKind::RunStarting));
        let started = Instant::now();

        let result = std::panic::AssertUnwindSafe(self.orchestrate(started))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic_err| {
                Err(RuntimeError::Unexpected {
                    reason: format!("orchestration panicked: {}", panic_message(&*panic_err)),
                })
            });
        let elapsed = started.elapsed();

        let result = match result {
            Ok(report) => {
                let stored = self.report.set(report.clone());
                debug_assert!(stored.is_ok(), "report stored twice");
                let completed = self.state.complete();
                debug_assert!(completed.is_ok(), "lost Running before completion: {completed:?}");
                info!(
                    target: "initvisor",
                    total = report.total(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "initialization completed"
                );
                self.bus.publish(
                    Event::new(EventKind::RunCompleted)
                        .with_counts(report.total(), 0)
                        .with_duration(elapsed),
                );
                Ok(Startup::Ran(report))
            }
            Err(err) => {
                let failed = self.state.fail();
                debug_assert!(failed.is_ok(), "lost Running before failure: {failed:?}");
                error!(
                    target: "initvisor",
                    error = err.as_label(),
                    failed = ?err.failed(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "initialization failed: {err}"
                );
                let mut ev = Event::new(EventKind::RunFailed)
                    .with_failed(err.failed().len())
                    .with_duration(elapsed)
                    .with_reason(err.to_string());
                if let RuntimeError::AggregateFailure { total, .. } = &err {
                    ev = ev.with_counts(*total, err.failed().len());
                }
                self.bus.publish(ev);
                Err(err)
            }
        };

        if let Some(handle) = delivery {
            let _ = time::timeout(self.cfg.grace, handle).await;
        }
        result
    }

    /// Synchronous variant of [`Gate::start`] for hosts without a tokio runtime.
    ///
    /// Builds a dedicated multi-threaded runtime sized like the worker pool, blocks
    /// the calling thread on [`Gate::start`], then shuts the runtime down within
    /// [`Config::grace`].
    ///
    /// # Panics
    /// Panics if called from within an asynchronous execution context.
    pub fn start_blocking(&self) -> Result<Startup, RuntimeError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.cfg.pool_size_for(usize::MAX))
            .thread_name("initvisor-worker")
            .enable_all()
            .build()
            .map_err(|e| RuntimeError::Unexpected {
                reason: format!("cannot build worker runtime: {e}"),
            })?;
        let result = runtime.block_on(self.start());
        runtime.shutdown_timeout(self.cfg.grace);
        result
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state.load()
    }

    /// Liveness probe: `true` once started, unless the run failed.
    pub fn is_running(&self) -> bool {
        matches!(self.state(), RunState::Running | RunState::Completed)
    }

    /// `true` once every initializer succeeded; the host may accept traffic.
    pub fn is_ready(&self) -> bool {
        self.state() == RunState::Completed
    }

    /// Lifecycle phase of the gate; strictly before [`Phase::LISTEN`].
    pub fn phase(&self) -> Phase {
        Phase::INITIALIZE
    }

    /// Report of the successful run, once the gate is `Completed`.
    pub fn report(&self) -> Option<&AggregateReport> {
        self.report.get()
    }

    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Creates a receiver for raw runtime events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Collect → run → aggregate.
    ///
    /// Per-initializer results are logged on every path, including timeout and
    /// interruption.
    async fn orchestrate(&self, started: Instant) -> Result<AggregateReport, RuntimeError> {
        let initializers = registry::collect(self.provider.as_ref());
        if initializers.is_empty() {
            info!(target: "initvisor", "no initializer requires initialization");
            return Ok(aggregate(Vec::new(), started.elapsed()));
        }

        let (outcomes, fatal) =
            match engine::run_all(initializers, &self.cfg, &self.bus, &self.interrupt).await {
                Ok(outcomes) => (outcomes, None),
                Err(aborted) => (aborted.outcomes, Some(aborted.error)),
            };
        let report = aggregate(outcomes, started.elapsed());
        for outcome in report.outcomes() {
            match outcome.error() {
                None => info!(
                    target: "initvisor",
                    initializer = outcome.name(),
                    duration_ms = outcome.duration().as_millis() as u64,
                    "initializer succeeded"
                ),
                Some(err) => error!(
                    target: "initvisor",
                    initializer = outcome.name(),
                    duration_ms = outcome.duration().as_millis() as u64,
                    err,
                    "initializer failed"
                ),
            }
        }
        info!(target: "initvisor", "{report}");
        match fatal {
            Some(err) => Err(err),
            None => report.into_result(),
        }
    }

    /// Forwards bus events to subscribers until the run's terminal event.
    fn spawn_delivery(&self) -> Option<JoinHandle<()>> {
        if self.subscribers.is_empty() {
            return None;
        }
        let set = SubscriberSet::new(self.subscribers.clone(), self.bus.clone());
        let mut rx = self.bus.subscribe();

        Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        let last = matches!(ev.kind, EventKind::RunCompleted | EventKind::RunFailed);
                        set.emit(&ev);
                        if last {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        }))
    }
}

/// Moves a gate whose `start()` future was dropped mid-run to `Failed`.
///
/// A no-op once the run reached a terminal state.
struct FailOnDrop<'a> {
    gate: &'a Gate,
}

impl Drop for FailOnDrop<'_> {
    fn drop(&mut self) {
        if self.gate.state.fail().is_ok() {
            warn!(
                target: "initvisor",
                "start() dropped before completion; initialization abandoned"
            );
            self.gate.bus.publish(
                Event::new(EventKind::RunFailed).with_reason("start() dropped before completion"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InitError;
    use crate::initializers::{InitFn, InitializerRef, ProviderFn};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    fn test_cfg() -> Config {
        Config {
            timeout: Duration::from_secs(5),
            pool_size: 4,
            grace: Duration::from_secs(1),
            handle_signals: false,
            ..Config::default()
        }
    }

    fn sleeper(name: &'static str, ms: u64) -> InitializerRef {
        InitFn::arc(name, move |_ctx: CancellationToken| async move {
            time::sleep(Duration::from_millis(ms)).await;
            Ok(())
        })
    }

    fn counted(name: &'static str, runs: Arc<AtomicUsize>) -> InitializerRef {
        InitFn::arc(name, move |_ctx: CancellationToken| {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    struct Recorder {
        kinds: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.kinds.lock().await.push(event.kind);
        }
    }

    #[tokio::test]
    async fn start_runs_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let provider: Vec<InitializerRef> = vec![counted("only", Arc::clone(&runs))];
        let gate = Gate::builder(test_cfg())
            .with_provider(provider)
            .build()
            .unwrap();

        let first = gate.start().await.unwrap();
        let second = gate.start().await.unwrap();

        assert!(!first.is_skipped());
        assert_eq!(second, Startup::Skipped(RunState::Completed));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(gate.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn all_success_completes() {
        let provider: Vec<InitializerRef> =
            vec![sleeper("a", 10), sleeper("b", 50), sleeper("c", 100)];
        let gate = Gate::builder(test_cfg())
            .with_provider(provider)
            .build()
            .unwrap();

        let started = Instant::now();
        let report = match gate.start().await.unwrap() {
            Startup::Ran(report) => report,
            other => panic!("unexpected {other:?}"),
        };

        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.failed(), 0);
        assert!(started.elapsed() < Duration::from_millis(160));
        assert_eq!(gate.state(), RunState::Completed);
        assert_eq!(gate.report(), Some(&report));
        assert!(gate.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_fails_the_gate() {
        let provider: Vec<InitializerRef> = vec![
            sleeper("A", 10),
            sleeper("B", 50),
            InitFn::arc("C", |_ctx: CancellationToken| async {
                Err(InitError::fail("boom"))
            }),
        ];
        let gate = Gate::builder(test_cfg())
            .with_provider(provider)
            .build()
            .unwrap();

        let err = gate.start().await.unwrap_err();
        match &err {
            RuntimeError::AggregateFailure {
                failed,
                total,
                failures,
            } => {
                assert_eq!(failed, &vec!["C".to_string()]);
                assert_eq!(*total, 3);
                assert_eq!(failures[0].1, "initialization failed: boom");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(gate.state(), RunState::Failed);
        assert!(!gate.is_running());
        assert!(gate.report().is_none());

        let again = gate.start().await.unwrap();
        assert_eq!(again, Startup::Skipped(RunState::Failed));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_fatal() {
        let mut cfg = test_cfg();
        cfg.timeout = Duration::from_millis(100);
        let provider: Vec<InitializerRef> = vec![sleeper("stuck", 60_000)];
        let gate = Gate::builder(cfg).with_provider(provider).build().unwrap();

        let started = Instant::now();
        let err = gate.start().await.unwrap_err();

        assert_eq!(err.as_label(), "runtime_timeout");
        assert_eq!(err.failed(), ["stuck".to_string()]);
        assert!(started.elapsed() < Duration::from_millis(110));
        assert_eq!(gate.state(), RunState::Failed);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_reports_and_logs_every_initializer() {
        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let mut cfg = test_cfg();
        cfg.timeout = Duration::from_millis(100);
        let provider: Vec<InitializerRef> = vec![
            InitFn::arc("fails-fast", |_ctx: CancellationToken| async {
                Err(InitError::fail("boom"))
            }),
            sleeper("stuck", 60_000),
        ];
        let gate = Gate::builder(cfg).with_provider(provider).build().unwrap();

        let err = gate.start().await.unwrap_err();
        assert_eq!(err.failed(), ["fails-fast".to_string(), "stuck".to_string()]);
        match &err {
            RuntimeError::Timeout { pending, .. } => assert_eq!(pending, &vec!["stuck".to_string()]),
            other => panic!("unexpected {other:?}"),
        }

        let text = logs.text();
        assert!(text.contains("initializer=\"fails-fast\""), "{text}");
        assert!(text.contains("initializer=\"stuck\""), "{text}");
        assert!(text.contains("stuck=100ms (failed)"), "{text}");
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_start_fails_the_gate() {
        let provider: Vec<InitializerRef> = vec![sleeper("slow", 60_000)];
        let gate = Gate::builder(test_cfg())
            .with_provider(provider)
            .build()
            .unwrap();
        let mut rx = gate.subscribe();

        let res = time::timeout(Duration::from_millis(10), gate.start()).await;
        assert!(res.is_err());
        time::sleep(Duration::from_secs(600)).await;

        assert_eq!(gate.state(), RunState::Failed);
        assert!(!gate.is_running());
        assert_eq!(gate.start().await.unwrap(), Startup::Skipped(RunState::Failed));

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::RunFailed));
        assert!(!kinds.contains(&EventKind::RunCompleted));
    }

    #[tokio::test]
    async fn empty_provider_succeeds_immediately() {
        let skipped = InitFn::new("skipped", |_ctx: CancellationToken| async {
            Err(InitError::fail("must not run"))
        })
        .with_required(false)
        .into_ref();
        let gate = Gate::builder(test_cfg())
            .with_provider(vec![skipped])
            .build()
            .unwrap();

        let startup = gate.start().await.unwrap();
        let report = startup.report().unwrap();
        assert_eq!(report.total(), 0);
        assert!(gate.is_ready());
    }

    #[tokio::test]
    async fn panicking_provider_is_unexpected() {
        let provider = ProviderFn::new(|| -> Vec<InitializerRef> { panic!("registry unavailable") });
        let gate = Gate::builder(test_cfg())
            .with_provider(provider)
            .build()
            .unwrap();

        let err = gate.start().await.unwrap_err();
        assert_eq!(
            err,
            RuntimeError::Unexpected {
                reason: "orchestration panicked: registry unavailable".into()
            }
        );
        assert_eq!(gate.state(), RunState::Failed);
    }

    #[tokio::test]
    async fn subscribers_see_the_whole_run() {
        let recorder = Arc::new(Recorder {
            kinds: Mutex::new(Vec::new()),
        });
        let provider: Vec<InitializerRef> = vec![sleeper("a", 1)];
        let gate = Gate::builder(test_cfg())
            .with_provider(provider)
            .with_subscribers(vec![recorder.clone()])
            .build()
            .unwrap();

        gate.start().await.unwrap();

        let kinds = recorder.kinds.lock().await.clone();
        assert_eq!(
            kinds,
            vec![
                EventKind::RunStarting,
                EventKind::InitializerStarting,
                EventKind::InitializerSucceeded,
                EventKind::RunCompleted,
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_starts_execute_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let provider: Vec<InitializerRef> = vec![counted("x", Arc::clone(&runs))];
        let gate = Gate::builder(test_cfg())
            .with_provider(provider)
            .build()
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move { gate.start().await }));
        }
        let mut ran = 0;
        for h in handles {
            if !h.await.unwrap().unwrap().is_skipped() {
                ran += 1;
            }
        }
        assert_eq!(ran, 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn start_blocking_drives_its_own_runtime() {
        let runs = Arc::new(AtomicUsize::new(0));
        let provider: Vec<InitializerRef> = vec![
            counted("one", Arc::clone(&runs)),
            counted("two", Arc::clone(&runs)),
        ];
        let gate = Gate::builder(test_cfg())
            .with_provider(provider)
            .build()
            .unwrap();

        let startup = gate.start_blocking().unwrap();
        assert_eq!(startup.report().map(AggregateReport::total), Some(2));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(gate.start_blocking().unwrap().is_skipped());
    }

    #[test]
    fn phase_precedes_listeners() {
        let gate = Gate::builder(test_cfg()).build().unwrap();
        assert!(gate.phase() < Phase::LISTEN);
        assert_eq!(gate.state(), RunState::NotStarted);
        assert!(!gate.is_running());
    }
}

//! Reference-counted manager for one shared, asynchronously started resource.

use crate::config::ManagerConfig;
use crate::error::{Result, SubscriptionError};
use crate::events::{LifecycleEvent, LifecycleObserver};
use crate::types::{BoxError, Cleanup, LeaseId, SessionId, SetupPhase, StartFn};
use futures_util::FutureExt;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;

use super::lease::Lease;
use super::state::{Resolution, SetupState};

/// Readiness as seen by leases waiting in [`Lease::ready`].
#[derive(Clone, Debug)]
pub(crate) enum Readiness {
    Idle,
    Starting,
    Ready(SessionId),
    Failed(SubscriptionError),
}

/// Bookkeeping guarded by a single lock. Every transition is one critical
/// section; callbacks never run while it is held.
struct Core {
    ref_count: usize,
    state: SetupState,
    next_session: SessionId,
    sessions_started: u64,
}

pub(crate) struct Inner {
    config: ManagerConfig,
    start: StartFn,
    runtime: Handle,
    core: Mutex<Core>,
    readiness: watch::Sender<Readiness>,
    observers: RwLock<Vec<Arc<dyn LifecycleObserver>>>,
    next_lease: AtomicU64,
}

/// Shares one expensive resource among many leases.
///
/// The first [`subscribe`](Self::subscribe) invokes `start`; the release of
/// the last lease runs the cleanup `start` produced. If the last lease leaves
/// while `start` is still in flight, the cleanup runs as soon as it arrives.
///
/// Cloning yields another handle to the same manager.
#[derive(Clone)]
pub struct SubscriptionManager {
    inner: Arc<Inner>,
}

impl SubscriptionManager {
    /// Create a manager driven by the current tokio runtime.
    pub fn new(config: ManagerConfig, start: StartFn) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| SubscriptionError::NoRuntime)?;
        Ok(Self::with_runtime(runtime, config, start))
    }

    /// Create a manager whose start operations run on `runtime`.
    ///
    /// Start futures run to completion; bounding them (see
    /// [`with_timeout`](crate::start::with_timeout)) is up to the caller.
    pub fn with_runtime(runtime: Handle, config: ManagerConfig, start: StartFn) -> Self {
        let (readiness, _) = watch::channel(Readiness::Idle);

        Self {
            inner: Arc::new(Inner {
                config,
                start,
                runtime,
                core: Mutex::new(Core {
                    ref_count: 0,
                    state: SetupState::Idle,
                    next_session: SessionId(1),
                    sessions_started: 0,
                }),
                readiness,
                observers: RwLock::new(Vec::new()),
                next_lease: AtomicU64::new(1),
            }),
        }
    }

    /// Register an observer for lifecycle events.
    pub fn with_observer(self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.add_observer(observer);
        self
    }

    /// Register an observer on a manager that may already be in use.
    pub fn add_observer(&self, observer: Arc<dyn LifecycleObserver>) {
        self.inner.observers.write().push(observer);
    }

    /// Take a lease on the shared resource.
    ///
    /// Never blocks. Starts a new session if none is pending or ready.
    pub fn subscribe(&self) -> Lease {
        let id = LeaseId(self.inner.next_lease.fetch_add(1, Ordering::Relaxed));

        let launch = {
            let mut core = self.inner.core.lock();
            core.ref_count += 1;

            let launch = if core.state.needs_start() {
                let session = core.next_session;
                core.next_session = session.next();
                core.sessions_started += 1;
                core.state = SetupState::Pending(session);
                self.inner.readiness.send_replace(Readiness::Starting);
                Some(session)
            } else {
                None
            };

            tracing::debug!(
                manager = %self.inner.config.name,
                lease = id.0,
                ref_count = core.ref_count,
                "Lease acquired"
            );
            launch
        };

        let lease = Lease::new(id, Arc::clone(&self.inner), self.inner.readiness.subscribe());

        if let Some(session) = launch {
            self.inner.launch(session);
        }

        lease
    }

    /// Number of live leases.
    pub fn ref_count(&self) -> usize {
        self.inner.core.lock().ref_count
    }

    /// Current phase of the setup state machine.
    pub fn phase(&self) -> SetupPhase {
        self.inner.core.lock().state.phase()
    }

    /// Session currently pending, cancelled or ready.
    pub fn current_session(&self) -> Option<SessionId> {
        self.inner.core.lock().state.session()
    }

    /// Total number of times start has been invoked.
    pub fn sessions_started(&self) -> u64 {
        self.inner.core.lock().sessions_started
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.inner.core.lock();
        f.debug_struct("SubscriptionManager")
            .field("name", &self.inner.config.name)
            .field("ref_count", &core.ref_count)
            .field("phase", &core.state.phase())
            .finish()
    }
}

type StartOutcome =
    std::result::Result<std::result::Result<Cleanup, BoxError>, Box<dyn Any + Send>>;

/// Owned by a session's driver task. Fails the session if the task is
/// dropped before the start future settled.
struct SettleGuard {
    inner: Arc<Inner>,
    session: SessionId,
    settled: bool,
}

impl SettleGuard {
    fn settle(mut self, outcome: StartOutcome) {
        self.settled = true;
        self.inner.settle(self.session, outcome);
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if !self.settled {
            let session = self.session;
            self.inner
                .fail(session, SubscriptionError::StartAbandoned { session });
        }
    }
}

impl Inner {
    /// Invoke start for `session` and spawn the task that settles its result.
    fn launch(self: &Arc<Self>, session: SessionId) {
        tracing::info!(
            manager = %self.config.name,
            session = %session,
            "Starting shared resource"
        );
        self.notify(LifecycleEvent::Starting {
            manager: self.config.name.clone(),
            session,
        });

        let future = match std::panic::catch_unwind(AssertUnwindSafe(|| (self.start)())) {
            Ok(future) => future,
            Err(panic) => {
                self.settle(session, Err(panic));
                return;
            }
        };

        let guard = SettleGuard {
            inner: Arc::clone(self),
            session,
            settled: false,
        };
        // A runtime that is shutting down (or already gone) drops the task,
        // and with it the guard, which fails the session.
        self.runtime.spawn(async move {
            let outcome = AssertUnwindSafe(future).catch_unwind().await;
            guard.settle(outcome);
        });
    }

    /// Resolution handler for one session's start.
    fn settle(&self, session: SessionId, outcome: StartOutcome) {
        match outcome {
            Ok(Ok(cleanup)) => self.resolve(session, cleanup),
            Ok(Err(e)) => {
                let err = match e.downcast::<SubscriptionError>() {
                    Ok(inner) => *inner,
                    Err(e) => SubscriptionError::StartFailed {
                        session,
                        error: Arc::from(e),
                    },
                };
                self.fail(session, err);
            }
            Err(_) => self.fail(session, SubscriptionError::StartPanicked { session }),
        }
    }

    fn resolve(&self, session: SessionId, cleanup: Cleanup) {
        let resolution = {
            let mut core = self.core.lock();
            let resolution = core.state.resolve(session, cleanup);
            if let Resolution::Retained = resolution {
                self.readiness.send_replace(Readiness::Ready(session));
            }
            resolution
        };

        match resolution {
            Resolution::Retained => {
                tracing::info!(
                    manager = %self.config.name,
                    session = %session,
                    "Shared resource ready"
                );
                self.notify(LifecycleEvent::Ready {
                    manager: self.config.name.clone(),
                    session,
                });
            }
            Resolution::Release(cleanup) => {
                tracing::warn!(
                    manager = %self.config.name,
                    session = %session,
                    "Start resolved after last lease left, releasing immediately"
                );
                // Nobody is waiting on this path; failures are reported to observers.
                let _ = self.run_cleanup(session, cleanup, true);
            }
        }
    }

    fn fail(&self, session: SessionId, err: SubscriptionError) {
        let current = {
            let mut core = self.core.lock();
            let current = core.state.fail(session);
            if current {
                self.readiness.send_replace(Readiness::Failed(err.clone()));
            }
            current
        };

        tracing::error!(
            manager = %self.config.name,
            session = %session,
            current,
            error = %err,
            "Start failed"
        );
        self.notify(LifecycleEvent::StartFailed {
            manager: self.config.name.clone(),
            session,
            message: err.to_string(),
        });
    }

    /// Drop one lease's claim. Called at most once per lease.
    pub(crate) fn release(&self, lease: LeaseId) -> Result<()> {
        let (ref_count, cleanup, phase) = {
            let mut core = self.core.lock();
            debug_assert!(core.ref_count > 0, "release without a live lease");
            core.ref_count = core.ref_count.saturating_sub(1);

            let cleanup = if core.ref_count == 0 {
                self.readiness.send_replace(Readiness::Idle);
                core.state.release()
            } else {
                None
            };
            (core.ref_count, cleanup, core.state.phase())
        };

        tracing::debug!(
            manager = %self.config.name,
            lease = lease.0,
            ref_count,
            "Lease released"
        );

        match cleanup {
            Some((session, cleanup)) => self.run_cleanup(session, cleanup, false),
            None => {
                if ref_count == 0 && phase == SetupPhase::Cancelled {
                    tracing::info!(
                        manager = %self.config.name,
                        "Last lease left while starting, cleanup deferred until start resolves"
                    );
                }
                Ok(())
            }
        }
    }

    /// Run a session's cleanup with no lock held.
    fn run_cleanup(&self, session: SessionId, cleanup: Cleanup, cancelled: bool) -> Result<()> {
        let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| cleanup.run())) {
            Ok(outcome) => outcome,
            Err(_) => Err(BoxError::from("cleanup panicked")),
        };

        match outcome {
            Ok(()) => {
                tracing::info!(
                    manager = %self.config.name,
                    session = %session,
                    cancelled,
                    "Shared resource released"
                );
                self.notify(LifecycleEvent::Released {
                    manager: self.config.name.clone(),
                    session,
                    cancelled,
                });
                Ok(())
            }
            Err(e) => {
                let err = SubscriptionError::CleanupFailed {
                    session,
                    error: Arc::from(e),
                };
                tracing::error!(
                    manager = %self.config.name,
                    session = %session,
                    error = %err,
                    "Cleanup failed"
                );
                self.notify(LifecycleEvent::CleanupFailed {
                    manager: self.config.name.clone(),
                    session,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn notify(&self, event: LifecycleEvent) {
        let observers = self.observers.read().clone();
        for observer in observers {
            observer.on_event(&event);
        }
    }
}

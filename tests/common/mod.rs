//! Shared harness for integration tests.
//!
//! `ControlledStart` hands out start futures that stay pending until the test
//! resolves or rejects them, and counts cleanups per start invocation.

#![allow(dead_code)]

use leasehold::{start_fn, BoxError, Cleanup, ManagerConfig, StartFn, SubscriptionManager};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

type Outcome = Result<(), String>;

struct StartRecord {
    sender: Option<oneshot::Sender<Outcome>>,
    cleanups: Arc<AtomicUsize>,
}

#[derive(Clone, Default)]
pub struct ControlledStart {
    records: Arc<Mutex<Vec<StartRecord>>>,
}

impl ControlledStart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_fn(&self) -> StartFn {
        let records = Arc::clone(&self.records);
        start_fn(move || {
            let (tx, rx) = oneshot::channel::<Outcome>();
            let cleanups = Arc::new(AtomicUsize::new(0));
            records.lock().push(StartRecord {
                sender: Some(tx),
                cleanups: Arc::clone(&cleanups),
            });

            async move {
                match rx.await {
                    Ok(Ok(())) => Ok(Cleanup::infallible(move || {
                        cleanups.fetch_add(1, Ordering::SeqCst);
                    })),
                    Ok(Err(message)) => Err(BoxError::from(message)),
                    Err(_) => Err(BoxError::from("start abandoned")),
                }
            }
        })
    }

    pub fn manager(&self, name: &str) -> SubscriptionManager {
        init_tracing();
        SubscriptionManager::new(ManagerConfig::named(name), self.start_fn()).unwrap()
    }

    /// Number of times start was invoked.
    pub fn starts(&self) -> usize {
        self.records.lock().len()
    }

    /// Starts not yet resolved or rejected.
    pub fn unsettled(&self) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.sender.is_some())
            .count()
    }

    /// Resolve the `index`-th start (0-based) successfully.
    pub fn resolve(&self, index: usize) {
        self.complete(index, Ok(()));
    }

    /// Reject the `index`-th start.
    pub fn reject(&self, index: usize, message: &str) {
        self.complete(index, Err(message.to_string()));
    }

    /// Resolve the oldest unsettled start. Returns its index.
    pub fn resolve_oldest(&self) -> Option<usize> {
        let index = self.oldest_unsettled()?;
        self.resolve(index);
        Some(index)
    }

    /// Reject the oldest unsettled start. Returns its index.
    pub fn reject_oldest(&self, message: &str) -> Option<usize> {
        let index = self.oldest_unsettled()?;
        self.reject(index, message);
        Some(index)
    }

    /// Cleanup invocations for the `index`-th start.
    pub fn cleanups(&self, index: usize) -> usize {
        self.records.lock()[index].cleanups.load(Ordering::SeqCst)
    }

    /// Cleanup invocations across all starts.
    pub fn total_cleanups(&self) -> usize {
        self.records
            .lock()
            .iter()
            .map(|r| r.cleanups.load(Ordering::SeqCst))
            .sum()
    }

    fn oldest_unsettled(&self) -> Option<usize> {
        self.records.lock().iter().position(|r| r.sender.is_some())
    }

    fn complete(&self, index: usize, outcome: Outcome) {
        let sender = self.records.lock()[index]
            .sender
            .take()
            .expect("start already settled");
        let _ = sender.send(outcome);
    }
}

/// Let spawned start drivers run to completion.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Route manager logs to the test output. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

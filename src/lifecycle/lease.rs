//! Per-consumer leases on a shared resource.

use crate::error::{Result, SubscriptionError};
use crate::types::{LeaseId, SessionId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};

use super::manager::{Inner, Readiness};

/// One consumer's claim on the shared resource.
///
/// Releasing is idempotent: only the first [`unsubscribe`](Self::unsubscribe)
/// (or the drop, if it comes first) decrements the reference count.
pub struct Lease {
    id: LeaseId,
    inner: Arc<Inner>,
    released: AtomicBool,
    /// Wakes `ready()` callers when this lease is released.
    on_release: Notify,
    readiness: watch::Receiver<Readiness>,
}

impl Lease {
    pub(crate) fn new(id: LeaseId, inner: Arc<Inner>, readiness: watch::Receiver<Readiness>) -> Self {
        Self {
            id,
            inner,
            released: AtomicBool::new(false),
            on_release: Notify::new(),
            readiness,
        }
    }

    pub fn id(&self) -> LeaseId {
        self.id
    }

    /// Give up this lease.
    ///
    /// If it was the last one, the resource is released: right away when ready,
    /// or as soon as start resolves when still pending. Returns the cleanup
    /// error if this call ran a cleanup that failed. Later calls return `Ok(())`.
    pub fn unsubscribe(&self) -> Result<()> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.on_release.notify_waiters();
        self.inner.release(self.id)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Wait until the shared resource is ready, returning the ready session.
    ///
    /// Fails with the start error if the current session failed to start, or
    /// with [`SubscriptionError::LeaseReleased`] once this lease is released,
    /// including by another holder of a shared lease while this call waits.
    pub async fn ready(&self) -> Result<SessionId> {
        let mut readiness = self.readiness.clone();
        loop {
            // Registered before the flag check so a release in between still wakes us.
            let released = self.on_release.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            if self.is_released() {
                return Err(SubscriptionError::LeaseReleased);
            }

            let outcome = {
                let status = readiness.borrow_and_update();
                let outcome = match &*status {
                    Readiness::Ready(session) => Some(Ok(*session)),
                    Readiness::Failed(err) => Some(Err(err.clone())),
                    Readiness::Starting | Readiness::Idle => None,
                };
                outcome
            };
            if let Some(outcome) = outcome {
                return outcome;
            }

            tokio::select! {
                changed = readiness.changed() => {
                    if changed.is_err() {
                        return Err(SubscriptionError::LeaseReleased);
                    }
                }
                _ = &mut released => return Err(SubscriptionError::LeaseReleased),
            }
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        // Cleanup failures were already logged and reported to observers.
        let _ = self.unsubscribe();
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("id", &self.id)
            .field("released", &self.is_released())
            .finish()
    }
}

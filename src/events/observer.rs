//! Observers for lifecycle events.

use super::types::LifecycleEvent;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Receives lifecycle notifications from a manager.
///
/// Called synchronously on whichever task performed the transition, with no
/// manager lock held. Implementations must not block.
pub trait LifecycleObserver: Send + Sync {
    fn on_event(&self, event: &LifecycleEvent);
}

impl<F> LifecycleObserver for F
where
    F: Fn(&LifecycleEvent) + Send + Sync,
{
    fn on_event(&self, event: &LifecycleEvent) {
        self(event)
    }
}

/// Forwards events into a bounded channel, dropping them when it is full.
pub struct ChannelObserver {
    sender: Sender<LifecycleEvent>,
    dropped: Arc<AtomicU64>,
}

impl ChannelObserver {
    /// Create an observer and the handle that receives its events.
    pub fn bounded(capacity: usize) -> (Self, EventHandle) {
        let (sender, receiver) = bounded(capacity);
        let dropped = Arc::new(AtomicU64::new(0));

        let observer = Self {
            sender,
            dropped: Arc::clone(&dropped),
        };

        (observer, EventHandle { receiver, dropped })
    }
}

impl LifecycleObserver for ChannelObserver {
    fn on_event(&self, event: &LifecycleEvent) {
        match self.sender.try_send(event.clone()) {
            Ok(()) => {}
            Err(crossbeam_channel::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    manager = event.manager(),
                    session = %event.session(),
                    "Lifecycle event channel full, dropping event"
                );
            }
            // Receiver gone; nobody is listening.
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Receiving side of a [`ChannelObserver`].
pub struct EventHandle {
    /// Channel to receive events.
    pub receiver: Receiver<LifecycleEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<LifecycleEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<LifecycleEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<LifecycleEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain every event currently buffered.
    pub fn drain(&self) -> Vec<LifecycleEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of events dropped because the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

//! Lifecycle notifications for logging and diagnostics collaborators.
//!
//! The manager reports every session transition as a [`LifecycleEvent`]:
//! - Start invoked for a new session
//! - Start resolved (ready) or failed
//! - Resource released, either normally or because the last lease left
//!   before start resolved
//! - Cleanup failures
//!
//! Observers are notified fire-and-forget, after the manager's internal
//! lock is released. A slow observer never delays a lifecycle transition.
//!
//! # Example
//!
//! ```ignore
//! let config = ManagerConfig::named("ipc-status");
//! let (observer, events) = config.event_channel();
//! let manager = SubscriptionManager::new(config, start)?.with_observer(Arc::new(observer));
//!
//! let lease = manager.subscribe();
//! match events.recv_timeout(Duration::from_secs(1)) {
//!     Ok(LifecycleEvent::Starting { session, .. }) => println!("session {session} starting"),
//!     other => println!("{other:?}"),
//! }
//! ```

mod observer;
mod types;

pub use observer::{ChannelObserver, EventHandle, LifecycleObserver};
pub use types::LifecycleEvent;

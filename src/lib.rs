//! # Leasehold
//!
//! Reference-counted lifecycle management for one shared resource that is
//! started asynchronously: an IPC stream, a socket, a platform listener.
//!
//! ## Core Concepts
//!
//! - **Start**: caller-supplied async operation that acquires the resource and
//!   yields a [`Cleanup`]
//! - **Lease**: one consumer's claim, returned by `subscribe()`; released
//!   explicitly or on drop, idempotently
//! - **Session**: span between a start and its release; start runs at most
//!   once per session and its cleanup exactly once
//!
//! The last lease leaving while start is still in flight does not leak the
//! resource: the cleanup runs as soon as start resolves.
//!
//! ## Example
//!
//! ```ignore
//! use leasehold::{start_fn, Cleanup, ManagerConfig, SubscriptionManager};
//!
//! let manager = SubscriptionManager::new(
//!     ManagerConfig::named("status-stream"),
//!     start_fn(|| async {
//!         let stream = open_status_stream().await?;
//!         Ok::<_, std::io::Error>(Cleanup::infallible(move || stream.close()))
//!     }),
//! )?;
//!
//! let lease = manager.subscribe();       // start invoked
//! let other = manager.subscribe();       // shares the same session
//! lease.ready().await?;
//!
//! drop(lease);
//! other.unsubscribe()?;                  // cleanup runs here
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod start;
pub mod types;

// Re-exports
pub use config::ManagerConfig;
pub use error::{Result, SharedError, SubscriptionError};
pub use events::{ChannelObserver, EventHandle, LifecycleEvent, LifecycleObserver};
pub use lifecycle::{Lease, SubscriptionManager};
pub use start::{start_fn, with_timeout};
pub use types::*;

//! Reference-counted lifecycle of one shared resource.
//!
//! # Data Flow
//! ```text
//! subscribe() (count 0 → 1):
//!     → state.rs: Idle/Cancelled → Pending(s)
//!     → start() invoked, driver task spawned
//!
//! start future resolves (driver task):
//!     → Pending(s)   → Ready(s), cleanup held
//!     → Cancelled(s) → cleanup runs now → Idle
//!     → superseded   → cleanup runs now
//!
//! Lease::unsubscribe() (count → 0):
//!     → Ready   → cleanup runs → Idle
//!     → Pending → Cancelled (cleanup deferred to resolution)
//! ```
//!
//! # Design Decisions
//! - One lock over refcount and state; every transition is a single step
//! - start, cleanups and observers run with the lock released, so they may
//!   subscribe re-entrantly
//! - The in-flight start future is never interrupted; an unwanted result is
//!   released on arrival
//! - Start failures reset to Idle so the next subscribe retries

mod lease;
mod manager;
mod state;

pub use lease::Lease;
pub use manager::SubscriptionManager;

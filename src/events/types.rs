//! Lifecycle event types.

use crate::types::SessionId;
use serde::{Deserialize, Serialize};

/// Events emitted by a subscription manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Start was invoked for a new session.
    Starting { manager: String, session: SessionId },

    /// Start resolved while the resource was still wanted.
    Ready { manager: String, session: SessionId },

    /// Start failed; the manager is back to idle.
    StartFailed {
        manager: String,
        session: SessionId,
        message: String,
    },

    /// The session's cleanup ran.
    Released {
        manager: String,
        session: SessionId,
        /// True if the last lease left before start resolved.
        cancelled: bool,
    },

    /// The session's cleanup returned an error. Bookkeeping still treats
    /// the resource as released.
    CleanupFailed {
        manager: String,
        session: SessionId,
        message: String,
    },
}

impl LifecycleEvent {
    /// Session this event belongs to.
    pub fn session(&self) -> SessionId {
        match self {
            LifecycleEvent::Starting { session, .. }
            | LifecycleEvent::Ready { session, .. }
            | LifecycleEvent::StartFailed { session, .. }
            | LifecycleEvent::Released { session, .. }
            | LifecycleEvent::CleanupFailed { session, .. } => *session,
        }
    }

    /// Name of the manager that emitted this event.
    pub fn manager(&self) -> &str {
        match self {
            LifecycleEvent::Starting { manager, .. }
            | LifecycleEvent::Ready { manager, .. }
            | LifecycleEvent::StartFailed { manager, .. }
            | LifecycleEvent::Released { manager, .. }
            | LifecycleEvent::CleanupFailed { manager, .. } => manager,
        }
    }
}

//! Setup state machine.
//!
//! # States
//! - Idle: no session
//! - Pending(s): start invoked for session `s`, resource wanted
//! - Cancelled(s): start still in flight for `s`, but no lease wants it
//! - Ready(s): start resolved, cleanup held
//!
//! # State Transitions
//! ```text
//! Idle      → Pending:   first lease arrives (start invoked)
//! Pending   → Cancelled: last lease leaves before start resolves
//! Pending   → Ready:     start resolves
//! Pending   → Idle:      start fails
//! Cancelled → Pending:   a lease arrives (new session, start invoked again)
//! Cancelled → Idle:      start resolves (cleanup runs) or fails
//! Ready     → Idle:      last lease leaves (cleanup runs)
//! ```
//!
//! A resolution for a session that is no longer current always releases
//! its cleanup immediately.

use crate::types::{Cleanup, SessionId, SetupPhase};

pub(crate) enum SetupState {
    Idle,
    Pending(SessionId),
    Cancelled(SessionId),
    Ready { session: SessionId, cleanup: Cleanup },
}

/// What the resolution handler must do with a freshly resolved cleanup.
pub(crate) enum Resolution {
    /// Session is current and wanted; cleanup is now held.
    Retained,
    /// Session was cancelled or superseded; run this cleanup now.
    Release(Cleanup),
}

impl SetupState {
    pub(crate) fn phase(&self) -> SetupPhase {
        match self {
            SetupState::Idle => SetupPhase::Idle,
            SetupState::Pending(_) => SetupPhase::Pending,
            SetupState::Cancelled(_) => SetupPhase::Cancelled,
            SetupState::Ready { .. } => SetupPhase::Ready,
        }
    }

    pub(crate) fn session(&self) -> Option<SessionId> {
        match self {
            SetupState::Idle => None,
            SetupState::Pending(s) | SetupState::Cancelled(s) => Some(*s),
            SetupState::Ready { session, .. } => Some(*session),
        }
    }

    /// Whether a new lease must invoke start.
    pub(crate) fn needs_start(&self) -> bool {
        matches!(self, SetupState::Idle | SetupState::Cancelled(_))
    }

    /// Last lease left. Returns the cleanup to run, if the resource is ready.
    pub(crate) fn release(&mut self) -> Option<(SessionId, Cleanup)> {
        match std::mem::replace(self, SetupState::Idle) {
            SetupState::Pending(s) => {
                *self = SetupState::Cancelled(s);
                None
            }
            SetupState::Ready { session, cleanup } => Some((session, cleanup)),
            other => {
                *self = other;
                None
            }
        }
    }

    /// Start for `session` resolved with `cleanup`.
    pub(crate) fn resolve(&mut self, session: SessionId, cleanup: Cleanup) -> Resolution {
        match *self {
            SetupState::Pending(s) if s == session => {
                *self = SetupState::Ready { session, cleanup };
                Resolution::Retained
            }
            SetupState::Cancelled(s) if s == session => {
                *self = SetupState::Idle;
                Resolution::Release(cleanup)
            }
            _ => Resolution::Release(cleanup),
        }
    }

    /// Start for `session` failed. Returns true if the failure hit the
    /// current session (as opposed to a superseded one).
    pub(crate) fn fail(&mut self, session: SessionId) -> bool {
        match *self {
            SetupState::Pending(s) | SetupState::Cancelled(s) if s == session => {
                *self = SetupState::Idle;
                true
            }
            _ => false,
        }
    }
}

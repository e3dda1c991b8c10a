//! Error types for the subscription manager.

use crate::types::SessionId;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Shared, cloneable handle to an error raised by a caller-supplied callback.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Main error type for subscription operations.
#[derive(Debug, Clone, Error)]
pub enum SubscriptionError {
    #[error("Start failed for session {session}: {error}")]
    StartFailed { session: SessionId, error: SharedError },

    #[error("Start panicked for session {session}")]
    StartPanicked { session: SessionId },

    #[error("Start abandoned for session {session}: the runtime dropped it before it settled")]
    StartAbandoned { session: SessionId },

    #[error("Start timed out after {0:?}")]
    StartTimedOut(Duration),

    #[error("Cleanup failed for session {session}: {error}")]
    CleanupFailed { session: SessionId, error: SharedError },

    #[error("Lease already released")]
    LeaseReleased,

    #[error("No tokio runtime available to drive start")]
    NoRuntime,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for SubscriptionError {
    fn from(e: serde_json::Error) -> Self {
        SubscriptionError::InvalidConfig(e.to_string())
    }
}

impl SubscriptionError {
    /// Session the error belongs to, if any.
    pub fn session(&self) -> Option<SessionId> {
        match self {
            SubscriptionError::StartFailed { session, .. }
            | SubscriptionError::StartPanicked { session }
            | SubscriptionError::StartAbandoned { session }
            | SubscriptionError::CleanupFailed { session, .. } => Some(*session),
            _ => None,
        }
    }

    /// True for failures of the start operation (including panics and timeouts).
    pub fn is_start_failure(&self) -> bool {
        matches!(
            self,
            SubscriptionError::StartFailed { .. }
                | SubscriptionError::StartPanicked { .. }
                | SubscriptionError::StartAbandoned { .. }
                | SubscriptionError::StartTimedOut(_)
        )
    }
}

/// Result type for subscription operations.
pub type Result<T> = std::result::Result<T, SubscriptionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_session() {
        let err = SubscriptionError::StartFailed {
            session: SessionId(7),
            error: Arc::new(std::io::Error::other("pipe closed")),
        };
        assert_eq!(err.to_string(), "Start failed for session 7: pipe closed");
        assert_eq!(err.session(), Some(SessionId(7)));
        assert!(err.is_start_failure());
    }

    #[test]
    fn test_non_session_errors() {
        assert_eq!(SubscriptionError::LeaseReleased.session(), None);
        assert!(!SubscriptionError::LeaseReleased.is_start_failure());
        assert!(SubscriptionError::StartTimedOut(Duration::from_millis(5)).is_start_failure());
    }

    #[test]
    fn test_abandoned_start() {
        let err = SubscriptionError::StartAbandoned {
            session: SessionId(3),
        };
        assert_eq!(err.session(), Some(SessionId(3)));
        assert!(err.is_start_failure());
        assert!(err.to_string().contains("abandoned"));
    }
}

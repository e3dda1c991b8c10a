//! Core types for the subscription manager.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Boxed error returned by caller-supplied start and cleanup callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Future produced by a start operation.
pub type StartFuture = BoxFuture<'static, Result<Cleanup, BoxError>>;

/// Shared start capability, invoked at most once per session.
pub type StartFn = Arc<dyn Fn() -> StartFuture + Send + Sync>;

/// Identifier of one session: the span between a start and its release.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl SessionId {
    pub fn next(self) -> Self {
        SessionId(self.0 + 1)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a single lease, unique per manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseId(pub u64);

/// Observable phase of the setup state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupPhase {
    /// No session; start has not been invoked or the last session ended.
    Idle,
    /// Start invoked, future not yet resolved, resource still wanted.
    Pending,
    /// Last lease left while pending; cleanup runs on resolution.
    Cancelled,
    /// Start resolved and its cleanup is held.
    Ready,
}

/// Release handle returned by a resolved start operation.
///
/// Consumed on invocation, so it can run at most once.
pub struct Cleanup(Box<dyn FnOnce() -> Result<(), BoxError> + Send>);

impl Cleanup {
    /// Wrap a fallible release function.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        Cleanup(Box::new(f))
    }

    /// Wrap an infallible release function.
    pub fn infallible<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Cleanup(Box::new(move || {
            f();
            Ok(())
        }))
    }

    /// A cleanup that releases nothing.
    pub fn noop() -> Self {
        Cleanup(Box::new(|| Ok(())))
    }

    pub(crate) fn run(self) -> Result<(), BoxError> {
        (self.0)()
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cleanup")
    }
}

//! Adapters for building start operations.

use crate::error::SubscriptionError;
use crate::types::{BoxError, Cleanup, StartFn};
use futures_util::{FutureExt, TryFutureExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Lift an async closure into a [`StartFn`].
///
/// ```ignore
/// let start = start_fn(|| async {
///     let stream = connect_status_stream().await?;
///     Ok::<_, std::io::Error>(Cleanup::infallible(move || stream.close()))
/// });
/// ```
pub fn start_fn<F, Fut, E>(f: F) -> StartFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Cleanup, E>> + Send + 'static,
    E: Into<BoxError> + 'static,
{
    Arc::new(move || f().map_err(Into::<BoxError>::into).boxed())
}

/// Bound every start attempt by `timeout`.
///
/// On expiry the start future is dropped and the attempt fails with
/// [`SubscriptionError::StartTimedOut`]. Anything the dropped future had
/// acquired is not released by the manager.
pub fn with_timeout(start: StartFn, timeout: Duration) -> StartFn {
    Arc::new(move || {
        let attempt = start();
        async move {
            match tokio::time::timeout(timeout, attempt).await {
                Ok(result) => result,
                Err(_) => Err(BoxError::from(SubscriptionError::StartTimedOut(timeout))),
            }
        }
        .boxed()
    })
}

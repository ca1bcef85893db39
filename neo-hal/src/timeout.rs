use crate::errors::{HalError, HalResult};
use std::future::Future;
use std::time::Duration;

/// Runs `fut` to completion, bounded by `limit` when one is configured.
///
/// With `limit == None` the future is awaited without a bound, which keeps the
/// blocking behaviour of a bare bus or sysfs call.
pub(crate) async fn with_timeout<T, F>(
    limit: Option<Duration>,
    operation: impl FnOnce() -> String,
    fut: F,
) -> HalResult<T>
where
    F: Future<Output = HalResult<T>>,
{
    match limit {
        None => fut.await,
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(HalError::Timeout {
                operation: operation(),
                timeout_ms: limit.as_millis() as u64,
            }),
        },
    }
}

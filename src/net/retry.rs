//! Opt-in retries layered above the client.
//!
//! The fetch pipeline never retries on its own. Applications that want to
//! ride out flaky connections wrap a whole catalog call with
//! [`with_retries`], typically using the `max_retries` and `retry_delay` of
//! their [`ProviderConfig`](crate::config::ProviderConfig).

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::Result;

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// `max_retries` additional attempts are used up.
///
/// Only errors for which [`Error::is_retryable`](crate::Error::is_retryable)
/// holds are retried, so challenges and parse failures return immediately.
/// With `max_retries = 3` the operation runs at most 4 times.
///
/// # Examples
///
/// ```rust,no_run
/// use goctruyen::CatalogClient;
/// use goctruyen::net::retry::with_retries;
///
/// # async fn example() -> goctruyen::Result<()> {
/// let client = CatalogClient::new()?;
/// let config = client.config().clone();
/// let sections = with_retries(config.max_retries, config.retry_delay(), || {
///     client.list_categories()
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_retries<T, F, Fut>(
    max_retries: u32,
    delay: Duration,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_retries => {
                attempt += 1;
                warn!(attempt, max_retries, error = %err, "retrying after transient failure");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

pub mod yahoo;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{OptionChain, PricePoint};

/// Upstream market-data feed for one index symbol.
///
/// All three calls may legitimately return empty results when the feed
/// is blocked or has nothing for the symbol — empty is a distinct,
/// non-exceptional outcome, and callers must handle it separately from
/// transport errors.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily (date, close) pairs over a short trailing window, oldest first.
    async fn price_history(&self, days: u32) -> Result<Vec<PricePoint>>;

    /// Available option-expiry dates as ISO `YYYY-MM-DD` strings.
    async fn expiries(&self) -> Result<Vec<String>>;

    /// The option chain for one expiry string from [`Self::expiries`].
    async fn option_chain(&self, expiry: &str) -> Result<OptionChain>;
}

/// Retry an async operation with exponential backoff.
pub async fn retry<T, F, Fut>(max_retries: u32, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..=max_retries {
        match f().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                last_err = Some(e);
                if attempt < max_retries {
                    let delay = std::time::Duration::from_millis(1000 * 2u64.pow(attempt));
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(last_err.unwrap())
}

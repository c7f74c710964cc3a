use chrono::NaiveDate;

use crate::model::{Field, MarketSnapshot};
use crate::provider::MarketDataProvider;

use super::{SnapshotError, atm, expiry};

/// Trailing price-history window, in days. Wide enough to ride out a
/// single-day provider gap.
const HISTORY_DAYS: u32 = 5;

/// How the record's date is established from the provider's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatePolicy {
    /// Always trust the provider's own latest close date.
    #[default]
    TrustProviderDate,
    /// Require the latest close to be `today`; otherwise the run is a
    /// stale-history skip.
    StrictDateMatch { today: NaiveDate },
}

/// Fetch, derive, and assemble one day's [`MarketSnapshot`].
///
/// Fatal only when the price history is empty (or stale under
/// [`DatePolicy::StrictDateMatch`]). Everything downstream of the spot
/// price degrades field-by-field to [`Field::Unavailable`] instead of
/// aborting, so a partially-blocked feed still yields a persistable row.
pub async fn build(
    provider: &dyn MarketDataProvider,
    date_policy: DatePolicy,
) -> Result<MarketSnapshot, SnapshotError> {
    let history = match provider.price_history(HISTORY_DAYS).await {
        Ok(points) => points,
        Err(e) => {
            eprintln!("  WARN  price history fetch failed: {e:#}");
            Vec::new()
        }
    };
    let Some(latest) = history.last() else {
        return Err(SnapshotError::NoMarketData);
    };

    if let DatePolicy::StrictDateMatch { today } = date_policy {
        if latest.date != today {
            return Err(SnapshotError::StaleHistory {
                latest: latest.date,
                expected: today,
            });
        }
    }

    let spot = latest.close;
    let mut snapshot = MarketSnapshot {
        date: latest.date,
        spot,
        atm_strike: Field::Unavailable,
        avg_iv_current: Field::Unavailable,
        avg_iv_next: Field::Unavailable,
        avg_iv_far: Field::Unavailable,
        straddle_price: Field::Unavailable,
    };

    let raw_expiries = match provider.expiries().await {
        Ok(list) => list,
        Err(e) => {
            eprintln!("  WARN  expiry list fetch failed: {e:#}");
            Vec::new()
        }
    };
    let monthly = expiry::monthly_expiries(&raw_expiries);
    if monthly.len() < 3 {
        let err = SnapshotError::InsufficientExpiries {
            found: monthly.len(),
            need: 3,
        };
        eprintln!("  WARN  {err}; persisting spot only");
        return Ok(snapshot);
    }

    let tenors: Vec<String> = monthly
        .iter()
        .take(3)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    // The three tenor fetches are independent: one blocked chain must
    // not take the others down with it.
    let (current, next, far) = tokio::join!(
        resolve_tenor(provider, &tenors[0], spot),
        resolve_tenor(provider, &tenors[1], spot),
        resolve_tenor(provider, &tenors[2], spot),
    );

    if let Some(quote) = current {
        snapshot.atm_strike = Field::Computed(quote.strike);
        snapshot.avg_iv_current = Field::Computed(quote.avg_iv);
        snapshot.straddle_price = Field::Computed(quote.straddle);
    }
    if let Some(quote) = next {
        snapshot.avg_iv_next = Field::Computed(quote.avg_iv);
    }
    if let Some(quote) = far {
        snapshot.avg_iv_far = Field::Computed(quote.avg_iv);
    }

    Ok(snapshot)
}

/// Fetch one tenor's chain and resolve its ATM quote. All failure modes
/// collapse to `None` after a warning; the caller substitutes sentinels.
async fn resolve_tenor(
    provider: &dyn MarketDataProvider,
    expiry: &str,
    spot: f64,
) -> Option<atm::AtmQuote> {
    let chain = match provider.option_chain(expiry).await {
        Ok(chain) => chain,
        Err(e) => {
            eprintln!("  WARN  chain fetch for {expiry} failed: {e:#}");
            return None;
        }
    };
    match atm::resolve(&chain, spot) {
        Ok(quote) => Some(quote),
        Err(e) => {
            eprintln!("  WARN  ATM resolution for {expiry} failed: {e}");
            None
        }
    }
}

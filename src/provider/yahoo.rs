use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::model::{OptionChain, OptionRow, PricePoint};

use super::{MarketDataProvider, retry};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const OPTIONS_URL: &str = "https://query2.finance.yahoo.com/v7/finance/options";

// ── API response types ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartOuter,
}

#[derive(Debug, Deserialize)]
struct ChartOuter {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: OptionsOuter,
}

#[derive(Debug, Deserialize)]
struct OptionsOuter {
    result: Option<Vec<OptionsResult>>,
}

#[derive(Debug, Deserialize)]
struct OptionsResult {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<ChainEntry>,
}

#[derive(Debug, Deserialize)]
struct ChainEntry {
    #[serde(default)]
    calls: Vec<OptionRow>,
    #[serde(default)]
    puts: Vec<OptionRow>,
}

// ── Provider ─────────────────────────────────────────────────────────

/// Yahoo Finance feed for a single index symbol.
pub struct YahooProvider {
    client: reqwest::Client,
    symbol: String,
}

impl YahooProvider {
    pub fn new(client: reqwest::Client, symbol: &str) -> Self {
        Self {
            client,
            symbol: symbol.to_string(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        retry(3, || {
            let client = self.client.clone();
            let url = url.to_string();
            async move {
                let r = client
                    .get(&url)
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<T>()
                    .await?;
                Ok(r)
            }
        })
        .await
    }

    async fn options_result(&self, expiry_epoch: Option<i64>) -> Result<Option<OptionsResult>> {
        let url = match expiry_epoch {
            Some(epoch) => format!("{OPTIONS_URL}/{}?date={epoch}", self.symbol),
            None => format!("{OPTIONS_URL}/{}", self.symbol),
        };
        let resp: OptionsResponse = self
            .get_json(&url)
            .await
            .with_context(|| format!("fetching option chain for {}", self.symbol))?;
        Ok(resp
            .option_chain
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) }))
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn price_history(&self, days: u32) -> Result<Vec<PricePoint>> {
        let url = format!(
            "{CHART_URL}/{}?range={days}d&interval=1d",
            self.symbol
        );
        let resp: ChartResponse = self
            .get_json(&url)
            .await
            .with_context(|| format!("fetching price history for {}", self.symbol))?;

        let Some(result) = resp.chart.result.and_then(|mut r| {
            if r.is_empty() { None } else { Some(r.remove(0)) }
        }) else {
            return Ok(Vec::new());
        };

        let Some(quote) = result.indicators.quote.first() else {
            return Ok(Vec::new());
        };

        // Null closes mark holidays / not-yet-settled bars; skip them.
        let mut points: Vec<PricePoint> = result
            .timestamp
            .iter()
            .zip(quote.close.iter())
            .filter_map(|(ts, close)| {
                let close = (*close)?;
                let date = DateTime::from_timestamp(*ts, 0)?.date_naive();
                Some(PricePoint { date, close })
            })
            .collect();
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Ok(points)
    }

    async fn expiries(&self) -> Result<Vec<String>> {
        let Some(result) = self.options_result(None).await? else {
            return Ok(Vec::new());
        };
        // Expiry epochs are UTC midnight of the expiry date.
        let expiries = result
            .expiration_dates
            .iter()
            .filter_map(|epoch| DateTime::from_timestamp(*epoch, 0))
            .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
            .collect();
        Ok(expiries)
    }

    async fn option_chain(&self, expiry: &str) -> Result<OptionChain> {
        let date = NaiveDate::parse_from_str(expiry, "%Y-%m-%d")
            .with_context(|| format!("invalid expiry date `{expiry}`"))?;
        let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
            bail!("invalid expiry date `{expiry}`");
        };
        let epoch = midnight.and_utc().timestamp();

        let Some(result) = self.options_result(Some(epoch)).await? else {
            return Ok(OptionChain::default());
        };
        let Some(entry) = result.options.into_iter().next() else {
            return Ok(OptionChain::default());
        };
        Ok(OptionChain {
            calls: entry.calls,
            puts: entry.puts,
        })
    }
}

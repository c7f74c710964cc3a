use chrono::NaiveDate;
use serde::Deserialize;

// ── Provider-side types ─────────────────────────────────────────────

/// One daily close from the price history feed.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// One quoted option at a single strike.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionRow {
    pub strike: f64,
    #[serde(rename = "impliedVolatility", default)]
    pub implied_volatility: f64,
    #[serde(rename = "lastPrice", default)]
    pub last_price: f64,
}

/// Calls and puts for a single expiry. Ephemeral, never persisted.
#[derive(Debug, Clone, Default)]
pub struct OptionChain {
    pub calls: Vec<OptionRow>,
    pub puts: Vec<OptionRow>,
}

impl OptionChain {
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }
}

// ── Snapshot record ─────────────────────────────────────────────────

/// A derived value that may have failed to compute. Persisted as the
/// 0 sentinel, but in-process consumers can tell the difference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    Computed(f64),
    Unavailable,
}

impl Field {
    /// The persisted number: the computed value, or 0 as the sentinel.
    pub fn value(&self) -> f64 {
        match self {
            Field::Computed(v) => *v,
            Field::Unavailable => 0.0,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Field::Computed(_))
    }
}

/// One row of the persisted dataset: the day's spot and ATM option
/// metrics across the three nearest monthly tenors.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub date: NaiveDate,
    pub spot: f64,
    pub atm_strike: Field,
    pub avg_iv_current: Field,
    pub avg_iv_next: Field,
    pub avg_iv_far: Field,
    pub straddle_price: Field,
}

/// Canonical CSV header, in fixed order. `Date` is the upsert key.
pub const COLUMNS: [&str; 7] = [
    "Date",
    "Spot",
    "ATM_Strike",
    "Avg_IV_Current",
    "Avg_IV_Next",
    "Avg_IV_Far",
    "Straddle_Price",
];

impl MarketSnapshot {
    /// Render the record as CSV cells aligned to [`COLUMNS`].
    /// Numerics use fixed 2-decimal formatting.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.date.format("%Y-%m-%d").to_string(),
            format!("{:.2}", self.spot),
            format!("{:.2}", self.atm_strike.value()),
            format!("{:.2}", self.avg_iv_current.value()),
            format!("{:.2}", self.avg_iv_next.value()),
            format!("{:.2}", self.avg_iv_far.value()),
            format!("{:.2}", self.straddle_price.value()),
        ]
    }
}

use std::collections::{HashMap, HashSet};

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;

use iv_tracker::model::{Field, OptionChain, OptionRow, PricePoint};
use iv_tracker::provider::MarketDataProvider;
use iv_tracker::snapshot::SnapshotError;
use iv_tracker::snapshot::builder::{self, DatePolicy};

// ── Mock provider ───────────────────────────────────────────────────

/// A scripted feed: fixed history and expiries, per-expiry chains, and
/// a set of expiries whose chain fetch fails outright.
#[derive(Default)]
struct MockProvider {
    history: Vec<PricePoint>,
    expiries: Vec<String>,
    chains: HashMap<String, OptionChain>,
    blocked: HashSet<String>,
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn price_history(&self, _days: u32) -> Result<Vec<PricePoint>> {
        Ok(self.history.clone())
    }

    async fn expiries(&self) -> Result<Vec<String>> {
        Ok(self.expiries.clone())
    }

    async fn option_chain(&self, expiry: &str) -> Result<OptionChain> {
        if self.blocked.contains(expiry) {
            bail!("upstream blocked");
        }
        Ok(self.chains.get(expiry).cloned().unwrap_or_default())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn chain(strikes: &[f64], iv: f64, last: f64) -> OptionChain {
    let rows = |iv: f64, last: f64| -> Vec<OptionRow> {
        strikes
            .iter()
            .map(|s| OptionRow {
                strike: *s,
                implied_volatility: iv,
                last_price: last,
            })
            .collect()
    };
    OptionChain {
        calls: rows(iv, last),
        puts: rows(iv + 0.02, last - 1.0),
    }
}

fn full_provider() -> MockProvider {
    let mut chains = HashMap::new();
    chains.insert(
        "2024-06-27".to_string(),
        chain(&[22400.0, 22450.0, 22500.0], 0.12, 180.0),
    );
    chains.insert("2024-07-25".to_string(), chain(&[22450.0], 0.14, 260.0));
    chains.insert("2024-08-29".to_string(), chain(&[22450.0], 0.15, 330.0));

    MockProvider {
        history: vec![
            PricePoint {
                date: date("2024-06-02"),
                close: 22390.0,
            },
            PricePoint {
                date: date("2024-06-03"),
                close: 22460.0,
            },
        ],
        expiries: vec![
            "2024-06-06".to_string(),
            "2024-06-13".to_string(),
            "2024-06-27".to_string(),
            "2024-07-25".to_string(),
            "2024-08-29".to_string(),
        ],
        chains,
        blocked: HashSet::new(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn builds_full_snapshot_from_healthy_feed() {
    let provider = full_provider();
    let snap = builder::build(&provider, DatePolicy::TrustProviderDate)
        .await
        .unwrap();

    assert_eq!(snap.date, date("2024-06-03"));
    assert_eq!(snap.spot, 22460.0);
    // Nearest monthly chain: strike 22450 is closest to 22460.
    assert_eq!(snap.atm_strike, Field::Computed(22450.0));
    assert!((snap.avg_iv_current.value() - 13.0).abs() < 1e-9);
    assert!((snap.avg_iv_next.value() - 15.0).abs() < 1e-9);
    assert!((snap.avg_iv_far.value() - 16.0).abs() < 1e-9);
    // Straddle = call 180 + put 179 from the nearest chain.
    assert!((snap.straddle_price.value() - 359.0).abs() < 1e-9);
}

#[tokio::test]
async fn far_month_failure_degrades_only_far_field() {
    let mut provider = full_provider();
    provider.blocked.insert("2024-08-29".to_string());

    let snap = builder::build(&provider, DatePolicy::TrustProviderDate)
        .await
        .unwrap();

    assert!(snap.avg_iv_current.is_computed());
    assert!(snap.avg_iv_next.is_computed());
    assert!(snap.straddle_price.is_computed());
    assert_eq!(snap.avg_iv_far, Field::Unavailable);
    assert_eq!(snap.avg_iv_far.value(), 0.0);
}

#[tokio::test]
async fn empty_price_history_is_fatal_and_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let data_file = dir.path().join("data.csv");
    let before = "Date,Spot\n2024-05-31,22300.00\n";
    std::fs::write(&data_file, before).unwrap();

    let provider = MockProvider::default();
    let err = builder::build(&provider, DatePolicy::TrustProviderDate)
        .await
        .unwrap_err();
    assert!(matches!(err, SnapshotError::NoMarketData));

    // No snapshot, no store interaction: file is byte-for-byte intact.
    let after = std::fs::read_to_string(&data_file).unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn insufficient_expiries_still_yields_spot_only_snapshot() {
    let mut provider = full_provider();
    provider.expiries = vec!["2024-06-27".to_string(), "2024-07-25".to_string()];

    let snap = builder::build(&provider, DatePolicy::TrustProviderDate)
        .await
        .unwrap();

    assert_eq!(snap.spot, 22460.0);
    assert_eq!(snap.atm_strike, Field::Unavailable);
    assert_eq!(snap.avg_iv_current, Field::Unavailable);
    assert_eq!(snap.avg_iv_next, Field::Unavailable);
    assert_eq!(snap.avg_iv_far, Field::Unavailable);
    assert_eq!(snap.straddle_price, Field::Unavailable);
}

#[tokio::test]
async fn strict_date_policy_flags_stale_history() {
    let provider = full_provider();
    let err = builder::build(
        &provider,
        DatePolicy::StrictDateMatch {
            today: date("2024-06-04"),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        SnapshotError::StaleHistory { latest, expected }
            if latest == date("2024-06-03") && expected == date("2024-06-04")
    ));
}

#[tokio::test]
async fn strict_date_policy_accepts_todays_close() {
    let provider = full_provider();
    let snap = builder::build(
        &provider,
        DatePolicy::StrictDateMatch {
            today: date("2024-06-03"),
        },
    )
    .await
    .unwrap();
    assert_eq!(snap.date, date("2024-06-03"));
}

#[tokio::test]
async fn empty_expiry_list_degrades_like_insufficient_expiries() {
    let mut provider = full_provider();
    provider.expiries.clear();

    let snap = builder::build(&provider, DatePolicy::TrustProviderDate)
        .await
        .unwrap();
    assert_eq!(snap.spot, 22460.0);
    assert_eq!(snap.avg_iv_current, Field::Unavailable);
}

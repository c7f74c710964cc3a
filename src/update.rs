use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc, Weekday};

use crate::provider::yahoo::YahooProvider;
use crate::snapshot::SnapshotError;
use crate::snapshot::builder::{self, DatePolicy};
use crate::store::{DatasetStore, MigrationPolicy};

/// CLI-facing config for the `update` command.
pub struct UpdateConfig {
    pub data_file: PathBuf,
    pub symbol: String,
    pub strict_date: bool,
    pub migration: MigrationPolicy,
    pub force: bool,
}

/// Entry point for the `update` command: one fetch → derive → upsert →
/// persist cycle, run by the external scheduler.
pub fn run(config: &UpdateConfig) -> Result<()> {
    let today = Utc::now().date_naive();

    if !config.force && matches!(today.weekday(), Weekday::Sat | Weekday::Sun) {
        println!("Skipping {today}: not a trading day (use --force to override).");
        return Ok(());
    }

    println!("=== iv-tracker update ===");
    println!("Symbol:  {}", config.symbol);
    println!("Dataset: {}", config.data_file.display());
    println!();

    let date_policy = if config.strict_date {
        DatePolicy::StrictDateMatch { today }
    } else {
        DatePolicy::TrustProviderDate
    };

    let rt = tokio::runtime::Runtime::new().context("creating async runtime")?;
    let snapshot = rt.block_on(async {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("iv-tracker/0.1")
            .build()
            .context("creating HTTP client")?;
        let provider = YahooProvider::new(client, &config.symbol);
        Ok::<_, anyhow::Error>(builder::build(&provider, date_policy).await)
    })?;

    let snapshot = match snapshot {
        Ok(snapshot) => snapshot,
        Err(e @ SnapshotError::StaleHistory { .. }) => {
            // Not an outage: the provider just hasn't rolled to today
            // yet. Retrying won't help, so signal success to the cron.
            println!("Skipping run: {e}");
            return Ok(());
        }
        Err(e) => return Err(anyhow::Error::new(e).context("building market snapshot")),
    };

    let store = DatasetStore::new(&config.data_file, config.migration);
    let mut dataset = store.load();
    store.upsert(&mut dataset, &snapshot);
    store.persist(&dataset)?;

    println!(
        "  OK  {} spot={:.2} atm={:.2} iv=[{:.2} {:.2} {:.2}] straddle={:.2} ({} rows)",
        snapshot.date,
        snapshot.spot,
        snapshot.atm_strike.value(),
        snapshot.avg_iv_current.value(),
        snapshot.avg_iv_next.value(),
        snapshot.avg_iv_far.value(),
        snapshot.straddle_price.value(),
        dataset.rows.len()
    );
    Ok(())
}

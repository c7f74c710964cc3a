use std::path::Path;

use anyhow::Result;

use crate::store::{DatasetStore, MigrationPolicy};

/// Shape of the IV term structure across the three monthly tenors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermStructure {
    Steepening,
    Inverted,
    FlatMixed,
}

impl TermStructure {
    pub fn label(&self) -> &'static str {
        match self {
            TermStructure::Steepening => "steepening",
            TermStructure::Inverted => "inverted",
            TermStructure::FlatMixed => "flat/mixed",
        }
    }
}

/// Classify the term structure from the three persisted IV fields.
pub fn classify(current: f64, next: f64, far: f64) -> TermStructure {
    if current < next && next < far {
        TermStructure::Steepening
    } else if current > next {
        TermStructure::Inverted
    } else {
        TermStructure::FlatMixed
    }
}

/// Entry point for the `report` command: a read-only view over the
/// persisted dataset. Never mutates the file.
pub fn run(data_file: &Path) -> Result<()> {
    let store = DatasetStore::new(data_file, MigrationPolicy::default());
    let mut dataset = store.load();
    if dataset.is_empty() || dataset.rows.is_empty() {
        println!(
            "No data found at {} yet. Wait for the daily update to run.",
            data_file.display()
        );
        return Ok(());
    }
    dataset.sort_by_date();

    let Some(latest) = dataset.rows.last() else {
        return Ok(());
    };
    let cell = |name: &str| -> String {
        dataset
            .column(name)
            .and_then(|i| latest.get(i).cloned())
            .unwrap_or_default()
    };
    let num = |name: &str| -> f64 { cell(name).parse().unwrap_or(0.0) };

    println!("=== iv-tracker report ===");
    println!("Date:         {}", cell("Date"));
    println!("Spot:         {:.2}", num("Spot"));
    println!("ATM strike:   {:.2}", num("ATM_Strike"));
    println!("ATM straddle: {:.2}", num("Straddle_Price"));

    let (iv_c, iv_n, iv_f) = (
        num("Avg_IV_Current"),
        num("Avg_IV_Next"),
        num("Avg_IV_Far"),
    );
    println!(
        "IV term:      {:.2} / {:.2} / {:.2}  ({})",
        iv_c,
        iv_n,
        iv_f,
        classify(iv_c, iv_n, iv_f).label()
    );

    println!("\nLast {} rows:", dataset.rows.len().min(10));
    println!("  {}", dataset.columns.join("  "));
    for row in dataset.rows.iter().rev().take(10) {
        println!("  {}", row.join("  "));
    }
    Ok(())
}

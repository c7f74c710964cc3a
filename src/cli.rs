use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Daily volatility term-structure tracker — fetches the index spot and
/// ATM option metrics, and maintains an append-only CSV dataset.
#[derive(Parser)]
#[command(name = "iv-tracker", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch today's snapshot and upsert it into the dataset (for external cron)
    Update {
        /// Path to the dataset CSV file
        #[arg(long, default_value = "nifty_data.csv")]
        data_file: PathBuf,

        /// Index symbol to track
        #[arg(long, default_value = "^NSEI")]
        symbol: String,

        /// Require the provider's latest close to be today's UTC date
        /// (default: trust whatever latest date the provider reports)
        #[arg(long)]
        strict_date: bool,

        /// Schema migration policy: "preserve" (keep old rows, new
        /// columns empty) or "rewrite" (discard old rows)
        #[arg(long, default_value = "preserve")]
        migration: String,

        /// Run even on weekends
        #[arg(long)]
        force: bool,
    },

    /// Print latest metrics and the IV term-structure shape (read-only)
    Report {
        /// Path to the dataset CSV file
        #[arg(long, default_value = "nifty_data.csv")]
        data_file: PathBuf,
    },
}

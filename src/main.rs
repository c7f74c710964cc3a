use anyhow::bail;
use clap::Parser;

use iv_tracker::store::MigrationPolicy;
use iv_tracker::{cli, report, update};

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Update {
            data_file,
            symbol,
            strict_date,
            migration,
            force,
        } => {
            let migration = match migration.as_str() {
                "preserve" => MigrationPolicy::Preserve,
                "rewrite" => MigrationPolicy::Rewrite,
                other => bail!("unknown migration policy `{other}` (expected preserve or rewrite)"),
            };
            update::run(&update::UpdateConfig {
                data_file,
                symbol,
                strict_date,
                migration,
                force,
            })
        }
        cli::Command::Report { data_file } => report::run(&data_file),
    }
}

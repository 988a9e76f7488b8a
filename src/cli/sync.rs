//! `arca sync`

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

use super::CliContext;

#[derive(Args, Debug)]
pub struct SyncCommand {}

impl SyncCommand {
    pub async fn execute(self, ctx: &CliContext) -> Result<()> {
        let report = ctx.installer()?.sync().await?;

        if !ctx.quiet {
            for asset in &report.synced {
                println!(
                    "{} {}@{} from {} ({})",
                    "Synced".green().bold(),
                    asset.id,
                    asset.version,
                    asset.source,
                    short_commit(&asset.commit)
                );
            }
        }

        for failure in &report.failures {
            eprintln!("{} {} from {}", "Failed".red().bold(), failure.id, failure.source);
            eprintln!("  {:#}", failure.error);
        }

        if !report.is_success() {
            bail!(
                "{} of {} asset(s) failed to sync",
                report.failures.len(),
                report.failures.len() + report.synced.len()
            );
        }

        if !ctx.quiet && report.synced.is_empty() {
            println!("Nothing to sync");
        }
        Ok(())
    }
}

/// First 12 characters of a commit id; `local` stays as is.
pub(super) fn short_commit(commit: &str) -> &str {
    commit.get(..12).unwrap_or(commit)
}

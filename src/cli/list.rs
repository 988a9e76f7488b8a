//! `arca list` and `arca list-remote`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use super::CliContext;
use super::sync::short_commit;
use crate::installer::{ListedAsset, RemoteListing};

#[derive(Args, Debug)]
pub struct ListCommand {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    pub fn execute(self, ctx: &CliContext) -> Result<()> {
        let assets = ctx.installer()?.list()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&assets).context("Failed to serialize list")?);
            return Ok(());
        }

        if assets.is_empty() {
            println!("No assets configured. Add one with 'arca install <source> <asset>'.");
            return Ok(());
        }

        println!(
            "{:<24} {:<20} {:<12} {:<10} {}",
            "ASSET".bold(),
            "SOURCE".bold(),
            "CONSTRAINT".bold(),
            "VERSION".bold(),
            "COMMIT".bold()
        );
        for asset in &assets {
            println!("{}", format_row(asset));
        }
        Ok(())
    }
}

fn format_row(asset: &ListedAsset) -> String {
    match &asset.locked {
        Some(locked) => format!(
            "{:<24} {:<20} {:<12} {:<10} {}",
            asset.id,
            asset.source,
            asset.constraint,
            locked.version,
            short_commit(&locked.commit)
        ),
        None => format!(
            "{:<24} {:<20} {:<12} {}",
            asset.id,
            asset.source,
            asset.constraint,
            "not locked".yellow()
        ),
    }
}

#[derive(Args, Debug)]
pub struct ListRemoteCommand {
    /// Source alias, local directory or git URL
    pub source: String,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl ListRemoteCommand {
    pub async fn execute(self, ctx: &CliContext) -> Result<()> {
        let listing = ctx.installer()?.list_remote(&self.source).await?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&listing).context("Failed to serialize listing")?
            );
            return Ok(());
        }

        print_listing(&listing);
        Ok(())
    }
}

fn print_listing(listing: &RemoteListing) {
    println!(
        "{} {} ({})",
        listing.source.bold(),
        listing.location.dimmed(),
        short_commit(&listing.revision)
    );
    if listing.assets.is_empty() {
        println!("  (no assets)");
        return;
    }
    for asset in &listing.assets {
        println!("  {} [{}] {}", asset.id.cyan(), asset.kind, asset.versions.join(", "));
        if !asset.description.is_empty() {
            println!("      {}", asset.description.dimmed());
        }
    }
}

//! `arca cache`

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use super::CliContext;

#[derive(Args, Debug)]
pub struct CacheCommand {
    #[command(subcommand)]
    command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
enum CacheSubcommand {
    /// Delete every cached asset
    Clean {
        /// Only remove leftovers of interrupted writes
        #[arg(long)]
        staging: bool,
    },
    /// Show the cache location and size
    Info,
}

impl CacheCommand {
    pub fn execute(self, ctx: &CliContext) -> Result<()> {
        let cache = ctx.cache()?;

        match self.command {
            CacheSubcommand::Clean {
                staging: true,
            } => {
                cache.clean_staging()?;
                if !ctx.quiet {
                    println!(
                        "{} interrupted writes under {}",
                        "Removed".green().bold(),
                        cache.root().display()
                    );
                }
            }
            CacheSubcommand::Clean {
                staging: false,
            } => {
                let freed = cache.size()?;
                cache.clear()?;
                if !ctx.quiet {
                    println!(
                        "{} {} ({} freed)",
                        "Cleared".green().bold(),
                        cache.root().display(),
                        format_size(freed)
                    );
                }
            }
            CacheSubcommand::Info => {
                println!("Location: {}", cache.root().display());
                println!("Size:     {}", format_size(cache.size()?));
            }
        }
        Ok(())
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 { format!("{bytes} B") } else { format!("{size:.1} {}", UNITS[unit]) }
}

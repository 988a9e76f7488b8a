//! Command-line interface for ARCA.
//!
//! Each subcommand lives in its own module as a `clap::Args` struct with an
//! `execute` method. Commands are thin: they build an [`Installer`] from the
//! workspace root and global settings, call one pipeline operation and print
//! the result.
//!
//! ```text
//! arca install <source> <asset> [version] [--target PATH] [--name NAME]
//! arca sync
//! arca list [--json]
//! arca list-remote <source> [--json]
//! arca cache clean [--staging] | info
//! ```
//!
//! Global flags: `--verbose`, `--quiet`, `--workspace DIR`, `--no-progress`.

mod cache;
mod install;
mod list;
mod sync;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cache::Cache;
use crate::config::{GlobalSettings, get_cache_dir};
use crate::installer::Installer;

#[derive(Parser, Debug)]
#[command(
    name = "arca",
    about = "ARCA - resolve, fetch and lock prompts, skills and instructions",
    version,
    long_about = "ARCA installs versioned AI assets (prompts, skills, instructions) from git \
                  repositories or local directories, records exactly what was fetched in \
                  .arca-assets.lock and links the content into your workspace."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Workspace root (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install an asset and its dependencies
    Install(install::InstallCommand),

    /// Re-fetch every configured asset, honouring locked revisions
    Sync(sync::SyncCommand),

    /// List configured assets and their lock state
    List(list::ListCommand),

    /// List the assets a source publishes
    #[command(name = "list-remote")]
    ListRemote(list::ListRemoteCommand),

    /// Inspect or clear the asset cache
    Cache(cache::CacheCommand),
}

/// What every command needs to reach the workspace and the cache.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub workspace_root: PathBuf,
    pub settings: GlobalSettings,
    pub quiet: bool,
    pub no_progress: bool,
}

impl CliContext {
    pub fn cache(&self) -> Result<Cache> {
        Ok(Cache::with_root(get_cache_dir(&self.settings)?))
    }

    pub fn installer(&self) -> Result<Installer> {
        Ok(Installer::new(&self.workspace_root, self.cache()?, self.settings.clone())
            .quiet(self.quiet || self.no_progress))
    }
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset.
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }

    pub fn build_context(&self) -> Result<CliContext> {
        let workspace_root = match &self.workspace {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Cannot determine current directory")?,
        };

        Ok(CliContext {
            workspace_root,
            settings: GlobalSettings::load()?,
            quiet: self.quiet,
            no_progress: self.no_progress,
        })
    }

    pub async fn execute(self) -> Result<()> {
        let ctx = self.build_context()?;

        match self.command {
            Commands::Install(cmd) => cmd.execute(&ctx).await,
            Commands::Sync(cmd) => cmd.execute(&ctx).await,
            Commands::List(cmd) => cmd.execute(&ctx),
            Commands::ListRemote(cmd) => cmd.execute(&ctx).await,
            Commands::Cache(cmd) => cmd.execute(&ctx),
        }
    }
}

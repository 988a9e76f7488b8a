//! `arca install`

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliContext;
use crate::config::DEFAULT_PROJECTION;
use crate::utils::normalize_path_for_storage;
use crate::version::LATEST;

#[derive(Args, Debug)]
pub struct InstallCommand {
    /// Source alias, local directory or git URL
    pub source: String,

    /// Asset id as declared in the source manifest
    pub asset: String,

    /// Version constraint: `latest`, `1.2.0`, `^1.0`, `>=1.0, <2.0`, ...
    #[arg(default_value = LATEST)]
    pub version: String,

    /// Workspace path to project the asset to
    #[arg(short, long, value_name = "PATH")]
    pub target: Option<String>,

    /// Projection name, for assets projected to several places
    #[arg(short = 'n', long = "name", default_value = DEFAULT_PROJECTION)]
    pub projection: String,
}

impl InstallCommand {
    pub async fn execute(self, ctx: &CliContext) -> Result<()> {
        let installer = ctx.installer()?;
        let report = installer
            .install(
                &self.source,
                &self.asset,
                &self.version,
                &self.projection,
                self.target.as_deref(),
            )
            .await?;

        if ctx.quiet {
            return Ok(());
        }

        if let Some(root) = report.root() {
            println!(
                "{} {}@{} from {}",
                "Installed".green().bold(),
                root.id,
                root.version,
                report.source
            );
        }
        for dependency in report.assets.iter().skip(1) {
            println!("  {} {}@{}", "+".green(), dependency.id, dependency.version);
        }

        let shown = report
            .projection
            .path
            .strip_prefix(&ctx.workspace_root)
            .map_or_else(|_| report.projection.path.display().to_string(), normalize_path_for_storage);
        println!("  {} {} ({})", "->".dimmed(), shown, report.projection.mode);
        Ok(())
    }
}

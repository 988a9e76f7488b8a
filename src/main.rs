//! ARCA command-line entry point.

use anyhow::Result;
use arca_cli::cli::Cli;
use arca_cli::core::user_friendly_error;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_logging(cli: &Cli) {
    // RUST_LOG wins over --verbose / --quiet.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}

//! Crosspost CLI
//!
//! Publishes one short video to YouTube Shorts, TikTok and Instagram Reels in
//! parallel, reporting progress as each platform finishes.
//!
//! # Usage
//!
//! ```bash
//! crosspost credentials set tiktok --cookies cookies.txt
//! crosspost upload --video clip.mp4 --description "Sunset" --tags "#travel #sea" \
//!     --platform youtube --platform tiktok --platform instagram
//! crosspost credentials validate
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use crosspost_cli::adapters::TracingLogAdapter;
use crosspost_cli::app::DefaultAppContainer;
use crosspost_cli::cli::{commands, Cli};
use crosspost_cli::config_initialization::initialize_configuration_hierarchy;

/// Main entry point for the crosspost CLI application
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let settings = initialize_configuration_hierarchy(&cli.overrides()).await?;
    TracingLogAdapter::install(settings.log_level, cli.log_json)?;

    info!("Starting crosspost {}", env!("CARGO_PKG_VERSION"));
    debug!(
        app_dir = %settings.app_dir.display(),
        config_file = ?settings.config_file,
        max_concurrent = settings.max_concurrent,
        "Configuration resolved"
    );

    let container = DefaultAppContainer::new(&settings)?;
    commands::execute(&container, cli.command).await
}

//! CLI module for crosspost
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config_initialization::CliOverrides;

pub mod args;
pub mod commands;

/// Crosspost - publish one short video to several platforms at once
///
/// Uploads run in parallel (bounded by --max-concurrent); one platform failing
/// never stops the others.
#[derive(Parser, Debug)]
#[command(name = "crosspost")]
#[command(about = "Publish one short video to YouTube Shorts, TikTok and Instagram Reels in parallel")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (TOML with a [crosspost] table)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding credentials, tokens and sessions
    #[arg(long, global = true, value_name = "DIR")]
    pub app_dir: Option<PathBuf>,

    /// Maximum number of platforms uploading at the same time
    #[arg(long, global = true, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub max_concurrent: Option<u16>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Settings given on the command line, for the configuration hierarchy
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            config_file: self.config.clone(),
            log_level: self.log_level.clone(),
            max_concurrent: self.max_concurrent.map(usize::from),
            app_dir: self.app_dir.clone(),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a video to one or more platforms
    Upload(args::UploadArgs),
    /// Manage stored platform credentials
    Credentials {
        #[command(subcommand)]
        action: args::CredentialsCommand,
    },
    /// List the platforms this build can upload to
    Platforms,
}

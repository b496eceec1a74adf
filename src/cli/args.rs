//! Command-line argument definitions

use std::path::PathBuf;

use clap::{ArgGroup, Args, Subcommand};

/// Arguments for the upload command
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Video file to publish
    #[arg(short, long, value_name = "FILE")]
    pub video: PathBuf,

    /// Description; the first 100 characters become the YouTube title
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Tags separated by spaces or commas, with or without '#'
    #[arg(short, long, default_value = "")]
    pub tags: String,

    /// Target platform; repeat or separate with commas
    #[arg(short, long = "platform", value_name = "NAME", value_delimiter = ',')]
    pub platforms: Vec<String>,

    /// Print the aggregate result as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Credential management commands
#[derive(Subcommand, Debug)]
pub enum CredentialsCommand {
    /// Print stored credentials with secrets masked
    Show,
    /// Check stored credentials without contacting the platforms
    Validate(ValidateArgs),
    /// Store credentials for a platform
    Set {
        #[command(subcommand)]
        platform: SetCredentials,
    },
}

/// Arguments for credentials validate
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Only check this platform
    #[arg(short, long, value_name = "NAME")]
    pub platform: Option<String>,
}

/// Per-platform credential shapes
#[derive(Subcommand, Debug)]
pub enum SetCredentials {
    /// OAuth client secrets for YouTube
    Youtube(YouTubeCredentialArgs),
    /// Browser cookies or an access token for TikTok
    Tiktok(TikTokCredentialArgs),
    /// Login for Instagram
    Instagram(InstagramCredentialArgs),
}

#[derive(Args, Debug)]
pub struct YouTubeCredentialArgs {
    /// client_secrets.json downloaded from the Google Cloud console
    #[arg(long, value_name = "FILE")]
    pub client_secrets: PathBuf,

    /// Where to keep the OAuth token (default: <app_dir>/yt_token.json)
    #[arg(long, value_name = "FILE")]
    pub token_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("auth").required(true).args(["cookies", "access_token"])))]
pub struct TikTokCredentialArgs {
    /// Cookies exported from a logged-in browser (cookies.txt or JSON)
    #[arg(long, value_name = "FILE")]
    pub cookies: Option<PathBuf>,

    /// Content Posting API access token
    #[arg(long, value_name = "TOKEN")]
    pub access_token: Option<String>,
}

#[derive(Args, Debug)]
pub struct InstagramCredentialArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub password: String,
}

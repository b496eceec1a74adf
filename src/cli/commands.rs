//! Command implementations

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use tracing::info;

use crate::app::{AppContainer, UploadRequest};
use crate::cli::args::{CredentialsCommand, SetCredentials, UploadArgs};
use crate::cli::Commands;
use crate::domain::model::{AggregateResult, CredentialBlob, PlatformId, SummaryKind};
use crate::engine::UploadEvent;

/// Execute a parsed command
pub async fn execute(container: &dyn AppContainer, command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Upload(args) => upload(container, args).await,
        Commands::Credentials { action } => credentials(container, action).await,
        Commands::Platforms => platforms(container),
    }
}

/// Execute the upload command
pub async fn upload(container: &dyn AppContainer, args: UploadArgs) -> Result<ExitCode> {
    let request = UploadRequest {
        video_path: args.video.to_string_lossy().to_string(),
        description: args.description,
        tags: args.tags,
        platforms: args.platforms,
    };

    let mut handle = container.upload_interactor().start(request).await?;
    info!(run_id = %handle.run_id(), "Upload started");

    // with --json stdout carries only the result document
    let mut out: Box<dyn Write> = if args.json {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };

    let mut result = None;
    while let Some(event) = handle.next_event().await {
        render_event(&event, &mut out)?;
        if let UploadEvent::Finished { result: finished } = event {
            result = Some(finished);
        }
    }
    let result = result.context("Upload run ended without a result")?;

    render_outcomes(&result, &mut out)?;
    out.flush()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(exit_code_for(&result))
}

/// Exit status: success when at least one platform succeeded
pub fn exit_code_for(result: &AggregateResult) -> ExitCode {
    match result.summary().kind {
        SummaryKind::AllSucceeded | SummaryKind::PartialSuccess => ExitCode::SUCCESS,
        SummaryKind::AllFailed | SummaryKind::NothingDispatched => ExitCode::FAILURE,
    }
}

/// Human-readable rendering of one event
pub fn render_event(event: &UploadEvent, out: &mut dyn Write) -> io::Result<()> {
    match event {
        UploadEvent::Log { message, .. } => writeln!(out, "{}", message),
        UploadEvent::Progress {
            percent,
            completed,
            total,
        } => writeln!(out, "[{:>3}%] {}/{} platform(s) finished", percent, completed, total),
        UploadEvent::Status { platform, status } => writeln!(out, "{}: {}", platform, status),
        UploadEvent::Finished { .. } => Ok(()),
    }
}

/// One line per platform with the payload id or the error
pub fn render_outcomes(result: &AggregateResult, out: &mut dyn Write) -> io::Result<()> {
    for (platform, outcome) in result.iter() {
        match (outcome.payload(), outcome.error_message()) {
            (Some(payload), _) => {
                let id = ["id", "publish_id", "code", "pk"]
                    .iter()
                    .find_map(|key| payload.as_value().get(*key))
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()));
                match id {
                    Some(id) => writeln!(out, "  {:<10} ok ({})", platform, id)?,
                    None => writeln!(out, "  {:<10} ok", platform)?,
                }
            }
            (None, Some(message)) => writeln!(out, "  {:<10} error: {}", platform, message)?,
            (None, None) => writeln!(out, "  {:<10} unknown", platform)?,
        }
    }
    Ok(())
}

/// Execute a credentials subcommand
pub async fn credentials(container: &dyn AppContainer, action: CredentialsCommand) -> Result<ExitCode> {
    let interactor = container.credentials_interactor();

    match action {
        CredentialsCommand::Show => {
            let masked = interactor.show().await?;
            println!("# {}", interactor.store_path());
            println!("{}", serde_json::to_string_pretty(&masked)?);
            Ok(ExitCode::SUCCESS)
        }
        CredentialsCommand::Validate(args) => {
            let checks = interactor.validate(args.platform.as_deref()).await?;
            let mut all_valid = true;
            for (platform, check) in &checks {
                all_valid &= check.valid;
                let verdict = if check.valid { "valid" } else { "invalid" };
                println!("{:<10} {:<8} {}", platform, verdict, check.message);
            }
            Ok(if all_valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        CredentialsCommand::Set { platform } => {
            let (platform, blob) = credential_blob(platform)?;
            interactor.set(platform.as_str(), blob).await?;
            println!("Saved {} credentials to {}", platform, interactor.store_path());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Build the stored blob for `credentials set`, with file paths made absolute
fn credential_blob(target: SetCredentials) -> Result<(PlatformId, CredentialBlob)> {
    let mut fields = Map::new();
    let platform = match target {
        SetCredentials::Youtube(args) => {
            let secrets = absolute(&args.client_secrets)?;
            if !secrets.is_file() {
                bail!("Client secrets file not found: {}", secrets.display());
            }
            fields.insert("client_secrets_file".into(), path_value(&secrets));
            if let Some(token_file) = args.token_file {
                fields.insert("token_file".into(), path_value(&absolute(&token_file)?));
            }
            PlatformId::youtube()
        }
        SetCredentials::Tiktok(args) => {
            if let Some(cookies) = args.cookies {
                let cookies = absolute(&cookies)?;
                if !cookies.is_file() {
                    bail!("Cookies file not found: {}", cookies.display());
                }
                fields.insert("cookies_file".into(), path_value(&cookies));
            }
            if let Some(token) = args.access_token {
                fields.insert("access_token".into(), Value::String(token));
            }
            PlatformId::tiktok()
        }
        SetCredentials::Instagram(args) => {
            fields.insert("username".into(), Value::String(args.username));
            fields.insert("password".into(), Value::String(args.password));
            PlatformId::instagram()
        }
    };
    Ok((platform, CredentialBlob::new(Value::Object(fields))))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Cannot determine the working directory")?;
    Ok(cwd.join(path))
}

fn path_value(path: &Path) -> Value {
    Value::String(path.to_string_lossy().to_string())
}

/// Execute the platforms command
pub fn platforms(container: &dyn AppContainer) -> Result<ExitCode> {
    for (platform, name) in container.upload_interactor().supported_platforms() {
        println!("{:<10} {}", platform, name);
    }
    Ok(ExitCode::SUCCESS)
}

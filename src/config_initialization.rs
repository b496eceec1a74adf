//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::adapters::toml_config::{keys, TomlConfigAdapter};
use crate::domain::errors::DomainError;
use crate::ports::{ConfigPort, LogLevel};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CROSSPOST_CONFIG";

/// Config file looked up in the working directory as a last resort
pub const LOCAL_CONFIG_FILE: &str = "crosspost.toml";

/// Environment variables and the config keys they override
const ENV_MAPPINGS: [(&str, &str); 12] = [
    ("CROSSPOST_LOG_LEVEL", keys::LOG_LEVEL),
    ("CROSSPOST_MAX_CONCURRENT", keys::MAX_CONCURRENT),
    ("CROSSPOST_APP_DIR", keys::APP_DIR),
    ("CROSSPOST_REQUEST_TIMEOUT_SECS", keys::REQUEST_TIMEOUT_SECS),
    ("CROSSPOST_UPLOAD_CHUNK_SIZE", keys::UPLOAD_CHUNK_SIZE),
    ("CROSSPOST_YOUTUBE_PRIVACY_STATUS", keys::YOUTUBE_PRIVACY_STATUS),
    ("CROSSPOST_YOUTUBE_UPLOAD_BASE", keys::YOUTUBE_UPLOAD_BASE),
    ("CROSSPOST_GOOGLE_AUTH_URL", keys::GOOGLE_AUTH_URL),
    ("CROSSPOST_GOOGLE_TOKEN_URL", keys::GOOGLE_TOKEN_URL),
    ("CROSSPOST_TIKTOK_API_BASE", keys::TIKTOK_API_BASE),
    ("CROSSPOST_INSTAGRAM_API_BASE", keys::INSTAGRAM_API_BASE),
    ("CROSSPOST_INSTAGRAM_UPLOAD_BASE", keys::INSTAGRAM_UPLOAD_BASE),
];

/// Settings given on the command line; they win over every other source
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub max_concurrent: Option<usize>,
    pub app_dir: Option<PathBuf>,
}

/// Fully resolved, typed configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub log_level: LogLevel,
    pub max_concurrent: usize,
    pub app_dir: PathBuf,
    pub request_timeout: Duration,
    pub upload_chunk_size: usize,
    pub youtube_privacy_status: String,
    pub youtube_upload_base: String,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub tiktok_api_base: String,
    pub instagram_api_base: String,
    pub instagram_upload_base: String,
    /// Config file that was loaded, if any
    pub config_file: Option<PathBuf>,
}

impl AppSettings {
    /// Read a validated config into typed settings
    pub async fn from_config(config: &dyn ConfigPort) -> Result<Self, DomainError> {
        Ok(Self {
            log_level: LogLevel::parse(&required(config, keys::LOG_LEVEL).await?)?,
            max_concurrent: number(config, keys::MAX_CONCURRENT).await? as usize,
            app_dir: expand_home(required(config, keys::APP_DIR).await?.trim()),
            request_timeout: Duration::from_secs(number(config, keys::REQUEST_TIMEOUT_SECS).await?),
            upload_chunk_size: number(config, keys::UPLOAD_CHUNK_SIZE).await? as usize,
            youtube_privacy_status: required(config, keys::YOUTUBE_PRIVACY_STATUS).await?,
            youtube_upload_base: trim_url(required(config, keys::YOUTUBE_UPLOAD_BASE).await?),
            google_auth_url: required(config, keys::GOOGLE_AUTH_URL).await?,
            google_token_url: required(config, keys::GOOGLE_TOKEN_URL).await?,
            tiktok_api_base: trim_url(required(config, keys::TIKTOK_API_BASE).await?),
            instagram_api_base: trim_url(required(config, keys::INSTAGRAM_API_BASE).await?),
            instagram_upload_base: trim_url(required(config, keys::INSTAGRAM_UPLOAD_BASE).await?),
            config_file: None,
        })
    }

    /// `<app_dir>/creds.json`
    pub fn credentials_file(&self) -> PathBuf {
        self.app_dir.join(crate::adapters::json_credentials::CREDENTIALS_FILE)
    }

    /// `<app_dir>/yt_token.json`
    pub fn youtube_token_file(&self) -> PathBuf {
        self.app_dir.join("yt_token.json")
    }

    /// `<app_dir>/session.json`
    pub fn instagram_session_file(&self) -> PathBuf {
        self.app_dir.join("session.json")
    }
}

async fn required(config: &dyn ConfigPort, key: &str) -> Result<String, DomainError> {
    config
        .get_config(key)
        .await?
        .ok_or_else(|| DomainError::ConfigError(format!("Missing config key: {}", key)))
}

async fn number(config: &dyn ConfigPort, key: &str) -> Result<u64, DomainError> {
    required(config, key)
        .await?
        .trim()
        .parse::<u64>()
        .map_err(|e| DomainError::ConfigError(format!("Invalid value for {}: {}", key, e)))
}

fn trim_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with(['/', '\\']) => {
            home.join(rest.trim_start_matches(['/', '\\']))
        }
        _ => PathBuf::from(path),
    }
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub async fn initialize_configuration_hierarchy(overrides: &CliOverrides) -> Result<AppSettings> {
    let config = TomlConfigAdapter::new();
    resolve_settings(&config, overrides, |name| std::env::var(name).ok()).await
}

/// Apply file, environment and CLI layers on top of the defaults held by `config`
pub async fn resolve_settings<E>(config: &dyn ConfigPort, overrides: &CliOverrides, env: E) -> Result<AppSettings>
where
    E: Fn(&str) -> Option<String>,
{
    // Step 1: defaults come with the adapter
    // Step 2: config file
    let config_file = locate_config_file(overrides.config_file.as_deref(), &env)?;
    if let Some(path) = &config_file {
        config
            .load_config(&path.to_string_lossy())
            .await
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
    }

    // Step 3: environment
    load_environment_variables(config, &env).await?;

    // Step 4: command line
    apply_cli_configuration_overrides(config, overrides).await?;

    config.validate_config().await.context("Invalid configuration")?;
    let mut settings = AppSettings::from_config(config)
        .await
        .context("Invalid configuration")?;
    settings.config_file = config_file;
    Ok(settings)
}

/// First config file found: explicit path, `$CROSSPOST_CONFIG`, user config dir, working dir
fn locate_config_file<E>(explicit: Option<&Path>, env: &E) -> Result<Option<PathBuf>>
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("Config file does not exist: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Some(path) = env(CONFIG_ENV_VAR).filter(|p| !p.trim().is_empty()) {
        let path = PathBuf::from(path);
        if !path.is_file() {
            bail!("{} points to a missing file: {}", CONFIG_ENV_VAR, path.display());
        }
        return Ok(Some(path));
    }

    let candidates = [
        TomlConfigAdapter::get_default_config_path(),
        PathBuf::from(LOCAL_CONFIG_FILE),
    ];
    Ok(candidates.into_iter().find(|p| p.is_file()))
}

/// Load environment variables and apply to configuration
async fn load_environment_variables<E>(config: &dyn ConfigPort, env: &E) -> Result<()>
where
    E: Fn(&str) -> Option<String>,
{
    for (env_var, config_key) in ENV_MAPPINGS {
        if let Some(value) = env(env_var) {
            debug!("Environment override: {} from {}", config_key, env_var);
            config.set_config(config_key, &value).await?;
        }
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
async fn apply_cli_configuration_overrides(config: &dyn ConfigPort, overrides: &CliOverrides) -> Result<()> {
    if let Some(level) = &overrides.log_level {
        config.set_config(keys::LOG_LEVEL, level).await?;
    }
    if let Some(max_concurrent) = overrides.max_concurrent {
        config
            .set_config(keys::MAX_CONCURRENT, &max_concurrent.to_string())
            .await?;
    }
    if let Some(app_dir) = &overrides.app_dir {
        config
            .set_config(keys::APP_DIR, &app_dir.to_string_lossy())
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, format!("[crosspost]\n{}", body)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_precedence_cli_over_env_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "max_concurrent = 5\nlog_level = \"warn\"\nyoutube_privacy_status = \"unlisted\"\n",
        );
        let overrides = CliOverrides {
            config_file: Some(path.clone()),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        let env = env_from(&[("CROSSPOST_MAX_CONCURRENT", "7"), ("CROSSPOST_LOG_LEVEL", "error")]);

        let settings = resolve_settings(&TomlConfigAdapter::new(), &overrides, env)
            .await
            .unwrap();

        assert_eq!(settings.log_level, LogLevel::Debug);
        assert_eq!(settings.max_concurrent, 7);
        assert_eq!(settings.youtube_privacy_status, "unlisted");
        assert_eq!(settings.config_file, Some(path));
    }

    #[tokio::test]
    async fn test_config_file_from_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "tiktok_api_base = \"http://127.0.0.1:8080/\"\n");
        let env = env_from(&[(CONFIG_ENV_VAR, path.to_str().unwrap())]);

        let settings = resolve_settings(&TomlConfigAdapter::new(), &CliOverrides::default(), env)
            .await
            .unwrap();
        assert_eq!(settings.tiktok_api_base, "http://127.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_an_error() {
        let overrides = CliOverrides {
            config_file: Some(PathBuf::from("/no/such/crosspost.toml")),
            ..Default::default()
        };
        let err = resolve_settings(&TomlConfigAdapter::new(), &overrides, env_from(&[]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_invalid_values_fail_validation() {
        let overrides = CliOverrides {
            max_concurrent: Some(0),
            config_file: None,
            ..Default::default()
        };
        let env = env_from(&[(CONFIG_ENV_VAR, "")]);
        assert!(resolve_settings(&TomlConfigAdapter::new(), &overrides, env)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_app_dir_paths() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = CliOverrides {
            app_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let settings = resolve_settings(&TomlConfigAdapter::new(), &overrides, env_from(&[]))
            .await
            .unwrap();

        assert_eq!(settings.credentials_file(), dir.path().join("creds.json"));
        assert_eq!(settings.youtube_token_file(), dir.path().join("yt_token.json"));
        assert_eq!(settings.instagram_session_file(), dir.path().join("session.json"));
        assert_eq!(settings.request_timeout, Duration::from_secs(300));
        assert_eq!(settings.upload_chunk_size, 1024 * 1024);
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/dir"), PathBuf::from("/abs/dir"));
        assert_eq!(expand_home("~user/dir"), PathBuf::from("~user/dir"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.video_uploader"), home.join(".video_uploader"));
            assert_eq!(expand_home("~"), home);
        }
    }
}

//! Configuration for codehub.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CODEHUB_HOME, CODEHUB_API_URL, CODEHUB_CLIENT_ID)
//! 2. Config file (.codehub/config.yaml)
//! 3. Defaults (~/.codehub, api.github.com)
//!
//! Config file discovery:
//! - Searches current directory and parents for .codehub/config.yaml
//! - A relative `paths.home` is resolved against the .codehub/ directory

pub mod paths;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_CLIENT_ID: &str = "Ov23livPRlJDBsv27Jei";
pub const DEFAULT_DEVICE_CODE_URL: &str = "https://github.com/login/device/code";
pub const DEFAULT_ACCESS_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub github: Option<GitHubConfig>,
    #[serde(default)]
    pub oauth: Option<OAuthConfig>,
    #[serde(default)]
    pub upload: Option<UploadConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to the .codehub/ directory)
    pub home: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    pub client_id: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub device_code_url: Option<String>,
    pub access_token_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub poll_interval_ms: Option<u64>,
    pub poll_attempts: Option<u32>,
    pub conflict_backoff_ms: Option<u64>,
}

/// OAuth app settings for the device flow
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub scopes: Vec<String>,
    pub device_code_url: String,
    pub access_token_url: String,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            scopes: vec!["repo".to_string()],
            device_code_url: DEFAULT_DEVICE_CODE_URL.to_string(),
            access_token_url: DEFAULT_ACCESS_TOKEN_URL.to_string(),
        }
    }
}

/// Timing for submission polling and conflict handling
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub poll_interval_ms: u64,
    pub poll_attempts: u32,
    pub conflict_backoff_ms: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            poll_attempts: 10,
            conflict_backoff_ms: 500,
        }
    }
}

impl UploadSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Pause before a write that follows a conflict or a fresh create
    pub fn conflict_backoff(&self) -> Duration {
        Duration::from_millis(self.conflict_backoff_ms)
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to codehub home (local state)
    pub home: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// GitHub REST base URL
    pub api_url: String,
    pub oauth: OAuthSettings,
    pub upload: UploadSettings,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".codehub").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Combine an optional config file with defaults, before env overrides
fn resolve(config_path: Option<&Path>, file: Option<ConfigFile>, default_home: PathBuf) -> ResolvedConfig {
    let Some(file) = file else {
        return ResolvedConfig {
            home: default_home,
            config_file: None,
            api_url: DEFAULT_API_URL.to_string(),
            oauth: OAuthSettings::default(),
            upload: UploadSettings::default(),
        };
    };

    let home = match (&file.paths.home, config_path) {
        (Some(home_path), Some(config_path)) => {
            let codehub_dir = config_path.parent().unwrap_or(Path::new("."));
            resolve_path(codehub_dir, home_path)
        }
        _ => default_home,
    };

    let api_url = file
        .github
        .as_ref()
        .and_then(|g| g.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let defaults = OAuthSettings::default();
    let oauth = match file.oauth {
        Some(o) => OAuthSettings {
            client_id: o.client_id.unwrap_or(defaults.client_id),
            scopes: o.scopes.unwrap_or(defaults.scopes),
            device_code_url: o.device_code_url.unwrap_or(defaults.device_code_url),
            access_token_url: o.access_token_url.unwrap_or(defaults.access_token_url),
        },
        None => defaults,
    };

    let defaults = UploadSettings::default();
    let upload = match file.upload {
        Some(u) => UploadSettings {
            poll_interval_ms: u.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
            poll_attempts: u.poll_attempts.unwrap_or(defaults.poll_attempts),
            conflict_backoff_ms: u.conflict_backoff_ms.unwrap_or(defaults.conflict_backoff_ms),
        },
        None => defaults,
    };

    ResolvedConfig {
        home,
        config_file: config_path.map(Path::to_path_buf),
        api_url,
        oauth,
        upload,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".codehub");

    let config_file = find_config_file();
    let file = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    let mut config = resolve(config_file.as_deref(), file, default_home);

    if let Ok(home) = std::env::var("CODEHUB_HOME") {
        config.home = PathBuf::from(home);
    }
    if let Ok(api_url) = std::env::var("CODEHUB_API_URL") {
        config.api_url = api_url;
    }
    if let Ok(client_id) = std::env::var("CODEHUB_CLIENT_ID") {
        config.oauth.client_id = client_id;
    }

    Ok(config)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Get the codehub home directory (local state).
pub fn codehub_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

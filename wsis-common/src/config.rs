//! Configuration resolution
//!
//! All configuration is resolved exactly once at startup into an immutable
//! [`AppConfig`] that is threaded to every component. Per-value priority:
//!
//! 1. Command-line argument (highest)
//! 2. Environment variable (`WSIS_*`)
//! 3. TOML config file (`~/.config/wsis/config.toml`, or `/etc/wsis/config.toml`)
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Default application identifier (namespace segment)
pub const DEFAULT_APP_ID: &str = "safety-check-demo-v1";

/// Default listen address
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5731";

/// Database file name within the root folder
const DATABASE_FILE: &str = "wsis.db";

/// Resolved, immutable application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Data root folder; the SQLite database lives here
    pub root_folder: PathBuf,
    /// Listen address for the HTTP server
    pub bind_address: String,
    /// Sanitized application identifier used as a namespace segment
    pub app_id: String,
    /// Optional bootstrap auth token; absent means anonymous sign-in
    pub bootstrap_token: Option<String>,
}

/// Values supplied on the command line (all optional)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub app_id: Option<String>,
    pub bootstrap_token: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from overrides, environment, config file and defaults
    pub fn resolve(overrides: ConfigOverrides) -> Result<AppConfig> {
        let file = load_config_file()?;

        let root_folder = overrides
            .root_folder
            .or_else(|| std::env::var("WSIS_ROOT_FOLDER").ok().map(PathBuf::from))
            .or_else(|| file.root_folder.clone().map(PathBuf::from))
            .unwrap_or_else(default_root_folder);

        let bind_address = overrides
            .bind_address
            .or_else(|| std::env::var("WSIS_BIND_ADDRESS").ok())
            .or_else(|| file.bind_address.clone())
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let raw_app_id = overrides
            .app_id
            .or_else(|| std::env::var("WSIS_APP_ID").ok())
            .or_else(|| file.app_id.clone())
            .unwrap_or_else(|| DEFAULT_APP_ID.to_string());

        let bootstrap_token = overrides
            .bootstrap_token
            .or_else(|| std::env::var("WSIS_BOOTSTRAP_TOKEN").ok())
            .or_else(|| file.bootstrap_token.clone())
            .filter(|t| !t.trim().is_empty());

        // Placeholder credentials are a configuration error, not an auth error:
        // fail startup instead of signing in with a template value.
        if let Some(token) = &bootstrap_token {
            if token.starts_with("YOUR_") {
                return Err(Error::Config(format!(
                    "bootstrap token is a placeholder value: {}",
                    token
                )));
            }
        }

        Ok(AppConfig {
            root_folder,
            bind_address,
            app_id: sanitize_app_id(&raw_app_id),
            bootstrap_token,
        })
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// Restrict the application id to characters safe in a namespace segment.
/// Anything outside `[A-Za-z0-9_-]` becomes an underscore; an id that
/// sanitizes to nothing falls back to the default.
pub fn sanitize_app_id(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        DEFAULT_APP_ID.to_string()
    } else {
        cleaned
    }
}

/// Optional values read from the TOML config file
#[derive(Debug, Clone, Default, serde::Deserialize)]
struct FileConfig {
    root_folder: Option<String>,
    bind_address: Option<String>,
    app_id: Option<String>,
    bootstrap_token: Option<String>,
}

fn load_config_file() -> Result<FileConfig> {
    let Some(path) = find_config_file() else {
        return Ok(FileConfig::default());
    };
    parse_config_file(&path)
}

fn parse_config_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("invalid config file {}: {}", path.display(), e)))
}

fn find_config_file() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join("wsis").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }
    let system_config = PathBuf::from("/etc/wsis/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }
    None
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("wsis"))
        .unwrap_or_else(|| PathBuf::from("./wsis_data"))
}

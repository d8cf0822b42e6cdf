//! Configuration management for Feather.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::logging::DEFAULT_FILTER;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Developer tokens accepted when no other source is configured.
///
/// These ship inside the binary and can be recovered from it. Hosts that
/// care should replace them through `[auth].developer_tokens` or
/// `FEATHER_DEVELOPER_TOKENS`.
pub const DEFAULT_DEVELOPER_TOKENS: &[&str] = &[
    "FEATHER-DEV-2024-ALPHA",
    "FEATHER-DEV-2024-BETA",
    "FEATHER-INTERNAL-QA",
];

/// Main application configuration.
///
/// This is loaded from `~/.config/feather/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Developer-mode authentication settings
    pub auth: AuthConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `FEATHER_SESSION_TIMEOUT_SECS`: Override the developer-mode session timeout
    /// - `FEATHER_DEVELOPER_TOKENS`: Comma-separated developer token allow-list
    /// - `FEATHER_LOG`: Override the tracing filter
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `FEATHER_*` environment overrides in place.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("FEATHER_SESSION_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.auth.session_timeout_secs = secs;
                tracing::debug!("Override session_timeout_secs from env: {}", secs);
            }
        }

        if let Ok(val) = std::env::var("FEATHER_DEVELOPER_TOKENS") {
            let tokens: Vec<String> = val
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            if !tokens.is_empty() {
                tracing::debug!("Override developer_tokens from env ({} entries)", tokens.len());
                self.auth.developer_tokens = tokens;
            }
        }

        if let Ok(val) = std::env::var("FEATHER_LOG") {
            self.logging.filter = val;
        }
    }

    /// Check that values are usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.auth.session_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "auth.session_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.auth.min_passcode_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "auth.min_passcode_length".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path.parent().ok_or_else(|| ConfigError::InvalidValue {
            field: "config_path".to_string(),
            reason: "no parent directory".to_string(),
        })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/feather/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/feather`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("com", "feather", "feather").ok_or(ConfigError::NoConfigDir)
}

/// Developer-mode authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Seconds an authenticated session stays valid
    pub session_timeout_secs: u64,
    /// Minimum passcode length in characters
    pub min_passcode_length: usize,
    /// Credential store service name for the passcode hash
    pub keychain_service: String,
    /// Credential store account name for the passcode hash
    pub keychain_account: String,
    /// Key used for the cached developer token
    pub token_cache_key: String,
    /// Prompt shown by the platform biometric dialog
    pub biometric_reason: String,
    /// Accepted developer tokens
    pub developer_tokens: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: 300,
            min_passcode_length: 6,
            keychain_service: "com.feather.developer-mode".to_string(),
            keychain_account: "passcode".to_string(),
            token_cache_key: "feather.developer_token".to_string(),
            biometric_reason: "Authenticate to access Developer Mode".to_string(),
            developer_tokens: DEFAULT_DEVELOPER_TOKENS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive string
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

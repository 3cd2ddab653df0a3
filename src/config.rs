//! Configuration management for edclub-enricher.
//!
//! All configuration is loaded from `./config/edclub-enricher.toml`.
//! No hardcoded defaults exist in source code - all defaults are in the
//! config template. Remote-store credentials are the exception: they come
//! from the `SUPABASE_URL` / `SUPABASE_KEY` environment variables only.

use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration file path relative to working directory
pub const CONFIG_PATH: &str = "./config/edclub-enricher.toml";

/// Default configuration file content - this is the ONLY place defaults exist
pub const DEFAULT_CONFIG: &str = include_str!("../config/edclub-enricher.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid URL in '{field}': {url}")]
    InvalidUrl { field: String, url: String },

    #[error("Configuration field '{field}' cannot be empty")]
    EmptyRequired { field: String },

    #[error("Configuration field '{field}' must be greater than zero")]
    ZeroValue { field: String },
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub domains: DomainsConfig,
    pub store: StoreConfig,
    pub source: SourceConfig,
    pub phases: PhasesConfig,
    pub wayback: WaybackConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Timeout for tenant page fetches (name resolution).
    pub page_timeout_secs: u64,
    /// Timeout for liveness probes.
    pub probe_timeout_secs: u64,
}

/// The two candidate hosting domains a tenant site may answer under.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainsConfig {
    pub primary: String,
    pub secondary: String,
}

/// File-mode record store location
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
}

/// Subdomain source-list configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Subdomains that are infrastructure, not customer tenants.
    #[serde(default)]
    pub denylist: Vec<String>,
}

/// Per-phase window sizing for the batch driver
#[derive(Debug, Clone, Deserialize)]
pub struct PhasesConfig {
    pub names: PhaseConfig,
    pub validate: PhaseConfig,
    pub wayback: PhaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhaseConfig {
    /// Records processed concurrently per window.
    pub window_size: usize,
    /// Sleep between windows.
    pub window_delay_ms: u64,
}

impl PhaseConfig {
    pub fn window_delay(&self) -> Duration {
        Duration::from_millis(self.window_delay_ms)
    }
}

/// Archive snapshot-index configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WaybackConfig {
    pub endpoint: String,
    pub request_timeout_secs: u64,
    /// Retry budget for rate-limited lookups.
    pub max_attempts: u32,
    /// Base backoff after a 429; grows linearly per attempt.
    pub rate_limit_backoff_secs: u64,
}

/// Headless-browser name-resolution strategy
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Settle time after navigation before reading the rendered DOM.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_browser_window")]
    pub window_size: usize,
}

fn default_settle_ms() -> u64 {
    3000
}

fn default_browser_window() -> usize {
    3
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            window_size: default_browser_window(),
        }
    }
}

/// Long-running worker pacing
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_validate_delay_ms")]
    pub validate_delay_ms: u64,
    #[serde(default = "default_wayback_delay_ms")]
    pub wayback_delay_ms: u64,
    #[serde(default = "default_idle_sleep_secs")]
    pub idle_sleep_secs: u64,
}

fn default_validate_delay_ms() -> u64 {
    500
}

fn default_wayback_delay_ms() -> u64 {
    2000
}

fn default_idle_sleep_secs() -> u64 {
    3600
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            validate_delay_ms: default_validate_delay_ms(),
            wayback_delay_ms: default_wayback_delay_ms(),
            idle_sleep_secs: default_idle_sleep_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(Path::new(CONFIG_PATH))
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.user_agent.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "http.user_agent".to_string(),
            });
        }
        if self.http.page_timeout_secs == 0 {
            return Err(ConfigError::ZeroValue {
                field: "http.page_timeout_secs".to_string(),
            });
        }
        if self.http.probe_timeout_secs == 0 {
            return Err(ConfigError::ZeroValue {
                field: "http.probe_timeout_secs".to_string(),
            });
        }

        if self.domains.primary.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "domains.primary".to_string(),
            });
        }
        if self.domains.secondary.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "domains.secondary".to_string(),
            });
        }

        if !self.wayback.endpoint.starts_with("http://") && !self.wayback.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidUrl {
                field: "wayback.endpoint".to_string(),
                url: self.wayback.endpoint.clone(),
            });
        }
        if self.wayback.max_attempts == 0 {
            return Err(ConfigError::ZeroValue {
                field: "wayback.max_attempts".to_string(),
            });
        }

        for (name, phase) in [
            ("phases.names", &self.phases.names),
            ("phases.validate", &self.phases.validate),
            ("phases.wayback", &self.phases.wayback),
        ] {
            if phase.window_size == 0 {
                return Err(ConfigError::ZeroValue {
                    field: format!("{}.window_size", name),
                });
            }
        }

        Ok(())
    }

    /// Create default configuration file at the standard location
    pub fn create_default_config() -> Result<PathBuf, ConfigError> {
        let path = Path::new(CONFIG_PATH);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_CONFIG.as_bytes())?;

        Ok(path.to_path_buf())
    }

    /// Check if stdin is a TTY (interactive terminal)
    pub fn is_interactive() -> bool {
        atty::is(atty::Stream::Stdin)
    }

    /// Prompt user to create default config (only in interactive mode)
    pub fn prompt_create_config() -> Result<Option<PathBuf>, ConfigError> {
        if !Self::is_interactive() {
            return Ok(None);
        }

        print!("Configuration file not found. Create default config? [Y/n] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input.is_empty() || input == "y" || input == "yes" {
            let path = Self::create_default_config()?;
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }
}

//! Configuration management for the `TravelBook` service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TravelBookError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Legacy variable names for the Amadeus credentials
const AMADEUS_KEY_VAR: &str = "AMADEUS_API_KEY";
const AMADEUS_SECRET_VAR: &str = "AMADEUS_API_SECRET";

/// Root configuration structure for the `TravelBook` service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TravelBookConfig {
    /// Amadeus API configuration
    #[serde(default)]
    pub amadeus: AmadeusConfig,
    /// Hotel resolution pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP API settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Amadeus API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmadeusConfig {
    /// Base URL for the Amadeus self-service APIs
    #[serde(default = "default_amadeus_base_url")]
    pub base_url: String,
    /// OAuth client id (the "API key" in the Amadeus console)
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_amadeus_timeout")]
    pub timeout_seconds: u32,
    /// Transient-failure retries performed by the HTTP transport
    #[serde(default)]
    pub max_retries: u32,
}

/// Hotel resolution pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Deadline applied to every collaborator call
    #[serde(default = "default_call_timeout")]
    pub call_timeout_seconds: u32,
    /// Offer batches allowed in flight at once; 1 keeps lookups sequential
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,
}

// Default value functions
fn default_amadeus_base_url() -> String {
    "https://test.api.amadeus.com".to_string()
}

fn default_amadeus_timeout() -> u32 {
    30
}

fn default_call_timeout() -> u32 {
    30
}

fn default_max_concurrent_batches() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for AmadeusConfig {
    fn default() -> Self {
        Self {
            base_url: default_amadeus_base_url(),
            client_id: None,
            client_secret: None,
            timeout_seconds: default_amadeus_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            call_timeout_seconds: default_call_timeout(),
            max_concurrent_batches: default_max_concurrent_batches(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

impl AmadeusConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }

    /// Whether both halves of the client-credentials pair are present
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds.into())
    }
}

impl TravelBookConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(Self::resolve_config_path);

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides, e.g. TRAVELBOOK_AMADEUS__CLIENT_ID
        builder = builder.add_source(
            Environment::with_prefix("TRAVELBOOK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TravelBookConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_legacy_credentials();

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("travelbook").join("config.toml"))
    }

    /// The file `load()` reads when no explicit path is given
    #[must_use]
    pub fn resolve_config_path() -> PathBuf {
        Self::get_config_path()
            .filter(|path| path.exists())
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Fill missing credentials from `AMADEUS_API_KEY` / `AMADEUS_API_SECRET`
    pub fn apply_legacy_credentials(&mut self) {
        if self.amadeus.client_id.is_none() {
            self.amadeus.client_id = std::env::var(AMADEUS_KEY_VAR).ok();
        }
        if self.amadeus.client_secret.is_none() {
            self.amadeus.client_secret = std::env::var(AMADEUS_SECRET_VAR).ok();
        }
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.amadeus.base_url.is_empty() {
            self.amadeus.base_url = default_amadeus_base_url();
        }
        self.amadeus.base_url = self.amadeus.base_url.trim_end_matches('/').to_string();
        if self.amadeus.timeout_seconds == 0 {
            self.amadeus.timeout_seconds = default_amadeus_timeout();
        }
        if self.pipeline.call_timeout_seconds == 0 {
            self.pipeline.call_timeout_seconds = default_call_timeout();
        }
        if self.pipeline.max_concurrent_batches == 0 {
            self.pipeline.max_concurrent_batches = default_max_concurrent_batches();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.port == 0 {
            self.server.port = default_server_port();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    ///
    /// Credentials stay optional at load time; the token provider reports
    /// their absence when a search actually needs them.
    pub fn validate_api_keys(&self) -> Result<()> {
        let fields = [
            ("client id", &self.amadeus.client_id),
            ("client secret", &self.amadeus.client_secret),
        ];

        for (label, value) in fields {
            if value.as_ref().is_some_and(|v| v.trim().is_empty()) {
                return Err(TravelBookError::config(format!(
                    "Amadeus {label} cannot be empty if provided. Either remove it or provide a valid value."
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.amadeus.timeout_seconds > 300 {
            return Err(
                TravelBookError::config("Amadeus API timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.amadeus.max_retries > 10 {
            return Err(TravelBookError::config("Amadeus API max retries cannot exceed 10").into());
        }

        if self.pipeline.call_timeout_seconds > 300 {
            return Err(
                TravelBookError::config("Pipeline call timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.pipeline.max_concurrent_batches > 16 {
            return Err(TravelBookError::config(
                "Pipeline max concurrent batches cannot exceed 16",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TravelBookError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TravelBookError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.amadeus.base_url.starts_with("http://")
            && !self.amadeus.base_url.starts_with("https://")
        {
            return Err(TravelBookError::config(
                "Amadeus base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}

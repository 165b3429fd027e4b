//! Configuration management for the City Explorer backend
//!
//! Handles loading configuration from a TOML file, environment variables and
//! the plain `.env` style variable names (`PORT`, `*_API_KEY`), and validates
//! the result.

use crate::ExplorerError;
use crate::providers::ApiKey;
use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable pointing at the configuration file
pub const CONFIG_PATH_ENV: &str = "CITY_EXPLORER_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Place store settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Settings shared by all outbound calls
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Per-provider endpoints and credentials
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory with the static front end and `404.html`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `sqlite` or `memory`
    #[serde(default = "default_database_backend")]
    pub backend: String,
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_geocode_provider")]
    pub geocode: ProviderConfig,
    #[serde(default = "default_weather_provider")]
    pub weather: ProviderConfig,
    #[serde(default = "default_trails_provider")]
    pub trails: ProviderConfig,
    #[serde(default = "default_events_provider")]
    pub events: ProviderConfig,
}

/// Endpoint and credential of one upstream provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Filled in by [`ExplorerConfig::apply_defaults`] when only the key is set
    #[serde(default)]
    pub base_url: String,
    pub api_key: Option<ApiKey>,
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

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_database_backend() -> String {
    "sqlite".to_string()
}

fn default_database_path() -> String {
    "data/places.db".to_string()
}

fn default_upstream_timeout() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("CityExplorer/{}", crate::VERSION)
}

fn default_geocode_base_url() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.darksky.net/forecast".to_string()
}

fn default_trails_base_url() -> String {
    "https://www.hikingproject.com/data/get-trails".to_string()
}

fn default_events_base_url() -> String {
    "https://www.eventbriteapi.com/v3/events/search/".to_string()
}

fn provider_with(base_url: String) -> ProviderConfig {
    ProviderConfig {
        base_url,
        api_key: None,
    }
}

fn default_geocode_provider() -> ProviderConfig {
    provider_with(default_geocode_base_url())
}

fn default_weather_provider() -> ProviderConfig {
    provider_with(default_weather_base_url())
}

fn default_trails_provider() -> ProviderConfig {
    provider_with(default_trails_base_url())
}

fn default_events_provider() -> ProviderConfig {
    provider_with(default_events_base_url())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_database_backend(),
            path: default_database_path(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_upstream_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            geocode: default_geocode_provider(),
            weather: default_weather_provider(),
            trails: default_trails_provider(),
            events: default_events_provider(),
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

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            upstream: UpstreamConfig::default(),
            providers: ProvidersConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Unprefixed variables mapped onto their configuration keys
const LEGACY_ENV_OVERRIDES: [(&str, &str); 5] = [
    ("PORT", "server.port"),
    ("GEOCODE_API_KEY", "providers.geocode.api_key"),
    ("WEATHER_API_KEY", "providers.weather.api_key"),
    ("TRAIL_API_KEY", "providers.trails.api_key"),
    ("EVENTBRITE_API_KEY", "providers.events.api_key"),
];

impl ExplorerConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        Self::load_from_path(path)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        Self::load_with_env(config_path, std::env::vars().collect())
    }

    /// Load configuration from specified path, reading variables from `env`
    /// instead of the process environment
    pub fn load_with_env(config_path: Option<PathBuf>, env: Map<String, String>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| PathBuf::from("config/default.toml"));

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // CITY_EXPLORER_PROVIDERS__GEOCODE__API_KEY and friends. Values stay
        // strings so keys like "0123" are kept verbatim.
        let legacy: Vec<_> = LEGACY_ENV_OVERRIDES
            .iter()
            .map(|(variable, key)| (*variable, *key, env.get(*variable).cloned()))
            .collect();
        builder = builder.add_source(
            Environment::with_prefix("CITY_EXPLORER")
                .prefix_separator("_")
                .separator("__")
                .source(Some(env)),
        );

        for (variable, key, value) in legacy {
            builder = builder
                .set_override_option(key, value)
                .with_context(|| format!("Failed to apply {variable}"))?;
        }

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: ExplorerConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.static_dir.is_empty() {
            self.server.static_dir = default_static_dir();
        }
        if self.database.backend.is_empty() {
            self.database.backend = default_database_backend();
        }
        if self.database.path.is_empty() {
            self.database.path = default_database_path();
        }
        if self.upstream.timeout_seconds == 0 {
            self.upstream.timeout_seconds = default_upstream_timeout();
        }
        if self.upstream.user_agent.is_empty() {
            self.upstream.user_agent = default_user_agent();
        }
        if self.providers.geocode.base_url.is_empty() {
            self.providers.geocode.base_url = default_geocode_base_url();
        }
        if self.providers.weather.base_url.is_empty() {
            self.providers.weather.base_url = default_weather_base_url();
        }
        if self.providers.trails.base_url.is_empty() {
            self.providers.trails.base_url = default_trails_base_url();
        }
        if self.providers.events.base_url.is_empty() {
            self.providers.events.base_url = default_events_base_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Names of providers that have no API key configured
    #[must_use]
    pub fn missing_api_keys(&self) -> Vec<&'static str> {
        self.providers
            .iter()
            .filter(|(_, provider)| provider.api_key.is_none())
            .map(|(name, _)| name)
            .collect()
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ExplorerError::config("Server port cannot be 0").into());
        }

        if self.upstream.timeout_seconds > 120 {
            return Err(
                ExplorerError::config("Upstream timeout cannot exceed 120 seconds").into(),
            );
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ExplorerError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(ExplorerError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_backends = ["sqlite", "memory"];
        if !valid_backends.contains(&self.database.backend.as_str()) {
            return Err(ExplorerError::config(format!(
                "Invalid database backend '{}'. Must be one of: {}",
                self.database.backend,
                valid_backends.join(", ")
            ))
            .into());
        }

        for (name, provider) in self.providers.iter() {
            if !provider.base_url.starts_with("http://")
                && !provider.base_url.starts_with("https://")
            {
                return Err(ExplorerError::config(format!(
                    "Base URL of provider '{name}' must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

impl ProvidersConfig {
    /// Iterate providers together with their names
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ProviderConfig)> {
        [
            ("geocode", &self.geocode),
            ("weather", &self.weather),
            ("trails", &self.trails),
            ("events", &self.events),
        ]
        .into_iter()
    }
}

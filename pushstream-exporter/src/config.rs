//! Configuration for the push stream exporter.

use pushstream_common::{Catalog, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// HTTP endpoint settings.
    #[serde(default)]
    pub web: WebConfig,

    /// Upstream push stream module settings.
    #[serde(default)]
    pub nginx: NginxConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Address to listen on (default: "0.0.0.0:9101").
    ///
    /// A bare `:port` listens on all interfaces.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Path under which metrics are exposed (default: "/metrics").
    #[serde(default = "default_telemetry_path")]
    pub telemetry_path: String,
}

fn default_listen_address() -> String {
    "0.0.0.0:9101".to_string()
}

fn default_telemetry_path() -> String {
    "/metrics".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            telemetry_path: default_telemetry_path(),
        }
    }
}

impl WebConfig {
    /// Parse the listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = match self.listen_address.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => self.listen_address.clone(),
        };

        addr.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.listen_address
            ))
        })
    }
}

/// Upstream push stream module configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NginxConfig {
    /// URI of the `channels-stats` location.
    #[serde(default = "default_scrape_uri")]
    pub scrape_uri: String,

    /// Comma-separated metric keys to export (default: all of them).
    #[serde(default)]
    pub metric_fields: Option<String>,

    /// Fetch timeout as a duration string (default: "5s").
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Metric name prefix (default: "nginx").
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_scrape_uri() -> String {
    "http://localhost:8080/channels-stats?id=ALL".to_string()
}

fn default_timeout() -> String {
    "5s".to_string()
}

fn default_namespace() -> String {
    "nginx".to_string()
}

impl Default for NginxConfig {
    fn default() -> Self {
        Self {
            scrape_uri: default_scrape_uri(),
            metric_fields: None,
            timeout: default_timeout(),
            namespace: default_namespace(),
        }
    }
}

impl NginxConfig {
    /// The fetch timeout.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.timeout)
    }

    /// The metric selection string, falling back to every catalog key.
    pub fn metric_fields(&self, catalog: &Catalog) -> String {
        self.metric_fields
            .clone()
            .unwrap_or_else(|| catalog.default_selection())
    }
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.web.socket_addr()?;

        if !self.web.telemetry_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Telemetry path must start with /".to_string(),
            ));
        }

        // "/" serves the landing page.
        if self.web.telemetry_path == "/" {
            return Err(ConfigError::Validation(
                "Telemetry path must not be /".to_string(),
            ));
        }

        if self.nginx.timeout()?.is_zero() {
            return Err(ConfigError::Validation("timeout must be > 0".to_string()));
        }

        if self.nginx.namespace.is_empty() {
            return Err(ConfigError::Validation(
                "namespace must not be empty".to_string(),
            ));
        }

        if !self
            .nginx
            .namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
            || self.nginx.namespace.starts_with(|c: char| c.is_ascii_digit())
        {
            return Err(ConfigError::Validation(format!(
                "Invalid namespace: {}",
                self.nginx.namespace
            )));
        }

        let scheme = self
            .nginx
            .scrape_uri
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .unwrap_or_default();
        if !matches!(scheme, "http" | "https" | "file") {
            return Err(ConfigError::Validation(format!(
                "Unsupported scrape URI scheme: {:?}",
                scheme
            )));
        }

        Ok(())
    }
}

/// Parse a duration in the `300ms` / `5s` / `1m30s` form.
///
/// Units: `ns`, `us`, `ms`, `s`, `m`, `h`. Each component may carry a
/// decimal fraction (`1.5s`).
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::Validation(format!("Invalid duration: {:?}", input));

    if input.is_empty() {
        return Err(invalid());
    }

    let mut total = Duration::ZERO;
    let mut rest = input;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit: f64 = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        total += Duration::from_nanos((value * nanos_per_unit).round() as u64);
    }

    Ok(total)
}

//! Geocoding service configuration.
//!
//! A service is described by a TOML file. The default Nominatim
//! configuration under `services/` is embedded at compile time; a
//! different file can be loaded at runtime with [`load_service`].

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::GeocodeError;
use crate::retry::RetryPolicy;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be used.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Search endpoint (e.g., `"https://nominatim.openstreetmap.org/search"`).
    pub base_url: String,
    /// Comma-separated ISO country codes to restrict results to.
    #[serde(default)]
    pub country_codes: Option<String>,
    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Minimum delay between requests in milliseconds.
    #[serde(default)]
    pub rate_limit_ms: u64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

const fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    concat!("psc-dashboard/", env!("CARGO_PKG_VERSION")).to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_base_delay_ms() -> u64 {
    2000
}

impl GeocodingService {
    /// Minimum delay between requests.
    #[must_use]
    pub const fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry settings for transient failures.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }
}

/// Parses and validates a service definition.
///
/// # Errors
///
/// Returns [`GeocodeError::Config`] if the TOML is malformed or a required
/// field is blank.
pub fn parse_service(content: &str) -> Result<GeocodingService, GeocodeError> {
    let service: GeocodingService = toml::from_str(content).map_err(|e| GeocodeError::Config {
        message: e.to_string(),
    })?;

    if service.id.trim().is_empty() {
        return Err(GeocodeError::Config {
            message: "id must not be empty".to_string(),
        });
    }
    if service.base_url.trim().is_empty() {
        return Err(GeocodeError::Config {
            message: format!("service '{}' has an empty base_url", service.id),
        });
    }

    Ok(service)
}

/// Reads a service definition from a TOML file.
///
/// # Errors
///
/// Returns [`GeocodeError::Io`] if the file cannot be read, or
/// [`GeocodeError::Config`] if it is invalid.
pub fn load_service(path: &Path) -> Result<GeocodingService, GeocodeError> {
    let content = std::fs::read_to_string(path)?;
    let service = parse_service(&content)?;
    log::debug!("Loaded geocoding service '{}' from {}", service.id, path.display());
    Ok(service)
}

/// The embedded Nominatim configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is invalid, which is a build-time error.
#[must_use]
pub fn default_service() -> GeocodingService {
    parse_service(include_str!("../services/nominatim.toml"))
        .unwrap_or_else(|e| panic!("Failed to parse embedded nominatim service: {e}"))
}

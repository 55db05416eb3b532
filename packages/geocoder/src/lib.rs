#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Place-name geocoding for inspection records.
//!
//! Inspection files don't always carry coordinates. This crate resolves a
//! port name to a coordinate pair through a [`Geocoder`] (in production,
//! [`nominatim::NominatimGeocoder`]), with:
//!
//! 1. **Retry**: transient failures (timeouts, connection errors, HTTP
//!    429/5xx) are retried with exponential backoff, see [`retry`].
//! 2. **Rate limiting**: a minimum delay between requests, configured per
//!    service in TOML, see [`service_registry`].
//! 3. **Caching**: results keyed by normalised place name, persisted as
//!    JSON between runs, see [`cache`].
//!
//! [`enrich::attach_coordinates`] applies all of this to a record set and
//! drops records whose place cannot be resolved.

pub mod cache;
pub mod enrich;
pub mod nominatim;
pub mod retry;
pub mod service_registry;

use async_trait::async_trait;
use psc_dashboard_inspection_models::Coordinates;
use thiserror::Error;

pub use cache::GeocodeCache;
pub use enrich::{GeocodeOutcome, attach_coordinates};

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The service answered with a non-success status.
    #[error("Geocoding service returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The place name was empty.
    #[error("Place name is empty")]
    EmptyPlace,

    /// The service has no match for the place.
    #[error("Location not found: {place}")]
    LocationNotFound {
        /// The place that could not be resolved.
        place: String,
    },

    /// The service configuration is invalid.
    #[error("Invalid geocoding service config: {message}")]
    Config {
        /// What is wrong with the configuration.
        message: String,
    },

    /// Reading or writing the cache file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cache file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeocodeError {
    /// Returns `true` if the error is likely transient and worth retrying:
    /// timeouts, connection failures, HTTP 429 and HTTP 5xx. Malformed
    /// responses and other 4xx statuses are permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited => true,
            Self::Status { status } => *status >= 500,
            _ => false,
        }
    }
}

/// Resolves place names to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Short identifier used in log messages.
    fn name(&self) -> &str;

    /// Looks up `place`, returning `Ok(None)` when the service has no
    /// match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the lookup fails.
    async fn lookup(&self, place: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

/// Geocodes a single place name.
///
/// # Errors
///
/// Returns [`GeocodeError::EmptyPlace`] for a blank name,
/// [`GeocodeError::LocationNotFound`] when the service has no match, or
/// the underlying lookup error.
pub async fn geocode(geocoder: &dyn Geocoder, place: &str) -> Result<Coordinates, GeocodeError> {
    let place = place.trim();
    if place.is_empty() {
        return Err(GeocodeError::EmptyPlace);
    }

    geocoder
        .lookup(place)
        .await?
        .ok_or_else(|| GeocodeError::LocationNotFound {
            place: place.to_string(),
        })
}

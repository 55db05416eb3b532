//! Place-name geocoding cache.
//!
//! Keys are normalised place names (trimmed, lowercase). Values are
//! `Some(coordinates)` for a hit and `None` for a place the service
//! definitively could not resolve, so neither is queried twice. The cache
//! can be persisted as a JSON object between runs.

use std::collections::BTreeMap;
use std::path::Path;

use psc_dashboard_inspection_models::Coordinates;
use serde::{Deserialize, Serialize};

use crate::GeocodeError;

/// Normalises a place name into a cache key.
#[must_use]
pub fn cache_key(place: &str) -> String {
    place.trim().to_lowercase()
}

/// Geocoding results keyed by normalised place name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeocodeCache {
    entries: BTreeMap<String, Option<Coordinates>>,
}

impl GeocodeCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a cache file. A missing file yields an empty cache.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Io`] if the file exists but cannot be read,
    /// or [`GeocodeError::Json`] if it is not a valid cache.
    pub fn load(path: &Path) -> Result<Self, GeocodeError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No geocode cache at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let cache: Self = serde_json::from_str(&content)?;
        log::info!("Loaded {} cached place(s) from {}", cache.len(), path.display());
        Ok(cache)
    }

    /// Writes the cache as pretty JSON, creating the parent directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Io`] or [`GeocodeError::Json`] if writing
    /// fails.
    pub fn save(&self, path: &Path) -> Result<(), GeocodeError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::debug!("Saved {} cached place(s) to {}", self.len(), path.display());
        Ok(())
    }

    /// `None` if the place was never looked up, `Some(None)` for a cached
    /// miss, `Some(Some(_))` for a cached hit.
    #[must_use]
    pub fn lookup(&self, place: &str) -> Option<Option<Coordinates>> {
        self.entries.get(&cache_key(place)).copied()
    }

    /// Records a hit (`Some`) or a definitive miss (`None`) for `place`.
    pub fn insert(&mut self, place: &str, coordinates: Option<Coordinates>) {
        self.entries.insert(cache_key(place), coordinates);
    }

    /// Number of cached places.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

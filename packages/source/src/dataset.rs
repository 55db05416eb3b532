//! Read-only dataset handle with modification-time invalidation.
//!
//! A [`Dataset`] is loaded once and shared by every filter/aggregate call
//! of a session. It is reloaded only when the source file's modification
//! time changes; the record set is swapped wholesale and never mutated in
//! place.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use psc_dashboard_inspection_models::InspectionRecord;

use crate::{DataFormatError, LoadOptions, distinct_places, load};

/// A loaded inspection dataset bound to its source file.
#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
    options: LoadOptions,
    modified: Option<SystemTime>,
    records: Arc<[InspectionRecord]>,
    places: Arc<[String]>,
}

impl Dataset {
    /// Loads the dataset at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DataFormatError`] if the load fails.
    pub fn open(path: impl Into<PathBuf>, options: LoadOptions) -> Result<Self, DataFormatError> {
        let path = path.into();
        let modified = modified_time(&path);
        let records = load(&path, &options)?;
        let places = distinct_places(&records);

        Ok(Self {
            path,
            options,
            modified,
            records: records.into(),
            places: places.into(),
        })
    }

    /// Path of the source file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Options the dataset was loaded with.
    #[must_use]
    pub const fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// All records, in file order.
    #[must_use]
    pub fn records(&self) -> &[InspectionRecord] {
        &self.records
    }

    /// A shared handle to the current record set. Survives later
    /// refreshes unchanged.
    #[must_use]
    pub fn shared_records(&self) -> Arc<[InspectionRecord]> {
        Arc::clone(&self.records)
    }

    /// Distinct places in order of first appearance.
    #[must_use]
    pub fn places(&self) -> &[String] {
        &self.places
    }

    /// Returns `true` if the source file's modification time no longer
    /// matches the one observed at load time, including when the file has
    /// been removed.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        modified_time(&self.path) != self.modified
    }

    /// Reloads the dataset if the source file changed.
    ///
    /// Returns `Ok(true)` when a reload happened. On failure the previous
    /// records stay in place.
    ///
    /// # Errors
    ///
    /// Returns [`DataFormatError`] if the changed file fails to load.
    pub fn refresh(&mut self) -> Result<bool, DataFormatError> {
        if !self.is_stale() {
            return Ok(false);
        }

        log::info!("{} changed on disk, reloading", self.path.display());
        let reloaded = Self::open(self.path.clone(), self.options.clone())?;
        *self = reloaded;
        Ok(true)
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

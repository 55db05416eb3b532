//! Attaching coordinates to inspection records.

use std::collections::BTreeMap;
use std::sync::Arc;

use psc_dashboard_inspection_models::{Coordinates, InspectionRecord};
use psc_dashboard_source::progress::ProgressCallback;

use crate::cache::cache_key;
use crate::{GeocodeCache, GeocodeError, Geocoder, geocode};

/// Result of [`attach_coordinates`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeOutcome {
    /// Records that have coordinates, in input order.
    pub records: Vec<InspectionRecord>,
    /// Records dropped because their place could not be resolved.
    pub excluded: u64,
    /// Geocoder lookups performed (cache hits are not counted).
    pub lookups: u64,
}

/// Fills in missing coordinates from `cache` and `geocoder`.
///
/// Records that already carry coordinates pass through untouched. Each
/// distinct place without coordinates is resolved at most once: from the
/// cache if present, otherwise through the geocoder, and the answer is
/// cached. Records whose place cannot be resolved are excluded. Transient
/// failures that survive retry exclude the record but are not cached, so a
/// later run tries again.
pub async fn attach_coordinates(
    records: &[InspectionRecord],
    geocoder: &dyn Geocoder,
    cache: &mut GeocodeCache,
    progress: &Arc<dyn ProgressCallback>,
) -> GeocodeOutcome {
    // key -> first spelling seen
    let mut pending: BTreeMap<String, &str> = BTreeMap::new();
    for record in records {
        if record.coordinates.is_none() && cache.lookup(&record.place).is_none() {
            pending
                .entry(cache_key(&record.place))
                .or_insert(record.place.as_str());
        }
    }

    progress.set_total(pending.len() as u64);
    let mut lookups = 0u64;

    for place in pending.into_values() {
        progress.set_message(place.to_string());
        lookups += 1;

        match geocode(geocoder, place).await {
            Ok(coordinates) => cache.insert(place, Some(coordinates)),
            Err(GeocodeError::LocationNotFound { .. }) => {
                log::debug!("[{}] '{place}' not found", geocoder.name());
                cache.insert(place, None);
            }
            Err(e) => log::warn!("[{}] failed to geocode '{place}': {e}", geocoder.name()),
        }
        progress.inc(1);
    }

    let mut excluded = 0u64;
    let mut located = Vec::with_capacity(records.len());
    for record in records {
        let coordinates: Option<Coordinates> = record
            .coordinates
            .or_else(|| cache.lookup(&record.place).flatten());
        if let Some(coordinates) = coordinates {
            let mut record = record.clone();
            record.coordinates = Some(coordinates);
            located.push(record);
        } else {
            excluded += 1;
        }
    }

    if excluded > 0 {
        log::warn!("{excluded} inspection(s) excluded: place could not be geocoded");
    }
    progress.finish(format!(
        "Geocoded {lookups} place(s), {} record(s) located",
        located.len()
    ));

    GeocodeOutcome {
        records: located,
        excluded,
        lookups,
    }
}

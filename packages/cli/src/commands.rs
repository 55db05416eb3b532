//! Subcommand implementations shared by the flag-driven and interactive
//! front ends.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use psc_dashboard_analytics::{aggregate, filter, inspection_rows, map_overlay};
use psc_dashboard_analytics_models::{
    AggregateResult, MapOverlay, MapViewport, PeriodFilter, Selection, SelectionError,
};
use psc_dashboard_geocoder::nominatim::NominatimGeocoder;
use psc_dashboard_geocoder::service_registry::{default_service, load_service};
use psc_dashboard_geocoder::{GeocodeCache, GeocodeError, Geocoder, attach_coordinates};
use psc_dashboard_inspection_models::InspectionRecord;
use psc_dashboard_source::progress::ProgressCallback;
use psc_dashboard_source::{Dataset, ExportError, export_to_path};
use serde::Serialize;

/// Geocoding settings for the `map` command.
#[derive(Debug, Clone, Default)]
pub struct GeocodeOptions {
    /// Service TOML overriding the embedded Nominatim configuration.
    pub config: Option<PathBuf>,
    /// JSON cache file, read before and written after geocoding.
    pub cache: Option<PathBuf>,
}

/// Builds a selection and checks its place against the dataset.
///
/// # Errors
///
/// Returns [`SelectionError::UnknownPlace`] if `place` is not in the
/// dataset.
pub fn selection(
    dataset: &Dataset,
    place: Option<String>,
    period: PeriodFilter,
) -> Result<Selection, SelectionError> {
    let selection = Selection::new(place, period);
    selection.validate(dataset.places())?;
    Ok(selection)
}

/// Distinct places, one per line, in order of first appearance.
#[must_use]
pub fn places(dataset: &Dataset) -> String {
    dataset.places().join("\n")
}

/// Every dashboard metric for the selection.
#[must_use]
pub fn summary(dataset: &Dataset, selection: &Selection) -> AggregateResult {
    let view = filter(dataset.records(), selection);
    aggregate(dataset.records(), &view)
}

/// The selected inspections, in file order.
#[must_use]
pub fn inspections(dataset: &Dataset, selection: &Selection) -> Vec<InspectionRecord> {
    inspection_rows(&filter(dataset.records(), selection))
}

/// Writes the selected inspections to `output` as CSV.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be written.
pub fn export(dataset: &Dataset, selection: &Selection, output: &Path) -> Result<u64, ExportError> {
    let view = filter(dataset.records(), selection);
    export_to_path(view.iter(), output, dataset.options())
}

/// Builds the map overlay, geocoding missing coordinates through
/// Nominatim when `geocode` is set.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the service configuration or the cache file
/// is invalid.
pub async fn map(
    dataset: &Dataset,
    selection: &Selection,
    geocode: Option<&GeocodeOptions>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<MapOverlay, GeocodeError> {
    let Some(options) = geocode else {
        let view = filter(dataset.records(), selection);
        return Ok(map_overlay(&view, MapViewport::default()));
    };

    let service = match &options.config {
        Some(path) => load_service(path)?,
        None => default_service(),
    };
    let geocoder = NominatimGeocoder::new(service)?;

    located_map(
        dataset.records(),
        selection,
        &geocoder,
        options.cache.as_deref(),
        progress,
    )
    .await
}

/// Filters `records`, resolves missing coordinates through `geocoder`,
/// and builds the overlay. Records that could not be located count toward
/// [`MapOverlay::excluded`].
///
/// # Errors
///
/// Returns [`GeocodeError`] if the cache file cannot be read or written.
pub async fn located_map(
    records: &[InspectionRecord],
    selection: &Selection,
    geocoder: &dyn Geocoder,
    cache_path: Option<&Path>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<MapOverlay, GeocodeError> {
    let mut cache = match cache_path {
        Some(path) => GeocodeCache::load(path)?,
        None => GeocodeCache::new(),
    };

    let rows = inspection_rows(&filter(records, selection));
    let outcome = attach_coordinates(&rows, geocoder, &mut cache, progress).await;

    if let Some(path) = cache_path {
        cache.save(path)?;
    }

    let located = filter(&outcome.records, selection);
    let mut overlay = map_overlay(&located, MapViewport::default());
    overlay.excluded += outcome.excluded;
    Ok(overlay)
}

/// Serialises `value` as compact or pretty JSON.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if serialisation fails.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use psc_dashboard_inspection_models::Coordinates;
    use psc_dashboard_source::LoadOptions;
    use psc_dashboard_source::progress::null_progress;

    use super::*;

    const CSV: &str = "\
Type,Date,Place,IMO number,Ship Name,Flag,Deficiencies,Detention,Ship Risk Profile at the time of inspection
Type A,01.08.2024,Tokyo,9000001,TOKYO TRADER,Panama,2,No,Standard Risk
Type B,01.08.2024,Osaka,9000002,OSAKA TRADER,Liberia,1,Yes,High Risk
Type A,15.09.2024,Tokyo,9000001,TOKYO TRADER,Panama,3,No,Standard Risk
";

    fn dataset(dir: &tempfile::TempDir) -> Dataset {
        let path = dir.path().join("inspections.csv");
        std::fs::write(&path, CSV).unwrap();
        Dataset::open(path, LoadOptions::default()).unwrap()
    }

    struct Ports {
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl Geocoder for Ports {
        fn name(&self) -> &str {
            "ports"
        }

        async fn lookup(&self, place: &str) -> Result<Option<Coordinates>, GeocodeError> {
            *self.calls.lock().unwrap() += 1;
            Ok(match place {
                "Tokyo" => Coordinates::new(35.6528, 139.8395),
                _ => None,
            })
        }
    }

    #[test]
    fn lists_places_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(places(&dataset(&dir)), "Tokyo\nOsaka");
    }

    #[test]
    fn rejects_unknown_place() {
        let dir = tempfile::tempdir().unwrap();
        let result = selection(&dataset(&dir), Some("Kobe".to_string()), PeriodFilter::Any);
        assert!(matches!(result, Err(SelectionError::UnknownPlace { .. })));
    }

    #[test]
    fn summarises_selection() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dataset(&dir);
        let selection =
            selection(&dataset, Some("Tokyo".to_string()), PeriodFilter::Month(8)).unwrap();

        let result = summary(&dataset, &selection);
        assert_eq!(result.total_inspections, 1);
        assert_eq!(result.total_deficiencies, 2);
        assert_eq!(result.deficiencies_by_place.get("Osaka"), Some(&1));

        let json = to_json(&result, false).unwrap();
        assert!(json.contains("\"totalDeficiencies\":2"));
    }

    #[test]
    fn exports_selected_rows() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dataset(&dir);
        let output = dir.path().join("tokyo.csv");
        let selection = Selection::new(Some("Tokyo".to_string()), PeriodFilter::Any);

        assert_eq!(export(&dataset, &selection, &output).unwrap(), 2);

        let reloaded = psc_dashboard_source::load(&output, dataset.options()).unwrap();
        assert_eq!(reloaded, inspections(&dataset, &selection));
    }

    #[tokio::test]
    async fn map_without_geocoding_excludes_unlocated_rows() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dataset(&dir);

        let overlay = map(&dataset, &Selection::default(), None, &null_progress())
            .await
            .unwrap();
        assert!(overlay.markers.is_empty());
        assert_eq!(overlay.excluded, 3);
    }

    #[tokio::test]
    async fn geocoded_map_persists_cache() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dataset(&dir);
        let cache_path = dir.path().join("cache.json");
        let geocoder = Ports {
            calls: Mutex::new(0),
        };

        let overlay = located_map(
            dataset.records(),
            &Selection::default(),
            &geocoder,
            Some(&cache_path),
            &null_progress(),
        )
        .await
        .unwrap();

        assert_eq!(overlay.markers.len(), 2);
        assert_eq!(overlay.excluded, 1);
        assert_eq!(overlay.markers[0].label, "TOKYO TRADER (Tokyo)");
        assert_eq!(*geocoder.calls.lock().unwrap(), 2);

        let again = located_map(
            dataset.records(),
            &Selection::default(),
            &geocoder,
            Some(&cache_path),
            &null_progress(),
        )
        .await
        .unwrap();
        assert_eq!(again, overlay);
        assert_eq!(*geocoder.calls.lock().unwrap(), 2);
    }
}

//! Map marker construction.

use psc_dashboard_analytics_models::{MapMarker, MapOverlay, MapViewport};
use psc_dashboard_inspection_models::InspectionRecord;

use crate::FilteredView;

fn marker(record: &InspectionRecord) -> Option<MapMarker> {
    let coordinates = record.coordinates?;
    Some(MapMarker {
        latitude: coordinates.latitude,
        longitude: coordinates.longitude,
        label: format!("{} ({})", record.ship_name, record.place),
        deficiencies: record.deficiencies,
    })
}

/// One marker per record that has coordinates, in view order.
#[must_use]
pub fn map_markers(view: &FilteredView<'_>) -> Vec<MapMarker> {
    view.iter().filter_map(marker).collect()
}

/// Builds the complete overlay for the map widget. Records without
/// coordinates are counted in [`MapOverlay::excluded`].
#[must_use]
pub fn map_overlay(view: &FilteredView<'_>, viewport: MapViewport) -> MapOverlay {
    let markers = map_markers(view);
    let excluded = (view.len() - markers.len()) as u64;

    if excluded > 0 {
        log::warn!("{excluded} inspection(s) have no coordinates and were left off the map");
    }

    MapOverlay {
        viewport,
        markers,
        excluded,
    }
}

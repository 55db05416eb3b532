//! Selection filtering.

use psc_dashboard_analytics_models::Selection;
use psc_dashboard_inspection_models::InspectionRecord;

/// The records matching one selection, borrowed from the full set in
/// their original order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    selection: Selection,
    records: Vec<&'a InspectionRecord>,
}

impl<'a> FilteredView<'a> {
    /// The selection this view was built from.
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Matching records.
    #[must_use]
    pub fn records(&self) -> &[&'a InspectionRecord] {
        &self.records
    }

    /// Iterates over matching records.
    pub fn iter(&self) -> impl Iterator<Item = &'a InspectionRecord> + '_ {
        self.records.iter().copied()
    }

    /// Number of matching records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Returns the records satisfying both the place and the period of
/// `selection`. An empty result is not an error.
#[must_use]
pub fn filter<'a>(records: &'a [InspectionRecord], selection: &Selection) -> FilteredView<'a> {
    let matching: Vec<&InspectionRecord> = records.iter().filter(|r| selection.matches(r)).collect();

    log::debug!(
        "Selection place={:?} period={} matched {}/{} records",
        selection.place,
        selection.period,
        matching.len(),
        records.len()
    );

    FilteredView {
        selection: selection.clone(),
        records: matching,
    }
}

/// Rows for the inspection details table, in view order.
#[must_use]
pub fn inspection_rows(view: &FilteredView<'_>) -> Vec<InspectionRecord> {
    view.iter().cloned().collect()
}

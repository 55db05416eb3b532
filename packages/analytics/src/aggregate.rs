//! Aggregations over a filtered view.

use std::collections::{BTreeMap, BTreeSet};

use psc_dashboard_analytics_models::{
    AggregateResult, DeficiencyPivot, PeriodFilter, ShipDeficiencies,
};
use psc_dashboard_inspection_models::InspectionRecord;

use crate::FilteredView;

/// Computes every dashboard metric for `view`.
///
/// `records` must be the full record set `view` was filtered from; it is
/// only used for [`deficiencies_by_place`], which compares the selected
/// place against all others within the same period.
#[must_use]
pub fn aggregate(records: &[InspectionRecord], view: &FilteredView<'_>) -> AggregateResult {
    let (total_deficiencies, total_detentions) =
        view.iter().fold((0u64, 0u64), |(deficiencies, detentions), r| {
            (
                deficiencies + u64::from(r.deficiencies),
                detentions + u64::from(r.detention.is_detained()),
            )
        });

    AggregateResult {
        selection: view.selection().clone(),
        total_inspections: view.len() as u64,
        total_deficiencies,
        total_detentions,
        risk_profile_distribution: risk_profile_distribution(view),
        deficiencies_by_place: deficiencies_by_place(records, &view.selection().period),
        deficiencies_pivot: deficiency_pivot(view),
        deficiencies_by_ship: deficiencies_by_ship(view),
    }
}

/// Counts inspections per risk profile.
#[must_use]
pub fn risk_profile_distribution(view: &FilteredView<'_>) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for record in view.iter() {
        *counts.entry(record.risk_profile.clone()).or_insert(0) += 1;
    }
    counts
}

/// Sums deficiencies per place over the full record set, restricted to
/// `period` only. Every place in `records` appears, with `0` when it has
/// no inspection in the period.
#[must_use]
pub fn deficiencies_by_place(
    records: &[InspectionRecord],
    period: &PeriodFilter,
) -> BTreeMap<String, u64> {
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for record in records {
        let entry = totals.entry(record.place.clone()).or_insert(0);
        if period.matches(record.date) {
            *entry += u64::from(record.deficiencies);
        }
    }
    totals
}

/// Sums deficiencies by date × inspection type. Combinations with no
/// inspection are filled with `0`.
#[must_use]
pub fn deficiency_pivot(view: &FilteredView<'_>) -> DeficiencyPivot {
    let inspection_types: BTreeSet<&str> = view.iter().map(|r| r.inspection_type.as_str()).collect();

    let mut rows: BTreeMap<_, BTreeMap<String, u64>> = BTreeMap::new();
    for record in view.iter() {
        let row = rows.entry(record.date).or_insert_with(|| {
            inspection_types
                .iter()
                .map(|t| ((*t).to_string(), 0))
                .collect()
        });
        *row.entry(record.inspection_type.clone()).or_insert(0) += u64::from(record.deficiencies);
    }

    DeficiencyPivot {
        inspection_types: inspection_types.into_iter().map(str::to_string).collect(),
        rows,
    }
}

/// Sums deficiencies per ship, ordered by deficiencies descending then
/// ship name.
#[must_use]
pub fn deficiencies_by_ship(view: &FilteredView<'_>) -> Vec<ShipDeficiencies> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for record in view.iter() {
        *totals.entry(record.ship_name.as_str()).or_insert(0) += u64::from(record.deficiencies);
    }

    let mut ships: Vec<ShipDeficiencies> = totals
        .into_iter()
        .map(|(ship_name, deficiencies)| ShipDeficiencies {
            ship_name: ship_name.to_string(),
            deficiencies,
        })
        .collect();
    ships.sort_by(|a, b| {
        b.deficiencies
            .cmp(&a.deficiencies)
            .then_with(|| a.ship_name.cmp(&b.ship_name))
    });
    ships
}

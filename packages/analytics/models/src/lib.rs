#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Selection and result types for the inspection dashboard.
//!
//! A [`Selection`] describes what the user picked (place and period). The
//! analytics crate turns a selection into an [`AggregateResult`], a
//! [`DeficiencyPivot`] for the heatmap, and a [`MapOverlay`] for the map
//! widget. All result types serialize to camelCase JSON for the rendering
//! collaborators.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Datelike as _, NaiveDate};
use psc_dashboard_inspection_models::{Coordinates, InspectionRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Errors raised when building a selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The place is not present in the dataset.
    #[error("Unknown place '{place}'")]
    UnknownPlace {
        /// The rejected place.
        place: String,
    },

    /// The period string could not be parsed.
    #[error("Invalid period '{value}': {message}")]
    InvalidPeriod {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        message: String,
    },
}

/// Time constraint of a selection.
///
/// Matching always compares parsed date fields, never formatted text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeriodFilter {
    /// No time constraint.
    #[default]
    Any,
    /// A calendar month (1-12) in any year.
    Month(u32),
    /// A single calendar day.
    Day(NaiveDate),
    /// An inclusive date range.
    Range {
        /// First day included.
        from: NaiveDate,
        /// Last day included.
        to: NaiveDate,
    },
}

impl PeriodFilter {
    /// Creates a month filter.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidPeriod`] if `month` is not 1-12.
    pub fn month(month: u32) -> Result<Self, SelectionError> {
        if (1..=12).contains(&month) {
            Ok(Self::Month(month))
        } else {
            Err(SelectionError::InvalidPeriod {
                value: month.to_string(),
                message: "month must be between 1 and 12".to_string(),
            })
        }
    }

    /// Creates an inclusive range filter.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidPeriod`] if `from` is after `to`.
    pub fn range(from: NaiveDate, to: NaiveDate) -> Result<Self, SelectionError> {
        if from > to {
            return Err(SelectionError::InvalidPeriod {
                value: format!("{from}..{to}"),
                message: "range start is after range end".to_string(),
            });
        }
        Ok(Self::Range { from, to })
    }

    /// Returns `true` if `date` falls within this period.
    #[must_use]
    pub fn matches(&self, date: NaiveDate) -> bool {
        match *self {
            Self::Any => true,
            Self::Month(month) => date.month() == month,
            Self::Day(day) => date == day,
            Self::Range { from, to } => (from..=to).contains(&date),
        }
    }
}

/// Resolves an English month name or three-letter abbreviation,
/// case-insensitively. The whole input must match.
fn month_from_name(value: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .zip(1..)
        .find(|(name, _)| value.eq_ignore_ascii_case(name) || value.eq_ignore_ascii_case(&name[..3]))
        .map(|(_, number)| number)
}

fn parse_iso_date(value: &str, whole: &str) -> Result<NaiveDate, SelectionError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| SelectionError::InvalidPeriod {
        value: whole.to_string(),
        message: format!("'{}' is not a YYYY-MM-DD date: {e}", value.trim()),
    })
}

impl FromStr for PeriodFilter {
    type Err = SelectionError;

    /// Accepts `all` (or empty), a month number `1`-`12`, a month name
    /// (`August`, `aug`), an ISO day (`2024-08-01`) or an inclusive range
    /// (`2024-08-01..2024-08-31`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();

        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return Ok(Self::Any);
        }

        if let Some((from, to)) = value.split_once("..") {
            return Self::range(parse_iso_date(from, value)?, parse_iso_date(to, value)?);
        }

        if let Ok(number) = value.parse::<u32>() {
            return Self::month(number);
        }

        if let Some(number) = month_from_name(value) {
            return Ok(Self::Month(number));
        }

        if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return Ok(Self::Day(day));
        }

        Err(SelectionError::InvalidPeriod {
            value: value.to_string(),
            message: "expected a month (1-12 or name), a YYYY-MM-DD date, or FROM..TO".to_string(),
        })
    }
}

impl std::fmt::Display for PeriodFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "all"),
            Self::Month(month) => {
                let name = usize::try_from(*month)
                    .ok()
                    .and_then(|m| m.checked_sub(1))
                    .and_then(|i| MONTH_NAMES.get(i));
                match name {
                    Some(name) => write!(f, "{name}"),
                    None => write!(f, "{month}"),
                }
            }
            Self::Day(day) => write!(f, "{day}"),
            Self::Range { from, to } => write!(f, "{from}..{to}"),
        }
    }
}

/// What the user selected: a place (or all places) and a period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Place to restrict to. `None` selects every place.
    pub place: Option<String>,
    /// Time constraint.
    pub period: PeriodFilter,
}

impl Selection {
    /// Creates a selection.
    #[must_use]
    pub const fn new(place: Option<String>, period: PeriodFilter) -> Self {
        Self { place, period }
    }

    /// Returns `true` if the record's place satisfies this selection.
    #[must_use]
    pub fn matches_place(&self, record: &InspectionRecord) -> bool {
        self.place.as_deref().is_none_or(|place| record.place == place)
    }

    /// Returns `true` if the record satisfies both the place and the
    /// period constraint.
    #[must_use]
    pub fn matches(&self, record: &InspectionRecord) -> bool {
        self.matches_place(record) && self.period.matches(record.date)
    }

    /// Checks the place against the dataset's distinct places.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownPlace`] if a place is set and not
    /// among `places`.
    pub fn validate(&self, places: &[String]) -> Result<(), SelectionError> {
        match &self.place {
            Some(place) if !places.iter().any(|p| p == place) => Err(SelectionError::UnknownPlace {
                place: place.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// Deficiency total for one ship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipDeficiencies {
    /// Ship name.
    pub ship_name: String,
    /// Sum of deficiencies across the ship's inspections.
    pub deficiencies: u64,
}

/// One long-format heatmap cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotCell {
    /// Inspection date.
    pub date: NaiveDate,
    /// Inspection type.
    pub inspection_type: String,
    /// Sum of deficiencies.
    pub deficiencies: u64,
}

/// Deficiencies summed by date × inspection type.
///
/// Every row carries every inspection type; combinations without
/// inspections hold `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeficiencyPivot {
    /// Column labels, sorted.
    pub inspection_types: Vec<String>,
    /// Date → inspection type → deficiencies.
    pub rows: BTreeMap<NaiveDate, BTreeMap<String, u64>>,
}

impl DeficiencyPivot {
    /// Row labels, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    /// Column labels, sorted.
    #[must_use]
    pub fn inspection_types(&self) -> &[String] {
        &self.inspection_types
    }

    /// Returns the cell value, or `None` if the date or type is not part
    /// of the pivot.
    #[must_use]
    pub fn cell(&self, date: NaiveDate, inspection_type: &str) -> Option<u64> {
        self.rows.get(&date)?.get(inspection_type).copied()
    }

    /// Sum of all cells.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.rows.values().flat_map(BTreeMap::values).sum()
    }

    /// Returns `true` if the pivot has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Flattens the pivot into long-format cells, date-major.
    #[must_use]
    pub fn cells(&self) -> Vec<PivotCell> {
        self.rows
            .iter()
            .flat_map(|(date, row)| {
                row.iter().map(|(inspection_type, deficiencies)| PivotCell {
                    date: *date,
                    inspection_type: inspection_type.clone(),
                    deficiencies: *deficiencies,
                })
            })
            .collect()
    }
}

/// Derived metrics for one selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// The selection these metrics describe.
    pub selection: Selection,
    /// Number of inspections in the view.
    pub total_inspections: u64,
    /// Sum of deficiencies in the view.
    pub total_deficiencies: u64,
    /// Number of inspections that ended in detention.
    pub total_detentions: u64,
    /// Risk profile → number of inspections.
    pub risk_profile_distribution: BTreeMap<String, u64>,
    /// Every place in the full dataset → deficiencies within the period,
    /// ignoring the place constraint.
    pub deficiencies_by_place: BTreeMap<String, u64>,
    /// Deficiencies by date × inspection type.
    pub deficiencies_pivot: DeficiencyPivot,
    /// Deficiencies per ship, highest first.
    pub deficiencies_by_ship: Vec<ShipDeficiencies>,
}

/// A single map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapMarker {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Hover label.
    pub label: String,
    /// Deficiencies found; drives marker size and colour.
    pub deficiencies: u32,
}

/// Initial map camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapViewport {
    /// Map centre.
    pub center: Coordinates,
    /// Zoom level.
    pub zoom: f64,
}

impl Default for MapViewport {
    /// Centred on Japan.
    fn default() -> Self {
        Self {
            center: Coordinates {
                latitude: 36.2048,
                longitude: 138.2529,
            },
            zoom: 1.2,
        }
    }
}

/// Everything the map widget needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOverlay {
    /// Initial camera.
    pub viewport: MapViewport,
    /// Markers, in view order.
    pub markers: Vec<MapMarker>,
    /// Records left off the map because they have no coordinates.
    pub excluded: u64,
}

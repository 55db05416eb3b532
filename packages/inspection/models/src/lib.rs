#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Port state control inspection record types.
//!
//! This crate defines the canonical [`InspectionRecord`] shared by every
//! other crate in the workspace, along with the CSV column names the
//! records are read from and written back to.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// CSV column names for the inspection dataset.
pub mod columns {
    /// Inspection type (e.g. "Initial", "More Detailed").
    pub const TYPE: &str = "Type";
    /// Inspection date.
    pub const DATE: &str = "Date";
    /// Port or location name.
    pub const PLACE: &str = "Place";
    /// IMO ship identifier.
    pub const IMO_NUMBER: &str = "IMO number";
    /// Ship name.
    pub const SHIP_NAME: &str = "Ship Name";
    /// Flag state.
    pub const FLAG: &str = "Flag";
    /// Number of deficiencies recorded.
    pub const DEFICIENCIES: &str = "Deficiencies";
    /// Whether the ship was detained.
    pub const DETENTION: &str = "Detention";
    /// Risk profile snapshot at inspection time.
    pub const RISK_PROFILE: &str = "Ship Risk Profile at the time of inspection";
    /// Optional latitude (WGS84).
    pub const LATITUDE: &str = "Latitude";
    /// Optional longitude (WGS84).
    pub const LONGITUDE: &str = "Longitude";

    /// Columns every input file must carry.
    pub const REQUIRED: &[&str] = &[
        TYPE,
        DATE,
        PLACE,
        IMO_NUMBER,
        SHIP_NAME,
        FLAG,
        DEFICIENCIES,
        DETENTION,
        RISK_PROFILE,
    ];

    /// Header row written on export, in order.
    pub const EXPORT_HEADER: &[&str] = &[
        TYPE,
        DATE,
        PLACE,
        IMO_NUMBER,
        SHIP_NAME,
        FLAG,
        DEFICIENCIES,
        DETENTION,
        RISK_PROFILE,
        LATITUDE,
        LONGITUDE,
    ];
}

/// Outcome of an inspection with respect to detention.
///
/// Parsed case-insensitively from `Yes`/`Y`/`True`/`1` and
/// `No`/`N`/`False`/`0`. Always displayed as `Yes` or `No`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Detention {
    /// The ship was detained.
    #[strum(to_string = "Yes", serialize = "y", serialize = "true", serialize = "1")]
    Yes,
    /// The ship was allowed to sail.
    #[default]
    #[strum(to_string = "No", serialize = "n", serialize = "false", serialize = "0")]
    No,
}

impl Detention {
    /// Returns `true` if the ship was detained.
    #[must_use]
    pub const fn is_detained(self) -> bool {
        matches!(self, Self::Yes)
    }
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    /// Latitude in degrees, -90 to 90.
    pub latitude: f64,
    /// Longitude in degrees, -180 to 180.
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair, returning `None` when either value is
    /// out of range or not finite.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// One row of the inspection dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    /// Inspection type (e.g. "Initial", "More Detailed").
    pub inspection_type: String,
    /// Calendar date of the inspection.
    pub date: NaiveDate,
    /// Port or location where the inspection took place.
    pub place: String,
    /// IMO ship identifier.
    pub imo_number: String,
    /// Ship name.
    pub ship_name: String,
    /// Flag state.
    pub flag: String,
    /// Number of deficiencies recorded.
    pub deficiencies: u32,
    /// Whether the ship was detained.
    pub detention: Detention,
    /// Risk profile assigned to the ship at inspection time.
    pub risk_profile: String,
    /// Location of the inspection, when known.
    pub coordinates: Option<Coordinates>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_detention_variants() {
        assert_eq!("Yes".parse::<Detention>().unwrap(), Detention::Yes);
        assert_eq!("yes".parse::<Detention>().unwrap(), Detention::Yes);
        assert_eq!("Y".parse::<Detention>().unwrap(), Detention::Yes);
        assert_eq!("TRUE".parse::<Detention>().unwrap(), Detention::Yes);
        assert_eq!("No".parse::<Detention>().unwrap(), Detention::No);
        assert_eq!("0".parse::<Detention>().unwrap(), Detention::No);
        assert!("maybe".parse::<Detention>().is_err());
    }

    #[test]
    fn detention_displays_canonical_form() {
        assert_eq!(Detention::Yes.to_string(), "Yes");
        assert_eq!(Detention::No.to_string(), "No");
        assert!(Detention::Yes.is_detained());
        assert!(!Detention::default().is_detained());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(Coordinates::new(35.4437, 139.638).is_some());
        assert!(Coordinates::new(91.0, 0.0).is_none());
        assert!(Coordinates::new(0.0, -180.5).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn serializes_record_as_camel_case() {
        let record = InspectionRecord {
            inspection_type: "Initial".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            place: "Tokyo".to_string(),
            imo_number: "9123456".to_string(),
            ship_name: "PACIFIC DAWN".to_string(),
            flag: "Panama".to_string(),
            deficiencies: 2,
            detention: Detention::No,
            risk_profile: "Standard Risk".to_string(),
            coordinates: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["inspectionType"], "Initial");
        assert_eq!(json["date"], "2024-08-01");
        assert_eq!(json["imoNumber"], "9123456");
        assert_eq!(json["detention"], "No");
        assert!(json["coordinates"].is_null());
    }

    #[test]
    fn export_header_starts_with_required_columns() {
        assert_eq!(&columns::EXPORT_HEADER[..columns::REQUIRED.len()], columns::REQUIRED);
    }
}

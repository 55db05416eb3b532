//! Field-level parsers for inspection CSV cells.
//!
//! Each parser returns a short message on failure; the loader wraps it
//! into a [`crate::DataFormatError::InvalidField`] with the file, line and
//! column attached.

use chrono::NaiveDate;
use psc_dashboard_inspection_models::{Coordinates, Detention};

/// Parses a date cell with the given `strftime` pattern. Trailing text is
/// rejected.
///
/// # Errors
///
/// Returns a message if the value does not match the format exactly.
pub fn parse_date(value: &str, format: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, format)
        .map_err(|e| format!("{e} (expected format '{format}')"))
}

/// Parses a deficiency count. Counts are non-negative integers.
///
/// # Errors
///
/// Returns a message for empty, negative, fractional or non-numeric input.
pub fn parse_deficiencies(value: &str) -> Result<u32, String> {
    if value.is_empty() {
        return Err("deficiency count is empty".to_string());
    }
    if value.starts_with('-') {
        return Err("deficiency count must not be negative".to_string());
    }
    value
        .parse::<u32>()
        .map_err(|e| format!("expected a non-negative integer: {e}"))
}

/// Parses a detention cell. An empty cell means the ship was not detained.
///
/// # Errors
///
/// Returns a message if the value is not a recognised yes/no token.
pub fn parse_detention(value: &str) -> Result<Detention, String> {
    if value.is_empty() {
        return Ok(Detention::No);
    }
    value
        .parse::<Detention>()
        .map_err(|_| "expected Yes or No".to_string())
}

/// Parses optional latitude/longitude cells.
///
/// Returns `Ok(None)` when both cells are empty. A lone value, a
/// non-numeric value, or an out-of-range pair is an error.
///
/// # Errors
///
/// Returns a message describing which part of the pair is invalid.
pub fn parse_coordinates(lat: &str, lng: &str) -> Result<Option<Coordinates>, String> {
    match (lat.is_empty(), lng.is_empty()) {
        (true, true) => return Ok(None),
        (false, true) => return Err("latitude given without longitude".to_string()),
        (true, false) => return Err("longitude given without latitude".to_string()),
        (false, false) => {}
    }

    let latitude = lat
        .parse::<f64>()
        .map_err(|e| format!("latitude is not a number: {e}"))?;
    let longitude = lng
        .parse::<f64>()
        .map_err(|e| format!("longitude is not a number: {e}"))?;

    Coordinates::new(latitude, longitude)
        .map(Some)
        .ok_or_else(|| format!("coordinates ({latitude}, {longitude}) are out of range"))
}

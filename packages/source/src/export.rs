//! CSV export of inspection records.
//!
//! Writes records in the input schema so that an exported file loads back
//! into the same records.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use psc_dashboard_inspection_models::{InspectionRecord, columns};

use crate::{ExportError, LoadOptions};

/// Writes `records` as CSV to `writer`, returning the number of rows
/// written (excluding the header).
///
/// Dates use `options.date_format`; missing coordinates become empty
/// cells.
///
/// # Errors
///
/// Returns [`ExportError`] if writing fails or the date format cannot
/// render a date.
pub fn export<'a, W, I>(records: I, writer: W, options: &LoadOptions) -> Result<u64, ExportError>
where
    W: Write,
    I: IntoIterator<Item = &'a InspectionRecord>,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    csv_writer.write_record(columns::EXPORT_HEADER)?;

    let mut count = 0u64;
    for record in records {
        let mut date = String::new();
        write!(date, "{}", record.date.format(&options.date_format)).map_err(|_| {
            ExportError::DateFormat {
                format: options.date_format.clone(),
            }
        })?;

        let deficiencies = record.deficiencies.to_string();
        let detention = record.detention.to_string();
        let (lat, lng) = record.coordinates.map_or_else(
            || (String::new(), String::new()),
            |c| (c.latitude.to_string(), c.longitude.to_string()),
        );

        csv_writer.write_record([
            record.inspection_type.as_str(),
            date.as_str(),
            record.place.as_str(),
            record.imo_number.as_str(),
            record.ship_name.as_str(),
            record.flag.as_str(),
            deficiencies.as_str(),
            detention.as_str(),
            record.risk_profile.as_str(),
            lat.as_str(),
            lng.as_str(),
        ])?;
        count += 1;
    }

    csv_writer.flush()?;
    Ok(count)
}

/// Writes `records` to a CSV file at `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or written.
pub fn export_to_path<'a, I>(
    records: I,
    path: &Path,
    options: &LoadOptions,
) -> Result<u64, ExportError>
where
    I: IntoIterator<Item = &'a InspectionRecord>,
{
    let file = std::fs::File::create(path)?;
    let count = export(records, std::io::BufWriter::new(file), options)?;
    log::info!("Exported {count} inspection records to {}", path.display());
    Ok(count)
}

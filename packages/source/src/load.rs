//! CSV loader for inspection files.
//!
//! Reads the header row, resolves every required column by name, then
//! parses each row into an [`InspectionRecord`]. The first invalid row
//! aborts the load.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use psc_dashboard_inspection_models::{InspectionRecord, columns};

use crate::{DataFormatError, LoadOptions, parsing};

/// Column positions resolved from the header row.
struct ColumnIndex {
    inspection_type: usize,
    date: usize,
    place: usize,
    imo_number: usize,
    ship_name: usize,
    flag: usize,
    deficiencies: usize,
    detention: usize,
    risk_profile: usize,
    latitude: Option<usize>,
    longitude: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord, path: &Path) -> Result<Self, DataFormatError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| DataFormatError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
        };

        Ok(Self {
            inspection_type: require(columns::TYPE)?,
            date: require(columns::DATE)?,
            place: require(columns::PLACE)?,
            imo_number: require(columns::IMO_NUMBER)?,
            ship_name: require(columns::SHIP_NAME)?,
            flag: require(columns::FLAG)?,
            deficiencies: require(columns::DEFICIENCIES)?,
            detention: require(columns::DETENTION)?,
            risk_profile: require(columns::RISK_PROFILE)?,
            latitude: find(columns::LATITUDE),
            longitude: find(columns::LONGITUDE),
        })
    }
}

/// Loads every inspection record from the CSV file at `path`.
///
/// # Errors
///
/// Returns [`DataFormatError`] if the file is missing or unreadable, is
/// empty, lacks a required column, or contains any row that fails to
/// parse.
pub fn load(path: &Path, options: &LoadOptions) -> Result<Vec<InspectionRecord>, DataFormatError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DataFormatError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            DataFormatError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let records = load_from_reader(file, path, options)?;
    log::info!("Loaded {} inspection records from {}", records.len(), path.display());
    Ok(records)
}

/// Loads inspection records from any reader. `origin` is only used to
/// label errors.
///
/// # Errors
///
/// Same conditions as [`load`], minus the file-open failures.
pub fn load_from_reader<R: Read>(
    reader: R,
    origin: &Path,
    options: &LoadOptions,
) -> Result<Vec<InspectionRecord>, DataFormatError> {
    options.validate()?;

    let csv_error = |source: csv::Error| DataFormatError::Csv {
        path: origin.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(DataFormatError::Empty {
            path: origin.to_path_buf(),
        });
    }

    let index = ColumnIndex::resolve(&headers, origin)?;
    let mut records = Vec::new();

    for result in reader.records() {
        let row = result.map_err(csv_error)?;
        let line = row.position().map_or(0, csv::Position::line);
        records.push(parse_row(&row, &index, line, origin, options)?);
    }

    if records.is_empty() {
        return Err(DataFormatError::Empty {
            path: origin.to_path_buf(),
        });
    }

    log::debug!("Parsed {} rows from {}", records.len(), origin.display());
    Ok(records)
}

fn parse_row(
    row: &csv::StringRecord,
    index: &ColumnIndex,
    line: u64,
    origin: &Path,
    options: &LoadOptions,
) -> Result<InspectionRecord, DataFormatError> {
    let cell = |i: usize| row.get(i).unwrap_or("");
    let invalid = |column: &str, value: &str, message: String| DataFormatError::InvalidField {
        path: origin.to_path_buf(),
        line,
        column: column.to_string(),
        value: value.to_string(),
        message,
    };

    let raw_date = cell(index.date);
    let date = parsing::parse_date(raw_date, &options.date_format)
        .map_err(|m| invalid(columns::DATE, raw_date, m))?;

    let place = cell(index.place);
    if place.is_empty() {
        return Err(invalid(columns::PLACE, place, "place must not be empty".to_string()));
    }

    let raw_deficiencies = cell(index.deficiencies);
    let deficiencies = parsing::parse_deficiencies(raw_deficiencies)
        .map_err(|m| invalid(columns::DEFICIENCIES, raw_deficiencies, m))?;

    let raw_detention = cell(index.detention);
    let detention = parsing::parse_detention(raw_detention)
        .map_err(|m| invalid(columns::DETENTION, raw_detention, m))?;

    let lat = index.latitude.map_or("", cell);
    let lng = index.longitude.map_or("", cell);
    let coordinates = parsing::parse_coordinates(lat, lng)
        .map_err(|m| invalid(columns::LATITUDE, &format!("{lat},{lng}"), m))?;

    Ok(InspectionRecord {
        inspection_type: cell(index.inspection_type).to_string(),
        date,
        place: place.to_string(),
        imo_number: cell(index.imo_number).to_string(),
        ship_name: cell(index.ship_name).to_string(),
        flag: cell(index.flag).to_string(),
        deficiencies,
        detention,
        risk_profile: cell(index.risk_profile).to_string(),
        coordinates,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use chrono::NaiveDate;
    use psc_dashboard_inspection_models::Detention;

    use super::*;

    const HEADER: &str = "Type,Date,Place,IMO number,Ship Name,Flag,Deficiencies,Detention,Ship Risk Profile at the time of inspection";

    fn load_str(csv: &str) -> Result<Vec<InspectionRecord>, DataFormatError> {
        load_from_reader(csv.as_bytes(), Path::new("test.csv"), &LoadOptions::default())
    }

    #[test]
    fn loads_well_formed_rows() {
        let csv = format!(
            "{HEADER}\n\
             Initial,01.08.2024,Tokyo,9123456,PACIFIC DAWN,Panama,2,No,Standard Risk\n\
             More Detailed,15.08.2024,Osaka,9234567,SEA LARK,Liberia,5,Yes,High Risk\n"
        );
        let records = load_str(&csv).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].inspection_type, "Initial");
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
        assert_eq!(records[0].deficiencies, 2);
        assert_eq!(records[1].detention, Detention::Yes);
        assert_eq!(records[1].risk_profile, "High Risk");
        assert!(records[1].coordinates.is_none());
    }

    #[test]
    fn trims_headers_and_cells_and_ignores_column_order() {
        let csv = " Place , Type ,Date,IMO number,Ship Name,Flag,Deficiencies,Detention,Ship Risk Profile at the time of inspection,Latitude,Longitude\n\
                   \x20Tokyo ,Initial,01.08.2024,1,A,Panama, 3 ,No,Low Risk,35.6,139.8\n";
        let records = load_str(csv).unwrap();
        assert_eq!(records[0].place, "Tokyo");
        assert_eq!(records[0].deficiencies, 3);
        let coords = records[0].coordinates.unwrap();
        assert!((coords.latitude - 35.6).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load(Path::new("/nonexistent/psc.csv"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DataFormatError::NotFound { .. }));
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(matches!(load_str(""), Err(DataFormatError::Empty { .. })));
        assert!(matches!(
            load_str(&format!("{HEADER}\n")),
            Err(DataFormatError::Empty { .. })
        ));
    }

    #[test]
    fn missing_column_is_named() {
        let csv = "Type,Date,Place\nInitial,01.08.2024,Tokyo\n";
        match load_str(csv) {
            Err(DataFormatError::MissingColumn { column, .. }) => assert_eq!(column, "IMO number"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn bad_date_aborts_whole_load() {
        let csv = format!(
            "{HEADER}\n\
             Initial,01.08.2024,Tokyo,1,A,Panama,2,No,Standard Risk\n\
             Initial,2024-08-02,Tokyo,2,B,Panama,1,No,Standard Risk\n"
        );
        match load_str(&csv) {
            Err(DataFormatError::InvalidField {
                line, column, value, ..
            }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "Date");
                assert_eq!(value, "2024-08-02");
            }
            other => panic!("expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn negative_deficiencies_are_rejected() {
        let csv = format!("{HEADER}\nInitial,01.08.2024,Tokyo,1,A,Panama,-2,No,Standard Risk\n");
        let err = load_str(&csv).unwrap_err();
        assert!(err.to_string().contains("Deficiencies"));
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let csv = format!("{HEADER}\nInitial,01.08.2024,Tokyo\n");
        assert!(matches!(load_str(&csv), Err(DataFormatError::Csv { .. })));
    }

    #[test]
    fn empty_place_is_rejected() {
        let csv = format!("{HEADER}\nInitial,01.08.2024,,1,A,Panama,0,No,Standard Risk\n");
        assert!(matches!(
            load_str(&csv),
            Err(DataFormatError::InvalidField { .. })
        ));
    }

    #[test]
    fn honours_custom_delimiter_and_date_format() {
        let options = LoadOptions {
            date_format: "%Y-%m-%d".to_string(),
            delimiter: b';',
        };
        let csv = HEADER.replace(',', ";")
            + "\nInitial;2024-08-01;Tokyo;1;A;Panama;4;No;Standard Risk\n";
        let records = load_from_reader(csv.as_bytes(), Path::new("semi.csv"), &options).unwrap();
        assert_eq!(records[0].deficiencies, 4);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "Initial,01.08.2024,Tokyo,1,A,Panama,2,No,Standard Risk").unwrap();
        file.flush().unwrap();

        let records = load(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].place, "Tokyo");
    }
}

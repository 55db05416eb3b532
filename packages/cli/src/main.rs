#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line dashboard for port state control inspection data.
//!
//! Every subcommand loads the inspection CSV, applies a place/period
//! selection, and prints the result (JSON for structured output, CSV for
//! `export`). Without a subcommand an interactive menu is shown.
//!
//! Uses `indicatif-log-bridge` (via [`psc_dashboard_cli_utils::init_logger`])
//! so that log lines and the geocoding progress bar don't interleave.

mod commands;
mod interactive;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use psc_dashboard_analytics_models::PeriodFilter;
use psc_dashboard_cli_utils::IndicatifProgress;
use psc_dashboard_source::progress::null_progress;
use psc_dashboard_source::{DEFAULT_DATE_FORMAT, Dataset, LoadOptions};

use crate::commands::GeocodeOptions;

#[derive(Parser)]
#[command(
    name = "psc_dashboard",
    about = "Port state control inspection dashboard"
)]
struct Cli {
    /// Inspection CSV file
    #[arg(long, env = "PSC_DASHBOARD_FILE", default_value = "japan2024Aug.csv", global = true)]
    file: PathBuf,

    /// `strftime` format of the `Date` column
    #[arg(long, default_value = DEFAULT_DATE_FORMAT, global = true)]
    date_format: String,

    /// Field delimiter (a single ASCII character)
    #[arg(long, default_value = ",", value_parser = parse_delimiter, global = true)]
    delimiter: u8,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct SelectionArgs {
    /// Place to restrict to (default: all places)
    #[arg(long)]
    place: Option<String>,

    /// Period: `all`, a month (`8`, `August`, `aug`), a day
    /// (`2024-08-01`) or a range (`2024-08-01..2024-08-31`)
    #[arg(long, default_value = "all")]
    period: PeriodFilter,
}

#[derive(Subcommand)]
enum Commands {
    /// List the distinct places in the dataset
    Places,
    /// Print summary metrics for a selection as JSON
    Summary {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Print the inspections of a selection as JSON
    Inspections {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Write the inspections of a selection to a CSV file
    Export {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Destination CSV file
        #[arg(long)]
        output: PathBuf,
    },
    /// Print map markers for a selection as JSON
    Map {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Look up coordinates for places that have none
        #[arg(long)]
        geocode: bool,
        /// Geocoding service TOML (default: the built-in Nominatim config)
        #[arg(long, requires = "geocode")]
        geocoder_config: Option<PathBuf>,
        /// JSON file caching geocoding results between runs
        #[arg(long, requires = "geocode")]
        geocode_cache: Option<PathBuf>,
    },
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(format!("delimiter must be a single ASCII character, got '{value}'")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = psc_dashboard_cli_utils::init_logger();
    let cli = Cli::parse();

    let options = LoadOptions {
        date_format: cli.date_format,
        delimiter: cli.delimiter,
    };
    options.validate()?;
    let mut dataset = Dataset::open(cli.file, options)?;

    let Some(command) = cli.command else {
        return interactive::run(&mut dataset, &multi, cli.pretty).await;
    };

    match command {
        Commands::Places => println!("{}", commands::places(&dataset)),
        Commands::Summary { selection } => {
            let selection = commands::selection(&dataset, selection.place, selection.period)?;
            let result = commands::summary(&dataset, &selection);
            println!("{}", commands::to_json(&result, cli.pretty)?);
        }
        Commands::Inspections { selection } => {
            let selection = commands::selection(&dataset, selection.place, selection.period)?;
            let rows = commands::inspections(&dataset, &selection);
            println!("{}", commands::to_json(&rows, cli.pretty)?);
        }
        Commands::Export { selection, output } => {
            let selection = commands::selection(&dataset, selection.place, selection.period)?;
            let count = commands::export(&dataset, &selection, &output)?;
            println!("Wrote {count} inspection(s) to {}", output.display());
        }
        Commands::Map {
            selection,
            geocode,
            geocoder_config,
            geocode_cache,
        } => {
            let selection = commands::selection(&dataset, selection.place, selection.period)?;
            let geocode = geocode.then_some(GeocodeOptions {
                config: geocoder_config,
                cache: geocode_cache,
            });
            let progress = if geocode.is_some() {
                IndicatifProgress::batch_bar(&multi, "Geocoding places")
            } else {
                null_progress()
            };
            let overlay =
                commands::map(&dataset, &selection, geocode.as_ref(), &progress).await?;
            println!("{}", commands::to_json(&overlay, cli.pretty)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_selection_flags() {
        let cli = Cli::try_parse_from([
            "psc_dashboard",
            "--file",
            "data.csv",
            "summary",
            "--place",
            "Tokyo",
            "--period",
            "aug",
        ])
        .unwrap();

        assert_eq!(cli.file, PathBuf::from("data.csv"));
        match cli.command {
            Some(Commands::Summary { selection }) => {
                assert_eq!(selection.place.as_deref(), Some("Tokyo"));
                assert_eq!(selection.period, PeriodFilter::Month(8));
            }
            _ => panic!("expected summary"),
        }
    }

    #[test]
    fn rejects_invalid_period() {
        let result = Cli::try_parse_from(["psc_dashboard", "summary", "--period", "Novemberish"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_delimiters() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("\t"), Ok(b'\t'));
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn geocoder_flags_require_geocode() {
        let result = Cli::try_parse_from([
            "psc_dashboard",
            "map",
            "--geocode-cache",
            "cache.json",
        ]);
        assert!(result.is_err());
    }
}

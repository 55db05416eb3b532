#![allow(clippy::module_name_repetitions)]

//! Interactive dashboard.
//!
//! Provides a menu-driven interface using `dialoguer`: pick a place and a
//! period, view the result, repeat. The dataset is reloaded before each
//! pass if its file changed on disk.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};
use psc_dashboard_analytics_models::{PeriodFilter, Selection};
use psc_dashboard_cli_utils::{IndicatifProgress, MultiProgress};
use psc_dashboard_source::Dataset;
use psc_dashboard_source::progress::null_progress;

use crate::commands::{self, GeocodeOptions};

/// Actions available in the interactive menu.
enum Action {
    Summary,
    Inspections,
    Map,
    Export,
    ListPlaces,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Summary,
        Self::Inspections,
        Self::Map,
        Self::Export,
        Self::ListPlaces,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Summary => "Show summary",
            Self::Inspections => "Show inspections",
            Self::Map => "Show map markers",
            Self::Export => "Export inspections to CSV",
            Self::ListPlaces => "List places",
            Self::Quit => "Quit",
        }
    }
}

const ALL_PLACES: &str = "All places";

/// Runs the interactive menu loop until the user quits.
///
/// # Errors
///
/// Returns an error if a prompt fails or an export cannot be written.
pub async fn run(
    dataset: &mut Dataset,
    multi: &MultiProgress,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("PSC Inspection Dashboard ({})", dataset.path().display());
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let mut current = Selection::default();

    loop {
        match dataset.refresh() {
            Ok(true) => println!("Reloaded {} inspection(s).", dataset.records().len()),
            Ok(false) => {}
            Err(e) => log::error!("Reload failed, keeping previous data: {e}"),
        }

        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::Quit => break,
            Action::ListPlaces => println!("{}", commands::places(dataset)),
            Action::Summary => {
                current = prompt_selection(dataset, &current)?;
                let result = commands::summary(dataset, &current);
                println!("{}", commands::to_json(&result, pretty)?);
            }
            Action::Inspections => {
                current = prompt_selection(dataset, &current)?;
                let rows = commands::inspections(dataset, &current);
                println!("{}", commands::to_json(&rows, pretty)?);
            }
            Action::Map => {
                current = prompt_selection(dataset, &current)?;
                map(dataset, &current, multi, pretty).await?;
            }
            Action::Export => {
                current = prompt_selection(dataset, &current)?;
                let output: String = Input::new()
                    .with_prompt("Output CSV file")
                    .default("inspections_export.csv".to_string())
                    .interact_text()?;
                match commands::export(dataset, &current, &PathBuf::from(&output)) {
                    Ok(count) => println!("Wrote {count} inspection(s) to {output}"),
                    Err(e) => log::error!("Export failed: {e}"),
                }
            }
        }
        println!();
    }

    Ok(())
}

/// Prompts for a place and a period, defaulting to the previous choice.
fn prompt_selection(
    dataset: &Dataset,
    previous: &Selection,
) -> Result<Selection, Box<dyn std::error::Error>> {
    let mut places: Vec<&str> = vec![ALL_PLACES];
    places.extend(dataset.places().iter().map(String::as_str));

    let default = previous
        .place
        .as_deref()
        .and_then(|place| places.iter().position(|p| *p == place))
        .unwrap_or(0);

    let idx = Select::new()
        .with_prompt("Place")
        .items(&places)
        .default(default)
        .max_length(20)
        .interact()?;
    let place = (idx > 0).then(|| places[idx].to_string());

    let period: PeriodFilter = Input::new()
        .with_prompt("Period (all, month, YYYY-MM-DD, or FROM..TO)")
        .default(previous.period)
        .interact_text()?;

    Ok(commands::selection(dataset, place, period)?)
}

async fn map(
    dataset: &Dataset,
    selection: &Selection,
    multi: &MultiProgress,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let geocode = Confirm::new()
        .with_prompt("Geocode places without coordinates?")
        .default(false)
        .interact()?;

    let overlay = if geocode {
        let cache: String = Input::new()
            .with_prompt("Geocode cache file (empty for none)")
            .allow_empty(true)
            .interact_text()?;
        let options = GeocodeOptions {
            config: None,
            cache: (!cache.trim().is_empty()).then(|| PathBuf::from(cache.trim())),
        };
        let progress = IndicatifProgress::batch_bar(multi, "Geocoding places");
        commands::map(dataset, selection, Some(&options), &progress).await?
    } else {
        commands::map(dataset, selection, None, &null_progress()).await?
    };

    println!("{}", commands::to_json(&overlay, pretty)?);
    Ok(())
}

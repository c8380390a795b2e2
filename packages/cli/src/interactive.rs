//! Interactive menu-driven dashboard.
//!
//! The submission form collects every field through typed prompts:
//! enumerated choices come from the taxonomy enums, dates and times are
//! validated as they are typed, and country options are populated from
//! the store. Malformed input never reaches the insert path.

use chrono::{Local, NaiveDate, NaiveTime};
use console::style;
use dialoguer::{Confirm, Input, Select};
use switchy_database::Database;
use traffic_log_database::{db, queries, reconcile};
use traffic_log_database_models::{FilterField, NewStop, SqlDialect, StopFilter, StopSchema};
use traffic_log_insights::{InsightKind, run_insight};
use traffic_log_stop_models::{DriverGender, IncidentType, StopDuration, VehicleType};

use crate::render;

/// Top-level actions in the dashboard menu.
enum MenuAction {
    Recent,
    Filtered,
    Submit,
    Insights,
    Serve,
    Quit,
}

impl MenuAction {
    const ALL: &[Self] = &[
        Self::Recent,
        Self::Filtered,
        Self::Submit,
        Self::Insights,
        Self::Serve,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Recent => "Show recent stop records",
            Self::Filtered => "Filter stop records",
            Self::Submit => "Submit a new stop record",
            Self::Insights => "Run an insight",
            Self::Serve => "Start the API server",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the interactive dashboard loop.
///
/// Connects to the store, reconciles the active stop table once, then
/// presents the menu until the operator quits.
///
/// # Errors
///
/// Returns an error if the database connection, reconciliation, user
/// prompts, or any operation fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (db, dialect) = db::connect_from_env().await?;
    let schema = db::schema_from_env();

    reconcile::reconcile(db.as_ref(), dialect, schema).await?;

    let total = queries::count_stops(db.as_ref(), schema).await?;
    println!();
    println!("{}", style("Traffic Stop Dashboard").bold());
    println!("{total} record(s) in {}", schema.table());

    let labels: Vec<&str> = MenuAction::ALL.iter().map(MenuAction::label).collect();
    let mut selected = InsightKind::default();

    loop {
        println!();
        let idx = Select::new()
            .with_prompt("Dashboard")
            .items(&labels)
            .default(0)
            .interact()?;

        match MenuAction::ALL[idx] {
            MenuAction::Recent => {
                let rows =
                    queries::recent_stops(db.as_ref(), dialect, schema, &StopFilter::default())
                        .await?;
                render::stops_table(&rows);
            }
            MenuAction::Filtered => handle_filtered(db.as_ref(), dialect, schema).await?,
            MenuAction::Submit => handle_submit(db.as_ref(), dialect, schema).await?,
            MenuAction::Insights => {
                selected = handle_insights(db.as_ref(), dialect, schema, selected).await?;
            }
            MenuAction::Serve => {
                traffic_log_server::run_server().await?;
                break;
            }
            MenuAction::Quit => break,
        }
    }

    Ok(())
}

/// Prompts for filters, then shows the matching records.
async fn handle_filtered(
    db: &dyn Database,
    dialect: SqlDialect,
    schema: StopSchema,
) -> Result<(), Box<dyn std::error::Error>> {
    let country = pick_filter(db, schema, FilterField::Country, "Country").await?;
    let violation = pick_filter(db, schema, FilterField::Violation, "Violation").await?;

    let limit_str: String = Input::new()
        .with_prompt("Max records to show")
        .default("10".to_string())
        .interact_text()?;
    let limit = limit_str.parse().unwrap_or(10);

    let filter = StopFilter {
        country,
        violation,
        limit,
    };
    let rows = queries::recent_stops(db, dialect, schema, &filter).await?;
    render::stops_table(&rows);

    Ok(())
}

/// Presents the distinct values of a field with an "(any)" escape.
async fn pick_filter(
    db: &dyn Database,
    schema: StopSchema,
    field: FilterField,
    prompt: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let values = queries::distinct_values(db, schema, field).await?;
    if values.is_empty() {
        return Ok(None);
    }

    let mut labels = vec!["(any)".to_string()];
    labels.extend(values.iter().cloned());

    let idx = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(if idx == 0 {
        None
    } else {
        Some(values[idx - 1].clone())
    })
}

/// Collects and inserts one stop record.
async fn handle_submit(
    db: &dyn Database,
    dialect: SqlDialect,
    schema: StopSchema,
) -> Result<(), Box<dyn std::error::Error>> {
    let stop = prompt_new_stop(db, schema).await?;
    queries::insert_stop(db, dialect, schema, &stop).await?;
    println!("{}", style("Stop record submitted.").green());

    Ok(())
}

/// Collects a new stop record through typed prompts.
///
/// # Errors
///
/// Returns an error if a prompt or the country lookup fails.
pub async fn prompt_new_stop(
    db: &dyn Database,
    schema: StopSchema,
) -> Result<NewStop, Box<dyn std::error::Error>> {
    let officer_name: String = Input::new().with_prompt("Officer name").interact_text()?;
    let incident_type = select_enum("Incident type", IncidentType::all())?;
    let driver_name: String = Input::new().with_prompt("Driver name").interact_text()?;
    let vehicle_type = select_enum("Vehicle type", VehicleType::all())?;

    let vehicle_number: String = Input::new()
        .with_prompt("Vehicle number (blank to skip)")
        .allow_empty(true)
        .interact_text()?;
    let vehicle_number = (!vehicle_number.is_empty()).then_some(vehicle_number);

    let location: String = Input::new().with_prompt("Location").interact_text()?;
    let country = prompt_country(db, schema).await?;

    let date_str: String = Input::new()
        .with_prompt("Stop date (YYYY-MM-DD)")
        .default(Local::now().date_naive().to_string())
        .validate_with(|input: &String| {
            input
                .parse::<NaiveDate>()
                .map(|_| ())
                .map_err(|_| "Enter a date as YYYY-MM-DD")
        })
        .interact_text()?;
    let stop_date = date_str.parse::<NaiveDate>()?;

    let stop_time = if Confirm::new()
        .with_prompt("Record a stop time?")
        .default(true)
        .interact()?
    {
        let time_str: String = Input::new()
            .with_prompt("Stop time (HH:MM)")
            .validate_with(|input: &String| {
                parse_time(input).map(|_| ()).ok_or("Enter a time as HH:MM")
            })
            .interact_text()?;
        parse_time(&time_str)
    } else {
        None
    };

    let violation: String = Input::new().with_prompt("Violation").interact_text()?;

    let driver_gender = select_optional_enum("Driver gender", DriverGender::all())?;

    let age_str: String = Input::new()
        .with_prompt("Driver age (blank to skip)")
        .allow_empty(true)
        .interact_text()?;
    let driver_age = age_str.parse::<i32>().ok();

    let search_conducted = Confirm::new()
        .with_prompt("Was a search conducted?")
        .default(false)
        .interact()?;
    let is_arrested = Confirm::new()
        .with_prompt("Was the driver arrested?")
        .default(false)
        .interact()?;
    let stop_duration = select_optional_enum("Stop duration", StopDuration::all())?;

    Ok(NewStop {
        officer_name,
        incident_type,
        driver_name,
        vehicle_type,
        vehicle_number,
        location,
        country,
        stop_date,
        stop_time,
        violation,
        driver_gender,
        driver_age,
        search_conducted,
        is_arrested,
        stop_duration,
    })
}

/// Country picker: known values from the store, a manual-entry escape,
/// and a skip.
async fn prompt_country(
    db: &dyn Database,
    schema: StopSchema,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let known = queries::distinct_values(db, schema, FilterField::Country).await?;

    let mut labels = known.clone();
    labels.push("Other (type manually)".to_string());
    labels.push("(skip)".to_string());

    let idx = Select::new()
        .with_prompt("Country")
        .items(&labels)
        .default(0)
        .interact()?;

    if idx < known.len() {
        return Ok(Some(known[idx].clone()));
    }
    if idx == known.len() {
        let country: String = Input::new().with_prompt("Country").interact_text()?;
        return Ok((!country.is_empty()).then_some(country));
    }

    Ok(None)
}

/// Insight picker, then run and render. The picker opens on the last
/// selection, which persists until replaced.
async fn handle_insights(
    db: &dyn Database,
    dialect: SqlDialect,
    schema: StopSchema,
    selected: InsightKind,
) -> Result<InsightKind, Box<dyn std::error::Error>> {
    let labels: Vec<&str> = InsightKind::ALL.iter().map(|kind| kind.title()).collect();

    let idx = Select::new()
        .with_prompt("Insights")
        .items(&labels)
        .default(catalog_index(selected))
        .interact()?;
    let kind = InsightKind::ALL[idx];

    let result = run_insight(db, dialect, schema, kind).await?;
    render::insight(&result);

    Ok(kind)
}

/// Position of an insight in the catalog, for the picker default.
fn catalog_index(selected: InsightKind) -> usize {
    InsightKind::ALL
        .iter()
        .position(|kind| *kind == selected)
        .unwrap_or(0)
}

fn select_enum<T: Copy + ToString>(
    prompt: &str,
    options: &[T],
) -> Result<T, Box<dyn std::error::Error>> {
    let labels: Vec<String> = options.iter().map(ToString::to_string).collect();

    let idx = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(options[idx])
}

fn select_optional_enum<T: Copy + ToString>(
    prompt: &str,
    options: &[T],
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let mut labels: Vec<String> = options.iter().map(ToString::to_string).collect();
    labels.push("(skip)".to_string());

    let idx = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(options.get(idx).copied())
}

fn parse_time(input: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_index_round_trips_every_insight() {
        for (idx, kind) in InsightKind::ALL.iter().enumerate() {
            assert_eq!(catalog_index(*kind), idx);
        }
        assert_eq!(catalog_index(InsightKind::default()), 0);
    }

    #[test]
    fn times_parse_with_and_without_seconds() {
        assert_eq!(
            parse_time("14:30"),
            NaiveTime::from_hms_opt(14, 30, 0)
        );
        assert_eq!(
            parse_time("14:30:45"),
            NaiveTime::from_hms_opt(14, 30, 45)
        );
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("nope"), None);
    }
}

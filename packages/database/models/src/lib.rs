#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Store-facing types for the traffic log.
//!
//! These types describe the shapes of data as stored in and retrieved
//! from the stop tables: the two table variants ([`StopSchema`]), the SQL
//! dialect tag ([`SqlDialect`]) with its small fragment vocabulary, the
//! submission payload ([`NewStop`]), and the decoded row ([`StopRow`]).
//! They are distinct from the JSON API types in
//! `traffic_log_server_models`.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use traffic_log_stop_models::{DriverGender, IncidentType, StopDuration, VehicleType};

/// SQL dialect of the connected store.
///
/// The store layer speaks raw SQL through `switchy_database`, so the few
/// expressions that differ between backends (catalog lookup, date+time
/// combination, hour extraction, rounding casts) are selected by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlDialect {
    /// `PostgreSQL` over the raw postgres backend.
    Postgres,
    /// `SQLite` over the rusqlite backend.
    Sqlite,
}

impl SqlDialect {
    /// Expression rendering a timestamp column as `YYYY-MM-DD HH:MM:SS`
    /// text, for display reads that must decode identically on both
    /// backends.
    #[must_use]
    pub fn datetime_text_expr(self, column: &str) -> String {
        match self {
            Self::Postgres => format!("to_char({column}, 'YYYY-MM-DD HH24:MI:SS')"),
            Self::Sqlite => column.to_string(),
        }
    }

    /// Expression extracting the zero-padded hour-of-day (`'00'`-`'23'`)
    /// from a timestamp column as text. Zero-padding keeps lexical
    /// ordering equal to numeric ordering.
    #[must_use]
    pub fn hour_label_expr(self, column: &str) -> String {
        match self {
            Self::Postgres => format!("to_char({column}, 'HH24')"),
            Self::Sqlite => format!("strftime('%H', {column})"),
        }
    }

    /// Expression extracting the hour-of-day as an integer.
    #[must_use]
    pub fn hour_int_expr(self, column: &str) -> String {
        match self {
            Self::Postgres => format!("EXTRACT(HOUR FROM {column})::int"),
            Self::Sqlite => format!("CAST(strftime('%H', {column}) AS INTEGER)"),
        }
    }

    /// Aggregate expression computing the percentage of rows where `flag`
    /// is true, rounded to 2 decimals, decoding as a double on both
    /// backends.
    #[must_use]
    pub fn pct_expr(self, flag: &str) -> String {
        let avg = format!("ROUND(AVG(CASE WHEN {flag} THEN 100.0 ELSE 0.0 END), 2)");
        match self {
            // ROUND(numeric, 2) stays numeric; cast so the binary
            // protocol hands back a float8.
            Self::Postgres => format!("{avg}::float8"),
            Self::Sqlite => avg,
        }
    }
}

/// The two stop-table variants served by the dashboard.
///
/// `vehicle_stops` is the reconciled schema: columns are probed and
/// backfilled at session start. `police_traffic_logs` is a fixed,
/// pre-existing schema that is never altered. Column names differ between
/// the two for historical reasons; the accessors below are the only place
/// that mapping lives.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum StopSchema {
    /// The `vehicle_stops` table (reconciled at startup).
    #[serde(rename = "vehicle_stops")]
    #[strum(serialize = "vehicle_stops")]
    VehicleStops,
    /// The `police_traffic_logs` table (fixed schema).
    #[serde(rename = "police_traffic_logs")]
    #[strum(serialize = "police_traffic_logs")]
    PoliceTrafficLogs,
}

impl StopSchema {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::VehicleStops, Self::PoliceTrafficLogs]
    }

    /// Table name in the store. Matches the `Display` form.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::VehicleStops => "vehicle_stops",
            Self::PoliceTrafficLogs => "police_traffic_logs",
        }
    }

    /// Column holding the raw violation text.
    #[must_use]
    pub const fn violation_col(self) -> &'static str {
        match self {
            Self::VehicleStops => "violation_raw",
            Self::PoliceTrafficLogs => "violation",
        }
    }

    /// Column holding the drug-involvement flag.
    #[must_use]
    pub const fn drug_col(self) -> &'static str {
        match self {
            Self::VehicleStops => "drug_related",
            Self::PoliceTrafficLogs => "drugs_related_stop",
        }
    }

    /// Whether this schema has a free-text `location` column.
    #[must_use]
    pub const fn has_location(self) -> bool {
        matches!(self, Self::VehicleStops)
    }

    /// Place label expression: country, falling back through location
    /// (where present) to the literal `'Unknown'`.
    #[must_use]
    pub const fn place_expr(self) -> &'static str {
        match self {
            Self::VehicleStops => "COALESCE(country, location, 'Unknown')",
            Self::PoliceTrafficLogs => "COALESCE(country, 'Unknown')",
        }
    }

    /// Whether the reconciler runs against this schema. The
    /// `police_traffic_logs` table is a fixed external contract and is
    /// never altered.
    #[must_use]
    pub const fn needs_reconciliation(self) -> bool {
        matches!(self, Self::VehicleStops)
    }
}

/// A new stop record as collected by the submission form.
///
/// Every field is already typed by the form widget that produced it
/// (enumerated choices parse into the taxonomy enums, dates and times
/// into chrono types), so no further validation happens downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStop {
    /// Name of the reporting officer.
    pub officer_name: String,
    /// Why the stop was initiated.
    pub incident_type: IncidentType,
    /// Name of the stopped driver.
    pub driver_name: String,
    /// Kind of vehicle stopped.
    pub vehicle_type: VehicleType,
    /// License plate / registration, if recorded.
    pub vehicle_number: Option<String>,
    /// Free-text location of the stop.
    pub location: String,
    /// Country, if known at submission time.
    pub country: Option<String>,
    /// Date of the stop.
    pub stop_date: NaiveDate,
    /// Time of day of the stop, if recorded.
    pub stop_time: Option<NaiveTime>,
    /// Raw violation text.
    pub violation: String,
    /// Driver gender, if recorded.
    pub driver_gender: Option<DriverGender>,
    /// Driver age, if recorded.
    pub driver_age: Option<i32>,
    /// Whether a search was conducted.
    pub search_conducted: bool,
    /// Whether the driver was arrested.
    pub is_arrested: bool,
    /// Duration bucket, if recorded.
    pub stop_duration: Option<StopDuration>,
}

/// Filters for reading recent stop records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopFilter {
    /// Exact-match country filter.
    pub country: Option<String>,
    /// Exact-match violation filter.
    pub violation: Option<String>,
    /// Maximum number of rows to return, newest first.
    pub limit: u32,
}

impl Default for StopFilter {
    fn default() -> Self {
        Self {
            country: None,
            violation: None,
            limit: 10,
        }
    }
}

/// Columns the dashboard exposes as dynamically-populated option sets.
///
/// Keeping this a closed enum means operator input never reaches SQL as
/// an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    /// Distinct countries.
    Country,
    /// Distinct raw violation texts.
    Violation,
}

impl FilterField {
    /// Column name for this field under the given schema.
    #[must_use]
    pub const fn column(self, schema: StopSchema) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Violation => schema.violation_col(),
        }
    }
}

/// A stop record as read back from the store for display.
///
/// Timestamps are rendered to text in SQL so both backends decode
/// identically; all other nullable columns stay `Option`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopRow {
    /// Primary key.
    pub id: i64,
    /// Reporting officer.
    pub officer_name: Option<String>,
    /// Why the stop was initiated.
    pub incident_type: Option<String>,
    /// Stopped driver's name.
    pub driver_name: Option<String>,
    /// Kind of vehicle.
    pub vehicle_type: Option<String>,
    /// License plate / registration.
    pub vehicle_number: Option<String>,
    /// Free-text location.
    pub location: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Derived stop timestamp, rendered as `YYYY-MM-DD HH:MM:SS`.
    pub stop_datetime: Option<String>,
    /// Raw violation text.
    pub violation: Option<String>,
    /// Drug-involvement flag.
    pub drug_related: Option<bool>,
    /// Whether a search was conducted.
    pub search_conducted: Option<bool>,
    /// Whether the driver was arrested.
    pub is_arrested: Option<bool>,
    /// Driver gender.
    pub driver_gender: Option<String>,
    /// Driver age.
    pub driver_age: Option<i32>,
    /// Driver race.
    pub driver_race: Option<String>,
    /// Duration bucket label.
    pub stop_duration: Option<String>,
}

/// One bar of a chart-ready projection: a label and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    /// Bar label.
    pub label: String,
    /// Bar value (count, percentage, or minutes, per the insight).
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_table_matches_display() {
        for schema in StopSchema::all() {
            assert_eq!(schema.to_string(), schema.table());
            assert_eq!(schema.table().parse::<StopSchema>().unwrap(), *schema);
        }
    }

    #[test]
    fn violation_filter_follows_schema_mapping() {
        assert_eq!(
            FilterField::Violation.column(StopSchema::VehicleStops),
            "violation_raw"
        );
        assert_eq!(
            FilterField::Violation.column(StopSchema::PoliceTrafficLogs),
            "violation"
        );
        assert_eq!(FilterField::Country.column(StopSchema::VehicleStops), "country");
    }

    #[test]
    fn sqlite_fragments_have_no_casts() {
        let expr = SqlDialect::Sqlite.pct_expr("is_arrested");
        assert!(!expr.contains("::"));
        let expr = SqlDialect::Postgres.pct_expr("is_arrested");
        assert!(expr.ends_with("::float8"));
    }

    #[test]
    fn hour_labels_are_zero_padded_expressions() {
        assert_eq!(
            SqlDialect::Sqlite.hour_label_expr("stop_datetime"),
            "strftime('%H', stop_datetime)"
        );
        assert_eq!(
            SqlDialect::Postgres.hour_label_expr("stop_datetime"),
            "to_char(stop_datetime, 'HH24')"
        );
    }
}

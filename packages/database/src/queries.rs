//! Record queries for the stop tables.
//!
//! All reads and writes go through raw parameterized SQL via
//! `switchy_database`. Identifiers interpolated into query strings come
//! only from the fixed [`StopSchema`] column mapping, never from
//! operator input.

use std::fmt::Write as _;

use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};
use traffic_log_database_models::{
    FilterField, NewStop, SqlDialect, StopFilter, StopRow, StopSchema,
};

use crate::DbError;

/// Cast applied to a text parameter on backends that type-check
/// placeholders against the target column.
#[derive(Clone, Copy)]
enum ParamCast {
    None,
    Date,
    Time,
    Timestamp,
}

impl ParamCast {
    fn placeholder(self, dialect: SqlDialect, idx: u32) -> String {
        let suffix = match (dialect, self) {
            (SqlDialect::Postgres, Self::Date) => "::date",
            (SqlDialect::Postgres, Self::Time) => "::time",
            (SqlDialect::Postgres, Self::Timestamp) => "::timestamp",
            _ => "",
        };
        format!("${idx}{suffix}")
    }
}

/// Inserts one new stop record collected by the submission form.
///
/// Derived fields are computed here as well: `stop_datetime` from the
/// submitted date and time, and the drug flag from the violation text.
/// The historical dashboard skipped both at insert time, leaving new
/// rows inconsistent with backfilled ones until the next reconciliation
/// of a fresh store; computing them up front keeps every row honoring
/// the same invariants.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_stop(
    db: &dyn Database,
    dialect: SqlDialect,
    schema: StopSchema,
    stop: &NewStop,
) -> Result<u64, DbError> {
    let mut columns: Vec<&str> = Vec::new();
    let mut placeholders: Vec<String> = Vec::new();
    let mut params: Vec<DatabaseValue> = Vec::new();

    let mut push = |column: &'static str, value: DatabaseValue, cast: ParamCast| {
        columns.push(column);
        #[allow(clippy::cast_possible_truncation)]
        let idx = params.len() as u32 + 1;
        placeholders.push(cast.placeholder(dialect, idx));
        params.push(value);
    };

    let date_text = stop.stop_date.format("%Y-%m-%d").to_string();
    let time_text = stop.stop_time.map(|t| t.format("%H:%M:%S").to_string());
    let datetime_text = stop.stop_time.map_or_else(
        || format!("{date_text} 00:00:00"),
        |t| format!("{date_text} {}", t.format("%H:%M:%S")),
    );
    let drug_related = stop.violation.to_lowercase().contains("drug");

    if schema.has_location() {
        push(
            "officer_name",
            DatabaseValue::String(stop.officer_name.clone()),
            ParamCast::None,
        );
        push(
            "incident_type",
            DatabaseValue::String(stop.incident_type.to_string()),
            ParamCast::None,
        );
        push(
            "driver_name",
            DatabaseValue::String(stop.driver_name.clone()),
            ParamCast::None,
        );
        push(
            "vehicle_type",
            DatabaseValue::String(stop.vehicle_type.to_string()),
            ParamCast::None,
        );
        push(
            "location",
            DatabaseValue::String(stop.location.clone()),
            ParamCast::None,
        );
    }

    push(
        "vehicle_number",
        stop.vehicle_number
            .as_ref()
            .map_or(DatabaseValue::Null, |v| DatabaseValue::String(v.clone())),
        ParamCast::None,
    );
    push(
        "country",
        stop.country
            .as_ref()
            .map_or(DatabaseValue::Null, |c| DatabaseValue::String(c.clone())),
        ParamCast::None,
    );

    let date_column = match schema {
        StopSchema::VehicleStops => "date",
        StopSchema::PoliceTrafficLogs => "stop_date",
    };
    push(date_column, DatabaseValue::String(date_text), ParamCast::Date);
    push(
        "stop_time",
        time_text.map_or(DatabaseValue::Null, DatabaseValue::String),
        ParamCast::Time,
    );
    push(
        schema.violation_col(),
        DatabaseValue::String(stop.violation.clone()),
        ParamCast::None,
    );
    push(
        "driver_gender",
        stop.driver_gender
            .map_or(DatabaseValue::Null, |g| DatabaseValue::String(g.to_string())),
        ParamCast::None,
    );
    push(
        "driver_age",
        stop.driver_age
            .map_or(DatabaseValue::Null, DatabaseValue::Int32),
        ParamCast::None,
    );
    push(
        "search_conducted",
        DatabaseValue::Bool(stop.search_conducted),
        ParamCast::None,
    );
    push(
        "is_arrested",
        DatabaseValue::Bool(stop.is_arrested),
        ParamCast::None,
    );
    push(
        "stop_duration",
        stop.stop_duration
            .map_or(DatabaseValue::Null, |d| DatabaseValue::String(d.to_string())),
        ParamCast::None,
    );
    push(
        "stop_datetime",
        DatabaseValue::String(datetime_text),
        ParamCast::Timestamp,
    );
    push(
        schema.drug_col(),
        DatabaseValue::Bool(drug_related),
        ParamCast::None,
    );

    let sql = format!(
        "INSERT INTO {table} ({columns}) VALUES ({placeholders})",
        table = schema.table(),
        columns = columns.join(", "),
        placeholders = placeholders.join(", "),
    );

    let inserted = db.exec_raw_params(&sql, &params).await?;
    log::debug!("Inserted {inserted} stop into {}", schema.table());

    Ok(inserted)
}

/// Reads the latest stop records, newest first, with optional equality
/// filters on country and violation.
///
/// Reads are never cached, so a record inserted by [`insert_stop`] is
/// visible to the very next call.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn recent_stops(
    db: &dyn Database,
    dialect: SqlDialect,
    schema: StopSchema,
    filter: &StopFilter,
) -> Result<Vec<StopRow>, DbError> {
    let missing_text = "CAST(NULL AS TEXT)";
    let (officer, incident, driver, vehicle, location) = if schema.has_location() {
        (
            "officer_name",
            "incident_type",
            "driver_name",
            "vehicle_type",
            "location",
        )
    } else {
        (missing_text, missing_text, missing_text, missing_text, missing_text)
    };

    let mut sql = format!(
        "SELECT CAST(id AS BIGINT) AS id,
                {officer} AS officer_name,
                {incident} AS incident_type,
                {driver} AS driver_name,
                {vehicle} AS vehicle_type,
                vehicle_number,
                {location} AS location,
                country,
                {datetime} AS stop_datetime,
                {violation} AS violation,
                {drug} AS drug_related,
                search_conducted,
                is_arrested,
                driver_gender,
                driver_age,
                driver_race,
                stop_duration
         FROM {table}
         WHERE 1=1",
        datetime = dialect.datetime_text_expr("stop_datetime"),
        violation = schema.violation_col(),
        drug = schema.drug_col(),
        table = schema.table(),
    );

    let mut params: Vec<DatabaseValue> = Vec::new();
    let mut param_idx = 1u32;

    if let Some(country) = &filter.country {
        write!(sql, " AND country = ${param_idx}").unwrap();
        params.push(DatabaseValue::String(country.clone()));
        param_idx += 1;
    }

    if let Some(violation) = &filter.violation {
        write!(sql, " AND {} = ${param_idx}", schema.violation_col()).unwrap();
        params.push(DatabaseValue::String(violation.clone()));
        param_idx += 1;
    }

    write!(sql, " ORDER BY id DESC LIMIT ${param_idx}").unwrap();
    params.push(DatabaseValue::Int64(i64::from(filter.limit)));

    let rows = db.query_raw_params(&sql, &params).await?;

    let mut stops = Vec::with_capacity(rows.len());
    for row in &rows {
        stops.push(StopRow {
            id: row.to_value("id").unwrap_or(0),
            officer_name: row.to_value("officer_name").unwrap_or(None),
            incident_type: row.to_value("incident_type").unwrap_or(None),
            driver_name: row.to_value("driver_name").unwrap_or(None),
            vehicle_type: row.to_value("vehicle_type").unwrap_or(None),
            vehicle_number: row.to_value("vehicle_number").unwrap_or(None),
            location: row.to_value("location").unwrap_or(None),
            country: row.to_value("country").unwrap_or(None),
            stop_datetime: row.to_value("stop_datetime").unwrap_or(None),
            violation: row.to_value("violation").unwrap_or(None),
            drug_related: row.to_value("drug_related").unwrap_or(None),
            search_conducted: row.to_value("search_conducted").unwrap_or(None),
            is_arrested: row.to_value("is_arrested").unwrap_or(None),
            driver_gender: row.to_value("driver_gender").unwrap_or(None),
            driver_age: row.to_value("driver_age").unwrap_or(None),
            driver_race: row.to_value("driver_race").unwrap_or(None),
            stop_duration: row.to_value("stop_duration").unwrap_or(None),
        });
    }

    Ok(stops)
}

/// Returns the distinct non-empty values of a filterable field, sorted,
/// for dynamically-populated option sets.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn distinct_values(
    db: &dyn Database,
    schema: StopSchema,
    field: FilterField,
) -> Result<Vec<String>, DbError> {
    let column = field.column(schema);
    let rows = db
        .query_raw_params(
            &format!(
                "SELECT DISTINCT {column} AS value
                 FROM {table}
                 WHERE {column} IS NOT NULL AND {column} <> ''
                 ORDER BY value",
                table = schema.table(),
            ),
            &[],
        )
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| row.to_value("value").unwrap_or(None))
        .collect())
}

/// Counts all rows in the active stop table.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn count_stops(db: &dyn Database, schema: StopSchema) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT COUNT(*) AS total FROM {}", schema.table()),
            &[],
        )
        .await?;

    Ok(rows.first().map_or(0, |row| row.to_value("total").unwrap_or(0)))
}

//! Schema reconciliation for the `vehicle_stops` table.
//!
//! The legacy table arrives in unpredictable shapes: derived columns may
//! be missing, locations empty, and the date may live under one of
//! several historical column names. Reconciliation is an ordered list of
//! idempotent migration steps — ensure columns, then backfill derived
//! values — executed inside a single transaction so a partial schema
//! change never persists. Columns are detected via catalog lookup
//! (`information_schema` on Postgres, `pragma_table_info` on `SQLite`),
//! never by attempting an `ALTER` and catching the failure.
//!
//! The `police_traffic_logs` table is a fixed external contract and is
//! never touched.

use switchy_database::{Database, DatabaseValue};
use traffic_log_database_models::{SqlDialect, StopSchema};

use crate::DbError;

/// Columns the reconciler guarantees to exist, with their declared types.
/// The type names are valid on both backends.
const ENSURED_COLUMNS: &[(&str, &str)] = &[
    ("drug_related", "BOOLEAN"),
    ("stop_datetime", "TIMESTAMP"),
    ("location", "TEXT"),
    ("country", "TEXT"),
];

/// Date-bearing column candidates, probed in priority order.
const DATE_CANDIDATES: &[&str] = &["date", "stop_date", "incident_date", "date_of_incident"];

/// What a reconciliation run actually changed.
///
/// A second run against the same store reports zeroes everywhere, which
/// is how the idempotence tests assert "no side effects beyond the first
/// successful run".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Columns that were added by this run.
    pub columns_added: Vec<String>,
    /// Rows whose drug flag was backfilled from the violation text.
    pub drug_flagged: u64,
    /// Rows whose empty/null location was set to `'Unknown'`.
    pub locations_defaulted: u64,
    /// Rows whose country was inferred from the location text.
    pub countries_inferred: u64,
    /// Rows whose `stop_datetime` was derived.
    pub datetimes_derived: u64,
    /// The date-bearing column the probe selected, if any.
    pub date_column: Option<String>,
}

/// Ensures expected columns exist on `vehicle_stops` and backfills
/// derived values, all inside one transaction.
///
/// Safe to invoke repeatedly; every step is conditioned on the target
/// column (or value) still being absent. For schemas that are not
/// reconciled ([`StopSchema::needs_reconciliation`]) this is a no-op.
///
/// # Errors
///
/// Returns [`DbError`] if any probe, `ALTER`, or backfill fails; the
/// transaction rolls back and nothing partial persists.
pub async fn reconcile(
    db: &dyn Database,
    dialect: SqlDialect,
    schema: StopSchema,
) -> Result<ReconcileReport, DbError> {
    if !schema.needs_reconciliation() {
        log::debug!("{} is a fixed schema; skipping reconciliation", schema.table());
        return Ok(ReconcileReport::default());
    }

    let table = schema.table();
    let txn = db.begin_transaction().await?;
    let mut report = ReconcileReport::default();

    ensure_base_table(txn.as_ref(), dialect, table).await?;

    for (column, column_type) in ENSURED_COLUMNS {
        if !column_exists(txn.as_ref(), dialect, table, column).await? {
            txn.exec_raw(&format!("ALTER TABLE {table} ADD COLUMN {column} {column_type}"))
                .await?;
            report.columns_added.push((*column).to_string());
        }
    }

    report.drug_flagged = txn
        .exec_raw_params(
            &format!(
                "UPDATE {table}
                 SET drug_related = TRUE
                 WHERE drug_related IS NULL
                   AND lower({violation}) LIKE '%drug%'",
                violation = schema.violation_col(),
            ),
            &[],
        )
        .await?;

    report.locations_defaulted = txn
        .exec_raw_params(
            &format!(
                "UPDATE {table}
                 SET location = 'Unknown'
                 WHERE location IS NULL OR location = ''"
            ),
            &[],
        )
        .await?;

    report.countries_inferred = txn
        .exec_raw_params(
            &format!(
                "UPDATE {table}
                 SET country = 'India'
                 WHERE country IS NULL
                   AND lower(location) LIKE '%chennai%'"
            ),
            &[],
        )
        .await?;

    let mut date_column = None;
    for candidate in DATE_CANDIDATES {
        if column_exists(txn.as_ref(), dialect, table, candidate).await? {
            date_column = Some(*candidate);
            break;
        }
    }
    report.date_column = date_column.map(ToString::to_string);

    let has_stop_time = column_exists(txn.as_ref(), dialect, table, "stop_time").await?;

    report.datetimes_derived =
        backfill_datetimes(txn.as_ref(), dialect, table, date_column, has_stop_time).await?;

    txn.commit().await?;

    if report == ReconcileReport::default() {
        log::debug!("{table} already reconciled");
    } else {
        log::info!(
            "Reconciled {table}: added {:?}, flagged {} drug rows, defaulted {} locations, \
             inferred {} countries, derived {} datetimes",
            report.columns_added,
            report.drug_flagged,
            report.locations_defaulted,
            report.countries_inferred,
            report.datetimes_derived,
        );
    }

    Ok(report)
}

/// Creates the base `vehicle_stops` table on a fresh store.
///
/// Existing deployments keep whatever shape they have; the column-ensure
/// steps above fill in the gaps.
async fn ensure_base_table(
    db: &dyn Database,
    dialect: SqlDialect,
    table: &str,
) -> Result<(), DbError> {
    let id_column = match dialect {
        SqlDialect::Postgres => "id SERIAL PRIMARY KEY",
        SqlDialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
    };
    let (date_type, time_type) = match dialect {
        SqlDialect::Postgres => ("DATE", "TIME"),
        SqlDialect::Sqlite => ("TEXT", "TEXT"),
    };

    db.exec_raw(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            {id_column},
            officer_name TEXT,
            incident_type TEXT,
            driver_name TEXT,
            vehicle_type TEXT,
            vehicle_number TEXT,
            location TEXT,
            date {date_type},
            stop_time {time_type},
            violation_raw TEXT,
            driver_gender TEXT,
            driver_age INTEGER,
            driver_race TEXT,
            search_conducted BOOLEAN,
            search_type TEXT,
            is_arrested BOOLEAN,
            stop_duration TEXT
        )"
    ))
    .await?;

    Ok(())
}

/// Catalog lookup: does `table.column` exist?
async fn column_exists(
    db: &dyn Database,
    dialect: SqlDialect,
    table: &str,
    column: &str,
) -> Result<bool, DbError> {
    let sql = match dialect {
        SqlDialect::Postgres => {
            "SELECT column_name FROM information_schema.columns
             WHERE table_name = $1 AND column_name = $2"
        }
        SqlDialect::Sqlite => "SELECT name FROM pragma_table_info($1) WHERE name = $2",
    };

    let rows = db
        .query_raw_params(
            sql,
            &[
                DatabaseValue::String(table.to_string()),
                DatabaseValue::String(column.to_string()),
            ],
        )
        .await?;

    Ok(!rows.is_empty())
}

/// Derives `stop_datetime` for rows that still lack it.
///
/// Date + time when both columns exist, midnight of the date when only a
/// date exists, current date + time when only a time exists. Rows with
/// neither stay null.
async fn backfill_datetimes(
    db: &dyn Database,
    dialect: SqlDialect,
    table: &str,
    date_column: Option<&str>,
    has_stop_time: bool,
) -> Result<u64, DbError> {
    let mut derived = 0u64;

    if let Some(date) = date_column {
        if has_stop_time {
            let combine = match dialect {
                SqlDialect::Postgres => format!("(({date}::text)::date + stop_time::time)"),
                SqlDialect::Sqlite => format!("datetime({date} || ' ' || stop_time)"),
            };
            derived += db
                .exec_raw_params(
                    &format!(
                        "UPDATE {table}
                         SET stop_datetime = {combine}
                         WHERE stop_datetime IS NULL
                           AND {date} IS NOT NULL
                           AND stop_time IS NOT NULL"
                    ),
                    &[],
                )
                .await?;
        }

        // Rows with a date but no usable time get midnight.
        let midnight = match dialect {
            SqlDialect::Postgres => format!("(({date}::text)::date)::timestamp"),
            SqlDialect::Sqlite => format!("datetime({date})"),
        };
        derived += db
            .exec_raw_params(
                &format!(
                    "UPDATE {table}
                     SET stop_datetime = {midnight}
                     WHERE stop_datetime IS NULL
                       AND {date} IS NOT NULL"
                ),
                &[],
            )
            .await?;
    } else if has_stop_time {
        let today_plus_time = match dialect {
            SqlDialect::Postgres => "(CURRENT_DATE + stop_time::time)".to_string(),
            SqlDialect::Sqlite => "datetime(date('now') || ' ' || stop_time)".to_string(),
        };
        derived += db
            .exec_raw_params(
                &format!(
                    "UPDATE {table}
                     SET stop_datetime = {today_plus_time}
                     WHERE stop_datetime IS NULL
                       AND stop_time IS NOT NULL"
                ),
                &[],
            )
            .await?;
    }

    Ok(derived)
}

#[cfg(test)]
mod tests {
    use moosicbox_json_utils::database::ToValue as _;
    use switchy_database_connection::init_sqlite_rusqlite;

    use super::*;

    async fn mem_db() -> Box<dyn Database> {
        init_sqlite_rusqlite(None).unwrap()
    }

    /// A legacy-shaped table: no derived columns at all.
    async fn legacy_table(db: &dyn Database) {
        db.exec_raw(
            "CREATE TABLE vehicle_stops (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                officer_name TEXT,
                violation_raw TEXT,
                date TEXT,
                stop_time TEXT
            )",
        )
        .await
        .unwrap();
    }

    async fn insert_legacy(db: &dyn Database, violation: &str, date: &str, time: Option<&str>) {
        db.exec_raw_params(
            "INSERT INTO vehicle_stops (violation_raw, date, stop_time) VALUES ($1, $2, $3)",
            &[
                DatabaseValue::String(violation.to_string()),
                DatabaseValue::String(date.to_string()),
                time.map_or(DatabaseValue::Null, |t| DatabaseValue::String(t.to_string())),
            ],
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn adds_missing_columns_and_reports_them() {
        let db = mem_db().await;
        legacy_table(db.as_ref()).await;

        let report = reconcile(db.as_ref(), SqlDialect::Sqlite, StopSchema::VehicleStops)
            .await
            .unwrap();

        assert_eq!(
            report.columns_added,
            vec!["drug_related", "stop_datetime", "location", "country"]
        );
        assert_eq!(report.date_column.as_deref(), Some("date"));
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let db = mem_db().await;
        legacy_table(db.as_ref()).await;
        insert_legacy(db.as_ref(), "Drug possession", "2024-01-05", Some("14:30")).await;

        let first = reconcile(db.as_ref(), SqlDialect::Sqlite, StopSchema::VehicleStops)
            .await
            .unwrap();
        assert_eq!(first.drug_flagged, 1);
        assert_eq!(first.datetimes_derived, 1);

        let second = reconcile(db.as_ref(), SqlDialect::Sqlite, StopSchema::VehicleStops)
            .await
            .unwrap();
        assert!(second.columns_added.is_empty());
        assert_eq!(second.drug_flagged, 0);
        assert_eq!(second.locations_defaulted, 0);
        assert_eq!(second.countries_inferred, 0);
        assert_eq!(second.datetimes_derived, 0);
    }

    #[tokio::test]
    async fn drug_flag_backfill_is_case_insensitive() {
        let db = mem_db().await;
        legacy_table(db.as_ref()).await;
        insert_legacy(db.as_ref(), "DRUG trafficking", "2024-01-01", None).await;
        insert_legacy(db.as_ref(), "Speeding", "2024-01-02", None).await;

        reconcile(db.as_ref(), SqlDialect::Sqlite, StopSchema::VehicleStops)
            .await
            .unwrap();

        let rows = db
            .query_raw_params(
                "SELECT violation_raw, drug_related FROM vehicle_stops ORDER BY id",
                &[],
            )
            .await
            .unwrap();
        let flag: Option<bool> = (&rows[0]).to_value("drug_related").unwrap_or(None);
        assert_eq!(flag, Some(true));
        let flag: Option<bool> = (&rows[1]).to_value("drug_related").unwrap_or(None);
        assert_eq!(flag, None);
    }

    #[tokio::test]
    async fn location_and_country_backfills() {
        let db = mem_db().await;
        db.exec_raw(
            "CREATE TABLE vehicle_stops (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                violation_raw TEXT,
                location TEXT,
                date TEXT
            )",
        )
        .await
        .unwrap();
        db.exec_raw(
            "INSERT INTO vehicle_stops (violation_raw, location) VALUES
                ('Speeding', ''),
                ('Speeding', NULL),
                ('Speeding', 'Chennai Central'),
                ('Speeding', 'Berlin')",
        )
        .await
        .unwrap();

        reconcile(db.as_ref(), SqlDialect::Sqlite, StopSchema::VehicleStops)
            .await
            .unwrap();

        let rows = db
            .query_raw_params("SELECT location, country FROM vehicle_stops ORDER BY id", &[])
            .await
            .unwrap();

        let location: String = (&rows[0]).to_value("location").unwrap_or_default();
        assert_eq!(location, "Unknown");
        let location: String = (&rows[1]).to_value("location").unwrap_or_default();
        assert_eq!(location, "Unknown");

        let country: Option<String> = (&rows[2]).to_value("country").unwrap_or(None);
        assert_eq!(country.as_deref(), Some("India"));
        let country: Option<String> = (&rows[3]).to_value("country").unwrap_or(None);
        assert_eq!(country, None);
    }

    #[tokio::test]
    async fn derives_datetime_from_date_and_time() {
        let db = mem_db().await;
        legacy_table(db.as_ref()).await;
        insert_legacy(db.as_ref(), "Speeding", "2024-01-05", Some("14:30")).await;

        reconcile(db.as_ref(), SqlDialect::Sqlite, StopSchema::VehicleStops)
            .await
            .unwrap();

        let rows = db
            .query_raw_params("SELECT stop_datetime FROM vehicle_stops", &[])
            .await
            .unwrap();
        let datetime: String = (&rows[0]).to_value("stop_datetime").unwrap_or_default();
        assert_eq!(datetime, "2024-01-05 14:30:00");
    }

    #[tokio::test]
    async fn derives_midnight_when_only_date_exists() {
        let db = mem_db().await;
        db.exec_raw(
            "CREATE TABLE vehicle_stops (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                violation_raw TEXT,
                date TEXT
            )",
        )
        .await
        .unwrap();
        db.exec_raw("INSERT INTO vehicle_stops (violation_raw, date) VALUES ('Speeding', '2024-03-01')")
            .await
            .unwrap();

        reconcile(db.as_ref(), SqlDialect::Sqlite, StopSchema::VehicleStops)
            .await
            .unwrap();

        let rows = db
            .query_raw_params("SELECT stop_datetime FROM vehicle_stops", &[])
            .await
            .unwrap();
        let datetime: String = (&rows[0]).to_value("stop_datetime").unwrap_or_default();
        assert_eq!(datetime, "2024-03-01 00:00:00");
    }

    #[tokio::test]
    async fn derives_today_plus_time_when_only_time_exists() {
        let db = mem_db().await;
        db.exec_raw(
            "CREATE TABLE vehicle_stops (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                violation_raw TEXT,
                stop_time TEXT
            )",
        )
        .await
        .unwrap();
        db.exec_raw("INSERT INTO vehicle_stops (violation_raw, stop_time) VALUES ('Speeding', '14:30')")
            .await
            .unwrap();

        // The store combines with its own current date (UTC); bracket the
        // run so a midnight rollover can't flake the assertion.
        let before = chrono::Utc::now().date_naive();
        let first = reconcile(db.as_ref(), SqlDialect::Sqlite, StopSchema::VehicleStops)
            .await
            .unwrap();
        let after = chrono::Utc::now().date_naive();

        assert_eq!(first.date_column, None);
        assert_eq!(first.datetimes_derived, 1);

        let rows = db
            .query_raw_params("SELECT stop_datetime FROM vehicle_stops", &[])
            .await
            .unwrap();
        let datetime: String = (&rows[0]).to_value("stop_datetime").unwrap_or_default();
        assert!(
            datetime == format!("{before} 14:30:00") || datetime == format!("{after} 14:30:00"),
            "unexpected derived timestamp: {datetime}"
        );

        let second = reconcile(db.as_ref(), SqlDialect::Sqlite, StopSchema::VehicleStops)
            .await
            .unwrap();
        assert_eq!(second.datetimes_derived, 0);
    }

    #[tokio::test]
    async fn date_probe_follows_priority_order() {
        let db = mem_db().await;
        db.exec_raw(
            "CREATE TABLE vehicle_stops (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                violation_raw TEXT,
                stop_date TEXT,
                incident_date TEXT
            )",
        )
        .await
        .unwrap();

        let report = reconcile(db.as_ref(), SqlDialect::Sqlite, StopSchema::VehicleStops)
            .await
            .unwrap();
        assert_eq!(report.date_column.as_deref(), Some("stop_date"));
    }

    #[tokio::test]
    async fn fixed_schema_is_left_alone() {
        let db = mem_db().await;

        let report = reconcile(db.as_ref(), SqlDialect::Sqlite, StopSchema::PoliceTrafficLogs)
            .await
            .unwrap();
        assert_eq!(report, ReconcileReport::default());

        // Nothing was created either.
        let rows = db
            .query_raw_params(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'police_traffic_logs'",
                &[],
            )
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}

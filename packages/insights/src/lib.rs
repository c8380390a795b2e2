#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! The insight catalog: canned aggregate queries over the stop tables.
//!
//! Each [`InsightKind`] carries its own SQL template, specialized per
//! table variant and SQL dialect. Every template projects the same fixed
//! aliases (`label`, optional `series`, `value`) so one executor and one
//! decode path serve the whole catalog. Selecting an insight replaces the
//! previous selection; that state lives with the caller, and
//! [`run_insight`] itself is stateless.

use std::cmp::Ordering;

use moosicbox_json_utils::{ParseError, database::ToValue as _};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use switchy_database::Database;
use traffic_log_database_models::{ChartPoint, SqlDialect, StopSchema};
use traffic_log_stop_models::StopDuration;

/// Errors that can occur while running an insight.
#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Row decode error.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// How the presentation layers should render an insight's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    /// Table only.
    Table,
    /// Table plus a bar chart.
    TableChart,
    /// Table, bar chart, and a busiest-hours summary line.
    TableChartPeaks,
}

impl RenderMode {
    /// Whether this mode includes a chart projection.
    #[must_use]
    pub const fn chart_capable(self) -> bool {
        !matches!(self, Self::Table)
    }
}

/// What the `value` column of an insight measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// Row counts.
    Count,
    /// Percentages rounded to 2 decimals.
    Rate,
    /// Average minutes.
    Minutes,
}

/// The canned aggregate queries the dashboard offers.
///
/// The string form is the stable id used in URLs and on the CLI.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum InsightKind {
    /// The five most common violations.
    #[default]
    TopViolations,
    /// Vehicles appearing most often in drug-related stops.
    DrugRelatedVehicles,
    /// Vehicles searched most often.
    MostSearchedVehicles,
    /// Arrest percentage per driver age bucket.
    ArrestRateByAgeGroup,
    /// Stop counts per country and driver gender.
    GenderDistributionByCountry,
    /// Search percentage per driver race and gender.
    SearchRateByRaceGender,
    /// Hour-of-day stop histogram.
    PeakStopHours,
    /// Average stop duration (bucket midpoints) per violation.
    AvgStopDurationPerViolation,
    /// Arrest percentage at night versus during the day.
    NightArrestRate,
    /// Most common violations among drivers under 25.
    YoungDriverViolations,
    /// Violations with the lowest arrest percentage.
    RareArrestViolations,
    /// Drug-related stop counts per country.
    DrugStopsByCountry,
    /// Arrest percentage per country and violation.
    ArrestRateByCountryViolation,
    /// Search counts per country.
    SearchesByCountry,
}

impl InsightKind {
    /// Every insight in catalog order.
    pub const ALL: [Self; 14] = [
        Self::TopViolations,
        Self::DrugRelatedVehicles,
        Self::MostSearchedVehicles,
        Self::ArrestRateByAgeGroup,
        Self::GenderDistributionByCountry,
        Self::SearchRateByRaceGender,
        Self::PeakStopHours,
        Self::AvgStopDurationPerViolation,
        Self::NightArrestRate,
        Self::YoungDriverViolations,
        Self::RareArrestViolations,
        Self::DrugStopsByCountry,
        Self::ArrestRateByCountryViolation,
        Self::SearchesByCountry,
    ];

    /// Human-readable title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::TopViolations => "Top 5 Violations",
            Self::DrugRelatedVehicles => "Vehicles in Drug-Related Stops",
            Self::MostSearchedVehicles => "Most Searched Vehicles",
            Self::ArrestRateByAgeGroup => "Arrest Rate by Driver Age Group",
            Self::GenderDistributionByCountry => "Gender Distribution by Country",
            Self::SearchRateByRaceGender => "Search Rate by Race and Gender",
            Self::PeakStopHours => "Peak Stop Hours",
            Self::AvgStopDurationPerViolation => "Average Stop Duration per Violation",
            Self::NightArrestRate => "Night vs Day Arrest Rate",
            Self::YoungDriverViolations => "Violations by Young Drivers",
            Self::RareArrestViolations => "Violations Rarely Leading to Arrest",
            Self::DrugStopsByCountry => "Drug-Related Stops by Country",
            Self::ArrestRateByCountryViolation => "Arrest Rate by Country and Violation",
            Self::SearchesByCountry => "Searches by Country",
        }
    }

    /// How the result should be rendered.
    #[must_use]
    pub const fn render_mode(self) -> RenderMode {
        match self {
            Self::ArrestRateByAgeGroup
            | Self::GenderDistributionByCountry
            | Self::SearchRateByRaceGender
            | Self::NightArrestRate
            | Self::RareArrestViolations
            | Self::ArrestRateByCountryViolation => RenderMode::Table,
            Self::PeakStopHours => RenderMode::TableChartPeaks,
            _ => RenderMode::TableChart,
        }
    }

    /// What the `value` column measures.
    #[must_use]
    pub const fn value_kind(self) -> ValueKind {
        match self {
            Self::ArrestRateByAgeGroup
            | Self::SearchRateByRaceGender
            | Self::NightArrestRate
            | Self::RareArrestViolations
            | Self::ArrestRateByCountryViolation => ValueKind::Rate,
            Self::AvgStopDurationPerViolation => ValueKind::Minutes,
            _ => ValueKind::Count,
        }
    }

    /// Column headers for the table rendering. Two entries for
    /// label/value insights, three when a series column is present.
    #[must_use]
    pub const fn column_titles(self) -> &'static [&'static str] {
        match self {
            Self::TopViolations => &["Violation", "Stops"],
            Self::DrugRelatedVehicles => &["Vehicle Number", "Drug-Related Stops"],
            Self::MostSearchedVehicles => &["Vehicle Number", "Searches"],
            Self::ArrestRateByAgeGroup => &["Age Group", "Arrest Rate (%)"],
            Self::GenderDistributionByCountry => &["Country", "Gender", "Stops"],
            Self::SearchRateByRaceGender => &["Driver Race", "Gender", "Search Rate (%)"],
            Self::PeakStopHours => &["Hour", "Stops"],
            Self::AvgStopDurationPerViolation => &["Violation", "Avg Duration (min)"],
            Self::NightArrestRate => &["Period", "Arrest Rate (%)"],
            Self::YoungDriverViolations => &["Violation", "Stops"],
            Self::RareArrestViolations => &["Violation", "Arrest Rate (%)"],
            Self::DrugStopsByCountry => &["Country", "Drug-Related Stops"],
            Self::ArrestRateByCountryViolation => &["Country", "Violation", "Arrest Rate (%)"],
            Self::SearchesByCountry => &["Country", "Searches"],
        }
    }

    /// Whether the projection includes a `series` column.
    #[must_use]
    pub const fn has_series(self) -> bool {
        self.column_titles().len() == 3
    }

    /// The SQL for this insight against the given table variant and
    /// dialect.
    ///
    /// Ordering is always total (value, then label, then series) so
    /// results are deterministic; ties inside a `LIMIT` resolve by label.
    #[must_use]
    pub fn sql(self, schema: StopSchema, dialect: SqlDialect) -> String {
        let table = schema.table();
        let violation = schema.violation_col();
        let drug = schema.drug_col();
        let place = schema.place_expr();

        match self {
            Self::TopViolations => format!(
                "SELECT {violation} AS label, COUNT(*) AS value
                 FROM {table}
                 WHERE {violation} IS NOT NULL AND {violation} <> ''
                 GROUP BY label
                 ORDER BY value DESC, label
                 LIMIT 5"
            ),
            Self::DrugRelatedVehicles => format!(
                "SELECT vehicle_number AS label, COUNT(*) AS value
                 FROM {table}
                 WHERE {drug} AND vehicle_number IS NOT NULL AND vehicle_number <> ''
                 GROUP BY label
                 ORDER BY value DESC, label
                 LIMIT 10"
            ),
            Self::MostSearchedVehicles => format!(
                "SELECT vehicle_number AS label, COUNT(*) AS value
                 FROM {table}
                 WHERE search_conducted AND vehicle_number IS NOT NULL AND vehicle_number <> ''
                 GROUP BY label
                 ORDER BY value DESC, label
                 LIMIT 10"
            ),
            Self::ArrestRateByAgeGroup => format!(
                "SELECT CASE
                          WHEN driver_age < 18 THEN 'Under 18'
                          WHEN driver_age BETWEEN 18 AND 24 THEN '18-24'
                          WHEN driver_age BETWEEN 25 AND 39 THEN '25-39'
                          WHEN driver_age BETWEEN 40 AND 59 THEN '40-59'
                          ELSE '60+'
                        END AS label,
                        {arrest_pct} AS value
                 FROM {table}
                 WHERE driver_age IS NOT NULL
                 GROUP BY label
                 ORDER BY value DESC, label",
                arrest_pct = dialect.pct_expr("is_arrested"),
            ),
            Self::GenderDistributionByCountry => format!(
                "SELECT {place} AS label, driver_gender AS series, COUNT(*) AS value
                 FROM {table}
                 WHERE driver_gender IS NOT NULL
                 GROUP BY label, series
                 ORDER BY label, series"
            ),
            Self::SearchRateByRaceGender => format!(
                "SELECT driver_race AS label, driver_gender AS series, {search_pct} AS value
                 FROM {table}
                 WHERE driver_race IS NOT NULL AND driver_gender IS NOT NULL
                 GROUP BY label, series
                 ORDER BY value DESC, label, series
                 LIMIT 10",
                search_pct = dialect.pct_expr("search_conducted"),
            ),
            Self::PeakStopHours => format!(
                "SELECT {hour} AS label, COUNT(*) AS value
                 FROM {table}
                 WHERE stop_datetime IS NOT NULL
                 GROUP BY label
                 ORDER BY label",
                hour = dialect.hour_label_expr("stop_datetime"),
            ),
            // Legacy rows can carry arbitrary duration labels; only the
            // known buckets have a midpoint, so anything else is excluded
            // up front rather than averaged as NULL.
            Self::AvgStopDurationPerViolation => format!(
                "SELECT {violation} AS label, {avg_minutes} AS value
                 FROM {table}
                 WHERE stop_duration IN ({buckets}) AND {violation} IS NOT NULL
                 GROUP BY label
                 ORDER BY value DESC, label",
                avg_minutes = rounded_avg(dialect, &duration_minutes_case()),
                buckets = duration_labels(),
            ),
            Self::NightArrestRate => format!(
                "SELECT CASE WHEN {hour} >= 20 OR {hour} < 5 THEN 'Night' ELSE 'Day' END AS label,
                        {arrest_pct} AS value
                 FROM {table}
                 WHERE stop_datetime IS NOT NULL
                 GROUP BY label
                 ORDER BY label",
                hour = dialect.hour_int_expr("stop_datetime"),
                arrest_pct = dialect.pct_expr("is_arrested"),
            ),
            Self::YoungDriverViolations => format!(
                "SELECT {violation} AS label, COUNT(*) AS value
                 FROM {table}
                 WHERE driver_age < 25 AND {violation} IS NOT NULL
                 GROUP BY label
                 ORDER BY value DESC, label
                 LIMIT 10"
            ),
            // Minimum sample of 5 stops so singleton violations don't
            // dominate the low end.
            Self::RareArrestViolations => format!(
                "SELECT {violation} AS label, {arrest_pct} AS value
                 FROM {table}
                 WHERE {violation} IS NOT NULL
                 GROUP BY label
                 HAVING COUNT(*) >= 5
                 ORDER BY value ASC, label
                 LIMIT 10",
                arrest_pct = dialect.pct_expr("is_arrested"),
            ),
            Self::DrugStopsByCountry => format!(
                "SELECT {place} AS label, COUNT(*) AS value
                 FROM {table}
                 WHERE {drug}
                 GROUP BY label
                 ORDER BY value DESC, label"
            ),
            Self::ArrestRateByCountryViolation => format!(
                "SELECT {place} AS label, {violation} AS series, {arrest_pct} AS value
                 FROM {table}
                 WHERE {violation} IS NOT NULL
                 GROUP BY label, series
                 ORDER BY value DESC, label, series
                 LIMIT 10",
                arrest_pct = dialect.pct_expr("is_arrested"),
            ),
            Self::SearchesByCountry => format!(
                "SELECT {place} AS label, COUNT(*) AS value
                 FROM {table}
                 WHERE search_conducted
                 GROUP BY label
                 ORDER BY value DESC, label"
            ),
        }
    }
}

/// The known duration bucket labels as a quoted SQL list.
fn duration_labels() -> String {
    StopDuration::all()
        .iter()
        .map(|duration| format!("'{duration}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Maps the duration bucket labels to their midpoint minutes.
fn duration_minutes_case() -> String {
    let mut sql = "CASE stop_duration".to_string();
    for duration in StopDuration::all() {
        sql.push_str(&format!(
            " WHEN '{duration}' THEN {midpoint:.1}",
            midpoint = duration.midpoint_minutes(),
        ));
    }
    sql.push_str(" END");
    sql
}

/// Average of `expr` rounded to 2 decimals, decoding as a double on both
/// backends.
fn rounded_avg(dialect: SqlDialect, expr: &str) -> String {
    let rounded = format!("ROUND(AVG({expr}), 2)");
    match dialect {
        SqlDialect::Postgres => format!("{rounded}::float8"),
        SqlDialect::Sqlite => rounded,
    }
}

/// One decoded result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRow {
    /// Primary group label.
    pub label: String,
    /// Secondary group label, for two-dimensional insights.
    pub series: Option<String>,
    /// Count, percentage, or minutes, per [`InsightKind::value_kind`].
    pub value: f64,
}

/// A fully executed insight, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResult {
    /// Which insight produced this.
    pub kind: InsightKind,
    /// Human-readable title.
    pub title: String,
    /// Table column headers.
    pub columns: Vec<String>,
    /// Result rows. Empty means "no data", not an error.
    pub rows: Vec<InsightRow>,
    /// Bar-chart projection, for chart-capable insights with data.
    pub chart: Option<Vec<ChartPoint>>,
    /// Busiest-hours summary, for [`InsightKind::PeakStopHours`].
    pub summary: Option<String>,
}

/// Runs one insight against the store and decodes the result.
///
/// # Errors
///
/// Returns [`InsightError`] if the query fails or a row cannot be
/// decoded.
#[allow(clippy::cast_precision_loss)]
pub async fn run_insight(
    db: &dyn Database,
    dialect: SqlDialect,
    schema: StopSchema,
    kind: InsightKind,
) -> Result<InsightResult, InsightError> {
    let sql = kind.sql(schema, dialect);
    log::debug!("Running insight {kind} against {}", schema.table());

    let raw = db.query_raw_params(&sql, &[]).await?;

    let mut rows = Vec::with_capacity(raw.len());
    for row in &raw {
        let label: Option<String> = row.to_value("label").unwrap_or(None);
        let series = if kind.has_series() {
            row.to_value("series").unwrap_or(None)
        } else {
            None
        };
        let value = match kind.value_kind() {
            ValueKind::Count => {
                let count: i64 = row.to_value("value")?;
                count as f64
            }
            ValueKind::Rate | ValueKind::Minutes => row.to_value("value")?,
        };

        rows.push(InsightRow {
            label: label.unwrap_or_else(|| "Unknown".to_string()),
            series,
            value,
        });
    }

    let chart = if kind.render_mode().chart_capable() && !rows.is_empty() {
        Some(
            rows.iter()
                .map(|row| ChartPoint {
                    label: row.series.as_ref().map_or_else(
                        || row.label.clone(),
                        |series| format!("{} / {series}", row.label),
                    ),
                    value: row.value,
                })
                .collect(),
        )
    } else {
        None
    };

    let summary = if kind == InsightKind::PeakStopHours && !rows.is_empty() {
        Some(peak_summary(&rows))
    } else {
        None
    };

    Ok(InsightResult {
        kind,
        title: kind.title().to_string(),
        columns: kind
            .column_titles()
            .iter()
            .map(ToString::to_string)
            .collect(),
        rows,
        chart,
        summary,
    })
}

/// Names the three busiest hours, by count descending.
fn peak_summary(rows: &[InsightRow]) -> String {
    let mut by_count: Vec<&InsightRow> = rows.iter().collect();
    by_count.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });

    let peaks = by_count
        .iter()
        .take(3)
        .map(|row| format!("{}:00 ({})", row.label, row.value))
        .collect::<Vec<_>>()
        .join(", ");

    format!("Busiest hours: {peaks}")
}

#[cfg(test)]
mod tests {
    use switchy_database_connection::init_sqlite_rusqlite;
    use traffic_log_database::reconcile::reconcile;

    use super::*;

    async fn reconciled_db() -> Box<dyn Database> {
        let db = init_sqlite_rusqlite(None).unwrap();
        reconcile(db.as_ref(), SqlDialect::Sqlite, StopSchema::VehicleStops)
            .await
            .unwrap();
        db
    }

    async fn seed(db: &dyn Database, sql: &str) {
        db.exec_raw(sql).await.unwrap();
    }

    async fn run(db: &dyn Database, kind: InsightKind) -> InsightResult {
        run_insight(db, SqlDialect::Sqlite, StopSchema::VehicleStops, kind)
            .await
            .unwrap()
    }

    #[test]
    fn ids_round_trip() {
        assert_eq!(InsightKind::ALL.len(), 14);
        for kind in InsightKind::ALL {
            assert_eq!(kind.as_ref().parse::<InsightKind>().unwrap(), kind);
        }
        assert_eq!(
            "top-violations".parse::<InsightKind>().unwrap(),
            InsightKind::TopViolations
        );
        assert_eq!(InsightKind::default(), InsightKind::TopViolations);
    }

    #[test]
    fn series_insights_have_three_columns() {
        for kind in InsightKind::ALL {
            let titles = kind.column_titles().len();
            assert_eq!(titles, if kind.has_series() { 3 } else { 2 });
        }
    }

    #[tokio::test]
    async fn top_violations_ties_break_by_label() {
        let db = reconciled_db().await;
        seed(
            db.as_ref(),
            "INSERT INTO vehicle_stops (violation_raw) VALUES
                ('Speeding'), ('Speeding'), ('Speeding'),
                ('Signal jump'), ('Signal jump'),
                ('DUI'), ('DUI'),
                ('No helmet'),
                ('Overloading'),
                ('Wrong lane')",
        )
        .await;

        let result = run(db.as_ref(), InsightKind::TopViolations).await;

        let labels: Vec<&str> = result.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Speeding", "DUI", "Signal jump", "No helmet", "Overloading"]
        );
        assert_eq!(result.rows[0].value, 3.0);
        assert!(result.chart.is_some());
    }

    #[tokio::test]
    async fn night_arrest_rate_splits_on_hour_range() {
        let db = reconciled_db().await;
        // Day: 3 arrests of 10. Night: 4 arrests of 5, spanning both
        // edges of the 20:00-04:59 window.
        seed(
            db.as_ref(),
            "INSERT INTO vehicle_stops (violation_raw, is_arrested, stop_datetime) VALUES
                ('Speeding', TRUE,  '2024-01-01 08:00:00'),
                ('Speeding', TRUE,  '2024-01-01 09:00:00'),
                ('Speeding', TRUE,  '2024-01-01 10:00:00'),
                ('Speeding', FALSE, '2024-01-01 11:00:00'),
                ('Speeding', FALSE, '2024-01-01 12:00:00'),
                ('Speeding', FALSE, '2024-01-01 13:00:00'),
                ('Speeding', FALSE, '2024-01-01 14:00:00'),
                ('Speeding', FALSE, '2024-01-01 15:00:00'),
                ('Speeding', FALSE, '2024-01-01 05:00:00'),
                ('Speeding', FALSE, '2024-01-01 19:59:00'),
                ('Speeding', TRUE,  '2024-01-01 20:00:00'),
                ('Speeding', TRUE,  '2024-01-01 22:30:00'),
                ('Speeding', TRUE,  '2024-01-02 00:15:00'),
                ('Speeding', TRUE,  '2024-01-02 04:59:00'),
                ('Speeding', FALSE, '2024-01-01 23:00:00')",
        )
        .await;

        let result = run(db.as_ref(), InsightKind::NightArrestRate).await;

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].label, "Day");
        assert_eq!(result.rows[0].value, 30.0);
        assert_eq!(result.rows[1].label, "Night");
        assert_eq!(result.rows[1].value, 80.0);
        assert!(result.chart.is_none());
    }

    #[tokio::test]
    async fn peak_hours_reports_busiest_hours() {
        let db = reconciled_db().await;
        seed(
            db.as_ref(),
            "INSERT INTO vehicle_stops (violation_raw, stop_datetime) VALUES
                ('Speeding', '2024-01-01 14:05:00'),
                ('Speeding', '2024-01-01 14:40:00'),
                ('Speeding', '2024-01-02 14:10:00'),
                ('Speeding', '2024-01-01 09:00:00'),
                ('Speeding', '2024-01-03 09:30:00'),
                ('Speeding', '2024-01-01 22:15:00')",
        )
        .await;

        let result = run(db.as_ref(), InsightKind::PeakStopHours).await;

        let labels: Vec<&str> = result.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["09", "14", "22"]);
        let summary = result.summary.unwrap();
        assert!(summary.starts_with("Busiest hours: 14:00 (3), 09:00 (2)"));
    }

    #[tokio::test]
    async fn empty_result_is_no_data_not_an_error() {
        let db = reconciled_db().await;

        let result = run(db.as_ref(), InsightKind::PeakStopHours).await;

        assert!(result.rows.is_empty());
        assert!(result.chart.is_none());
        assert!(result.summary.is_none());
    }

    #[tokio::test]
    async fn avg_duration_uses_bucket_midpoints() {
        let db = reconciled_db().await;
        seed(
            db.as_ref(),
            "INSERT INTO vehicle_stops (violation_raw, stop_duration) VALUES
                ('Speeding', '0-15 Min'),
                ('Speeding', '16-30 Min'),
                ('DUI', '30+ Min')",
        )
        .await;

        let result = run(db.as_ref(), InsightKind::AvgStopDurationPerViolation).await;

        assert_eq!(result.rows[0].label, "DUI");
        assert_eq!(result.rows[0].value, 45.0);
        assert_eq!(result.rows[1].label, "Speeding");
        assert_eq!(result.rows[1].value, 15.5);
    }

    #[tokio::test]
    async fn avg_duration_skips_unrecognized_labels() {
        let db = reconciled_db().await;
        seed(
            db.as_ref(),
            "INSERT INTO vehicle_stops (violation_raw, stop_duration) VALUES
                ('Speeding', '0-15 Min'),
                ('Speeding', '45 Min'),
                ('Parking', '45 Min')",
        )
        .await;

        let result = run(db.as_ref(), InsightKind::AvgStopDurationPerViolation).await;

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].label, "Speeding");
        assert_eq!(result.rows[0].value, 8.0);
    }

    #[tokio::test]
    async fn rare_arrests_need_a_minimum_sample() {
        let db = reconciled_db().await;
        seed(
            db.as_ref(),
            "INSERT INTO vehicle_stops (violation_raw, is_arrested) VALUES
                ('Speeding', TRUE), ('Speeding', FALSE), ('Speeding', FALSE),
                ('Speeding', FALSE), ('Speeding', FALSE), ('Speeding', FALSE),
                ('DUI', TRUE), ('DUI', TRUE), ('DUI', TRUE),
                ('DUI', TRUE), ('DUI', TRUE),
                ('Jaywalking', FALSE), ('Jaywalking', FALSE)",
        )
        .await;

        let result = run(db.as_ref(), InsightKind::RareArrestViolations).await;

        let labels: Vec<&str> = result.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Speeding", "DUI"]);
        assert!((result.rows[0].value - 16.67).abs() < 0.001);
        assert_eq!(result.rows[1].value, 100.0);
    }

    #[tokio::test]
    async fn gender_distribution_carries_series() {
        let db = reconciled_db().await;
        seed(
            db.as_ref(),
            "INSERT INTO vehicle_stops (violation_raw, country, driver_gender) VALUES
                ('Speeding', 'India', 'Male'),
                ('Speeding', 'India', 'Male'),
                ('Speeding', 'India', 'Female'),
                ('Speeding', 'Canada', 'Female')",
        )
        .await;

        let result = run(db.as_ref(), InsightKind::GenderDistributionByCountry).await;

        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[0].label, "Canada");
        assert_eq!(result.rows[0].series.as_deref(), Some("Female"));
        assert_eq!(result.rows[2].series.as_deref(), Some("Male"));
        assert_eq!(result.rows[2].value, 2.0);
    }

    #[tokio::test]
    async fn drug_stops_group_by_place_fallback() {
        let db = reconciled_db().await;
        seed(
            db.as_ref(),
            "INSERT INTO vehicle_stops (violation_raw, drug_related, country, location) VALUES
                ('Drug possession', TRUE, 'India', 'Chennai Central'),
                ('Drug possession', TRUE, NULL, 'Chennai North'),
                ('Drug possession', TRUE, NULL, NULL),
                ('Speeding', NULL, 'India', 'Chennai Central')",
        )
        .await;

        let result = run(db.as_ref(), InsightKind::DrugStopsByCountry).await;

        let labels: Vec<&str> = result.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Chennai North", "India", "Unknown"]);
    }
}

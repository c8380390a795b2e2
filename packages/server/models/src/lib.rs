#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! JSON API types for the traffic log server.
//!
//! Wire shapes are camelCase and kept separate from the store-facing
//! types so the HTTP contract can evolve independently.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use traffic_log_database_models::{ChartPoint, NewStop, StopFilter, StopRow};
use traffic_log_insights::{InsightKind, InsightResult, InsightRow};
use traffic_log_stop_models::{DriverGender, IncidentType, StopDuration, VehicleType};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// One stop record as served over the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStop {
    /// Record id.
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
    /// Stop timestamp as `YYYY-MM-DD HH:MM:SS` text.
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

impl From<StopRow> for ApiStop {
    fn from(row: StopRow) -> Self {
        Self {
            id: row.id,
            officer_name: row.officer_name,
            incident_type: row.incident_type,
            driver_name: row.driver_name,
            vehicle_type: row.vehicle_type,
            vehicle_number: row.vehicle_number,
            location: row.location,
            country: row.country,
            stop_datetime: row.stop_datetime,
            violation: row.violation,
            drug_related: row.drug_related,
            search_conducted: row.search_conducted,
            is_arrested: row.is_arrested,
            driver_gender: row.driver_gender,
            driver_age: row.driver_age,
            driver_race: row.driver_race,
            stop_duration: row.stop_duration,
        }
    }
}

/// Query parameters for `GET /api/stops`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopQueryParams {
    /// Exact-match country filter.
    pub country: Option<String>,
    /// Exact-match violation filter.
    pub violation: Option<String>,
    /// Maximum rows to return, newest first.
    pub limit: Option<u32>,
}

impl From<StopQueryParams> for StopFilter {
    fn from(params: StopQueryParams) -> Self {
        let default = Self::default();
        Self {
            country: params.country,
            violation: params.violation,
            limit: params.limit.unwrap_or(default.limit),
        }
    }
}

/// Request body for `POST /api/stops`.
///
/// Enumerated fields deserialize straight into the taxonomy enums, so a
/// payload with an unknown incident type or duration bucket is rejected
/// before it reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitStopRequest {
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
    /// Country, if known.
    pub country: Option<String>,
    /// Date of the stop.
    pub stop_date: NaiveDate,
    /// Time of day, if recorded.
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

impl From<SubmitStopRequest> for NewStop {
    fn from(request: SubmitStopRequest) -> Self {
        Self {
            officer_name: request.officer_name,
            incident_type: request.incident_type,
            driver_name: request.driver_name,
            vehicle_type: request.vehicle_type,
            vehicle_number: request.vehicle_number,
            location: request.location,
            country: request.country,
            stop_date: request.stop_date,
            stop_time: request.stop_time,
            violation: request.violation,
            driver_gender: request.driver_gender,
            driver_age: request.driver_age,
            search_conducted: request.search_conducted,
            is_arrested: request.is_arrested,
            stop_duration: request.stop_duration,
        }
    }
}

/// Distinct filter option sets for `GET /api/filters`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFilterOptions {
    /// Distinct countries.
    pub countries: Vec<String>,
    /// Distinct raw violation texts.
    pub violations: Vec<String>,
}

/// One catalog entry for `GET /api/insights`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInsightEntry {
    /// Stable insight id.
    pub id: InsightKind,
    /// Human-readable title.
    pub title: String,
    /// Whether the result carries a chart projection.
    pub chart_capable: bool,
}

impl From<InsightKind> for ApiInsightEntry {
    fn from(kind: InsightKind) -> Self {
        Self {
            id: kind,
            title: kind.title().to_string(),
            chart_capable: kind.render_mode().chart_capable(),
        }
    }
}

/// One row of an insight result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInsightRow {
    /// Primary group label.
    pub label: String,
    /// Secondary group label, for two-dimensional insights.
    pub series: Option<String>,
    /// Count, percentage, or minutes.
    pub value: f64,
}

impl From<InsightRow> for ApiInsightRow {
    fn from(row: InsightRow) -> Self {
        Self {
            label: row.label,
            series: row.series,
            value: row.value,
        }
    }
}

/// A fully executed insight for `GET/PUT /api/insights/selected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInsightResult {
    /// Which insight produced this.
    pub id: InsightKind,
    /// Human-readable title.
    pub title: String,
    /// Table column headers.
    pub columns: Vec<String>,
    /// Result rows. Empty means "no data".
    pub rows: Vec<ApiInsightRow>,
    /// Bar-chart projection, when applicable.
    pub chart: Option<Vec<ChartPoint>>,
    /// Busiest-hours summary, when applicable.
    pub summary: Option<String>,
}

impl From<InsightResult> for ApiInsightResult {
    fn from(result: InsightResult) -> Self {
        Self {
            id: result.kind,
            title: result.title,
            columns: result.columns,
            rows: result.rows.into_iter().map(Into::into).collect(),
            chart: result.chart,
            summary: result.summary,
        }
    }
}

/// Request body for `PUT /api/insights/selected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectInsightRequest {
    /// Insight id to select.
    pub id: InsightKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_request_json_is_camel_case() {
        let json = r#"{
            "officerName": "R. Kumar",
            "incidentType": "Probable Cause",
            "driverName": "A. Driver",
            "vehicleType": "Car",
            "vehicleNumber": "TN-01-1234",
            "location": "Chennai Central",
            "country": "India",
            "stopDate": "2024-01-05",
            "stopTime": "14:30:00",
            "violation": "Speeding",
            "driverGender": "Male",
            "driverAge": 34,
            "searchConducted": false,
            "isArrested": false,
            "stopDuration": "0-15 Min"
        }"#;

        let request: SubmitStopRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.incident_type, IncidentType::ProbableCause);
        assert_eq!(request.stop_duration, Some(StopDuration::Short));

        let stop = NewStop::from(request);
        assert_eq!(stop.stop_date.to_string(), "2024-01-05");
    }

    #[test]
    fn insight_ids_serialize_as_kebab_case() {
        let entry = ApiInsightEntry::from(InsightKind::PeakStopHours);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"peak-stop-hours\""));
        assert!(json.contains("\"chartCapable\":true"));
    }

    #[test]
    fn query_params_default_limit_is_ten() {
        let filter = StopFilter::from(StopQueryParams::default());
        assert_eq!(filter.limit, 10);
    }
}

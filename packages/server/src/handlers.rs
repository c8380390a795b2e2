//! HTTP handler functions for the traffic log API.

use actix_web::{HttpResponse, web};
use traffic_log_database::queries;
use traffic_log_database_models::{FilterField, NewStop, StopFilter};
use traffic_log_insights::{InsightKind, run_insight};
use traffic_log_server_models::{
    ApiFilterOptions, ApiHealth, ApiInsightEntry, ApiInsightResult, ApiStop, SelectInsightRequest,
    StopQueryParams, SubmitStopRequest,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/stops`
///
/// Returns the latest stop records, newest first, with optional country
/// and violation filters.
pub async fn stops(state: web::Data<AppState>, params: web::Query<StopQueryParams>) -> HttpResponse {
    let filter = StopFilter::from(params.into_inner());

    match queries::recent_stops(state.db.as_ref(), state.dialect, state.schema, &filter).await {
        Ok(rows) => {
            let api_stops: Vec<ApiStop> = rows.into_iter().map(ApiStop::from).collect();
            HttpResponse::Ok().json(api_stops)
        }
        Err(e) => {
            log::error!("Failed to query stops: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to query stops"
            }))
        }
    }
}

/// `POST /api/stops`
///
/// Inserts one submitted stop record. Enumerated fields were already
/// validated by deserialization.
pub async fn submit_stop(
    state: web::Data<AppState>,
    body: web::Json<SubmitStopRequest>,
) -> HttpResponse {
    let stop = NewStop::from(body.into_inner());

    match queries::insert_stop(state.db.as_ref(), state.dialect, state.schema, &stop).await {
        Ok(_) => HttpResponse::Created().json(serde_json::json!({
            "submitted": true
        })),
        Err(e) => {
            log::error!("Failed to insert stop: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to insert stop"
            }))
        }
    }
}

/// `GET /api/filters`
///
/// Returns the distinct country and violation option sets.
pub async fn filters(state: web::Data<AppState>) -> HttpResponse {
    let countries =
        match queries::distinct_values(state.db.as_ref(), state.schema, FilterField::Country).await
        {
            Ok(values) => values,
            Err(e) => {
                log::error!("Failed to query countries: {e}");
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Failed to query filter options"
                }));
            }
        };

    let violations =
        match queries::distinct_values(state.db.as_ref(), state.schema, FilterField::Violation)
            .await
        {
            Ok(values) => values,
            Err(e) => {
                log::error!("Failed to query violations: {e}");
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Failed to query filter options"
                }));
            }
        };

    HttpResponse::Ok().json(ApiFilterOptions {
        countries,
        violations,
    })
}

/// `GET /api/insights`
///
/// Returns the insight catalog in display order.
pub async fn insights() -> HttpResponse {
    let catalog: Vec<ApiInsightEntry> = InsightKind::ALL
        .iter()
        .copied()
        .map(ApiInsightEntry::from)
        .collect();

    HttpResponse::Ok().json(catalog)
}

/// `GET /api/insights/selected`
///
/// Runs the currently selected insight.
pub async fn selected_insight(state: web::Data<AppState>) -> HttpResponse {
    let kind = *state.selected.lock().expect("Selected insight mutex poisoned");

    run_and_render(&state, kind).await
}

/// `PUT /api/insights/selected`
///
/// Replaces the selection, then runs the newly selected insight.
pub async fn select_insight(
    state: web::Data<AppState>,
    body: web::Json<SelectInsightRequest>,
) -> HttpResponse {
    let kind = body.id;
    *state.selected.lock().expect("Selected insight mutex poisoned") = kind;

    run_and_render(&state, kind).await
}

async fn run_and_render(state: &AppState, kind: InsightKind) -> HttpResponse {
    match run_insight(state.db.as_ref(), state.dialect, state.schema, kind).await {
        Ok(result) => HttpResponse::Ok().json(ApiInsightResult::from(result)),
        Err(e) => {
            log::error!("Failed to run insight {kind}: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to run insight"
            }))
        }
    }
}

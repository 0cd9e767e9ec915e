//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, ProfileSummary, StateResponse, TelemetryQuery, TelemetryRecord};
use crate::tariff::TariffId;

/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let run = &state.run;
    Json(StateResponse {
        name: run.config.simulation.name.clone(),
        sim: run.sim,
        capability: run.capability,
        settings: run.settings,
        kpi: run.kpi.clone(),
        snapshot: run.snapshot,
        latest_step: run.results.last().map(TelemetryRecord::from),
    })
}

/// Returns telemetry records, optionally filtered by timeslot range.
///
/// `GET /telemetry` → 200 + `Vec<TelemetryRecord>` JSON
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let records: Vec<TelemetryRecord> = state
        .run
        .results
        .iter()
        .filter(|r| (from..=to).contains(&r.timeslot.0))
        .map(TelemetryRecord::from)
        .collect();

    Ok(Json(records))
}

/// `GET /profiles` → 200 + `Vec<ProfileSummary>` JSON
pub async fn list_profiles(State(state): State<Arc<AppState>>) -> Json<Vec<ProfileSummary>> {
    Json(state.run.profiles.iter().map(ProfileSummary::from).collect())
}

/// `GET /profiles/{id}` → 200 + full profile, or 404 for an unknown tariff
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    match state.run.profile(TariffId(id)) {
        Some(info) => Ok(Json(info.clone())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no profile for tariff {}", TariffId(id)),
            }),
        )),
    }
}

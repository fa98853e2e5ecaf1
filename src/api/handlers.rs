//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::warn;

use super::AppState;
use super::types::{ErrorResponse, HealthResponse};
use crate::analysis::{self, AnalysisResult};
use crate::config::RateConstants;
use crate::error::AnalysisError;
use crate::facility::FacilityInput;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Runs the analysis pipeline.
///
/// `POST /analyze` → 200 + `AnalysisResult` JSON
/// invalid body or field → 400 + `ErrorResponse`
/// missing rate entry → 500 + `ErrorResponse`
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FacilityInput>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(input) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "ValidationError".into(),
                message: rejection.body_text(),
            }),
        )
    })?;

    analysis::analyze(&input, &state.rates)
        .map(Json)
        .map_err(|e| error_response(&e))
}

/// `GET /health` → 200 + `HealthResponse`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        locations: state.rates.locations.len(),
    })
}

/// `GET /rates` → 200 + location keys in sorted order
pub async fn list_rates(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.rates.locations.keys().cloned().collect())
}

/// `GET /rates/{location}` → 200 + `RateConstants`, or 404
pub async fn get_rates(
    State(state): State<Arc<AppState>>,
    Path(location): Path<String>,
) -> Result<Json<RateConstants>, ApiError> {
    state
        .rates
        .locations
        .get(&location)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "NotFound".into(),
                    message: format!("no rate constants for location \"{location}\""),
                }),
            )
        })
}

fn error_response(e: &AnalysisError) -> ApiError {
    let status = match e {
        AnalysisError::Validation { .. } => StatusCode::BAD_REQUEST,
        AnalysisError::Configuration(_) => {
            warn!(error = %e, "rate table cannot serve request");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::from(e)))
}

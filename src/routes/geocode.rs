// SPDX-License-Identifier: MIT

//! Geocoding passthrough endpoint.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::routes::ApiResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/v1/geocode/reverse", get(reverse))
}

#[derive(Deserialize)]
struct ReverseQuery {
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Relay a reverse-geocoding lookup. Validation stops at presence and
/// numeric range; the upstream response is passed through untouched.
async fn reverse(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReverseQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let lat = query
        .lat
        .ok_or_else(|| AppError::Validation("lat is required".to_string()))?;
    let lon = query
        .lon
        .ok_or_else(|| AppError::Validation("lon is required".to_string()))?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::Validation("lat must be in [-90, 90]".to_string()));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(AppError::Validation(
            "lon must be in [-180, 180]".to_string(),
        ));
    }

    let place = state.geocode.reverse(lat, lon).await?;

    Ok(Json(ApiResponse::new(200, place, "Reverse geocode result")))
}

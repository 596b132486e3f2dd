// SPDX-License-Identifier: MIT

//! Reverse-geocoding passthrough client.
//!
//! The upstream geocoder is an external collaborator: responses are relayed
//! as-is and failures are not retried.

use crate::error::AppError;

/// Thin client for the upstream geocoding API.
#[derive(Clone)]
pub struct GeocodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeocodeClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Look up the place at a coordinate pair. The caller has already
    /// range-checked lat/lon.
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<serde_json::Value, AppError> {
        let url = format!("{}/reverse", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("format", "jsonv2".to_string()),
            ])
            .header(reqwest::header::USER_AGENT, "voltcast-api")
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Geocoder returned error");
            return Err(AppError::Upstream(format!(
                "geocoder returned {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))
    }
}

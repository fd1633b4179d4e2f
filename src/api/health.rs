//! Service liveness

use axum::{extract::State, Json};
use serde::Serialize;
use tokio_stream::StreamExt;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// `UP` when the anime catalog answered, `DOWN` otherwise
    #[schema(example = "UP")]
    pub status: &'static str,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
}

/// Report whether the anime catalog can be read
///
/// Pulls at most one record from the store; a store error reports `DOWN`
/// without failing the request.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and catalog status", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.services.animes.find_all().next().await {
        Some(Err(e)) => {
            tracing::warn!("Catalog health check failed: {}", e);
            "DOWN"
        }
        _ => "UP",
    };
    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
    })
}

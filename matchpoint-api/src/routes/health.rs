use axum::Json;
use matchpoint_shared::types::api::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("matchpoint-api", env!("CARGO_PKG_VERSION")))
}

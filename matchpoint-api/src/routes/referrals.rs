use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use matchpoint_shared::errors::{AppError, AppResult};
use matchpoint_shared::types::ApiResponse;

use crate::models::NewLinkVisit;
use crate::schema::link_visits;
use crate::services::referral;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TrackVisitRequest {
    #[serde(rename = "ref")]
    pub ref_code: String,
}

#[derive(Debug, Serialize)]
pub struct TrackVisitResponse {
    pub ok: bool,
}

/// POST /referrals/visit - log a visit arriving through an invite or
/// campaign link. Public, no session required.
pub async fn track_visit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrackVisitRequest>,
) -> AppResult<Json<ApiResponse<TrackVisitResponse>>> {
    if !referral::is_valid_ref(&req.ref_code) {
        return Err(AppError::Validation("invalid ref".into()));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    diesel::insert_into(link_visits::table)
        .values(&NewLinkVisit { ref_code: &req.ref_code })
        .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(TrackVisitResponse { ok: true })))
}

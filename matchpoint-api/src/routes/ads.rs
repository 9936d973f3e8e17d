use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;

use matchpoint_shared::errors::{AppError, AppResult};
use matchpoint_shared::types::ApiResponse;

use crate::models::Ad;
use crate::schema::{ads, settings};
use crate::AppState;

pub const ADS_ENABLED_KEY: &str = "ads_enabled";

#[derive(Debug, Serialize)]
pub struct ActiveAdsResponse {
    pub left: Option<Ad>,
    pub right: Option<Ad>,
}

/// GET /ads - the newest active, unexpired banner per slot. Public.
pub async fn active_ads(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<ActiveAdsResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let now = Utc::now();

    let active: Vec<Ad> = ads::table
        .filter(ads::is_active.eq(true))
        .filter(ads::expires_at.gt(now))
        .order(ads::created_at.desc())
        .load(&mut conn)?;

    let left = active.iter().find(|a| a.slot == "left").cloned();
    let right = active.iter().find(|a| a.slot == "right").cloned();

    Ok(Json(ApiResponse::ok(ActiveAdsResponse { left, right })))
}

#[derive(Debug, Serialize)]
pub struct AdsStatusResponse {
    pub enabled: bool,
}

/// GET /ads/status - whether banners are shown site-wide.
pub async fn ads_status(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<AdsStatusResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let enabled = ads_enabled(&mut conn)?;

    Ok(Json(ApiResponse::ok(AdsStatusResponse { enabled })))
}

pub(crate) fn ads_enabled(conn: &mut diesel::pg::PgConnection) -> AppResult<bool> {
    let value: Option<String> = settings::table
        .find(ADS_ENABLED_KEY)
        .select(settings::value)
        .first(conn)
        .optional()?;
    Ok(value.as_deref() == Some("true"))
}

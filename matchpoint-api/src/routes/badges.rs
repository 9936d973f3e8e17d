use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use matchpoint_shared::errors::{AppError, AppResult};
use matchpoint_shared::types::ApiResponse;

use crate::models::Profile;
use crate::schema::{matches, profiles};
use crate::services::badges::{badges_for, Badge, BadgeInput};
use crate::services::limits;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BadgesQuery {
    pub profile_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct BadgesResponse {
    pub badges: Vec<Badge>,
}

/// GET /badges?profile_id= - computed badges for a profile card.
/// Unknown profiles get an empty list rather than an error.
pub async fn badges(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BadgesQuery>,
) -> AppResult<Json<ApiResponse<BadgesResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let Some(profile) = profiles::table
        .find(query.profile_id)
        .first::<Profile>(&mut conn)
        .optional()?
    else {
        return Ok(Json(ApiResponse::ok(BadgesResponse { badges: vec![] })));
    };

    let match_count: i64 = matches::table
        .filter(
            matches::profile_1_id
                .eq(profile.id)
                .or(matches::profile_2_id.eq(profile.id)),
        )
        .count()
        .get_result(&mut conn)?;
    let tier = limits::tier_of(&mut conn, profile.id)?;

    let badges = badges_for(BadgeInput {
        is_verified: profile.is_verified,
        has_phone: profile.phone.as_deref().map_or(false, |p| !p.trim().is_empty()),
        days_since_creation: (Utc::now() - profile.created_at).num_days(),
        match_count,
        tier,
    });

    Ok(Json(ApiResponse::ok(BadgesResponse { badges })))
}

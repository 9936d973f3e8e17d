use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use matchpoint_shared::errors::{AppError, AppResult, ErrorCode};
use matchpoint_shared::types::session::Session;
use matchpoint_shared::types::ApiResponse;

use crate::models::{NewDislike, NewLike, NewMatch, Profile};
use crate::schema::{dislikes, likes, matches, profiles};
use crate::services::limits;
use crate::AppState;

/// A dislike hides the target from discovery for this long; each
/// re-dislike restarts the window.
pub const DISLIKE_SUPPRESS_HOURS: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub character_id: i64,
    pub to_profile_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub is_match: bool,
    pub remaining: i32,
    pub reset_at: DateTime<Utc>,
}

/// POST /likes - like a profile; a mutual like creates the match.
pub async fn like(
    session: Session,
    State(state): State<Arc<AppState>>,
    Json(req): Json<LikeRequest>,
) -> AppResult<Json<ApiResponse<LikeResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = super::my_profile(&mut conn, session.account_id, req.character_id)?;
    super::touch_last_active(&mut conn, me.id);

    if me.id == req.to_profile_id {
        return Err(AppError::new(ErrorCode::CannotLikeSelf, "you cannot like yourself"));
    }

    // The target may have been deleted since it was surfaced.
    let target_exists: bool = profiles::table
        .find(req.to_profile_id)
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)?;
    if !target_exists {
        return Err(AppError::new(
            ErrorCode::ProfileNotFound,
            "this profile no longer exists",
        ));
    }

    // A repeated like is a no-op and consumes no quota, but still
    // reports whether the pair is matched.
    let already_liked: bool = likes::table
        .filter(likes::from_profile_id.eq(me.id))
        .filter(likes::to_profile_id.eq(req.to_profile_id))
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)?;

    if already_liked {
        let info = limits::limits_info(&mut conn, me.id)?;
        let is_match = reverse_like_exists(&mut conn, me.id, req.to_profile_id)?;
        return Ok(Json(ApiResponse::ok(LikeResponse {
            is_match,
            remaining: info.remaining,
            reset_at: info.reset_at,
        })));
    }

    let slot = limits::consume_like_slot(&mut conn, me.id)?;
    if !slot.ok {
        return Err(AppError::with_details(
            ErrorCode::LikeQuotaExhausted,
            "daily like limit reached",
            serde_json::json!({ "remaining": 0, "resetAt": slot.reset_at }),
        ));
    }

    diesel::insert_into(likes::table)
        .values(&NewLike {
            from_profile_id: me.id,
            to_profile_id: req.to_profile_id,
        })
        .on_conflict((likes::from_profile_id, likes::to_profile_id))
        .do_nothing()
        .execute(&mut conn)?;

    let mut is_match = false;
    if reverse_like_exists(&mut conn, me.id, req.to_profile_id)? {
        let (low, high) = super::sorted_pair(me.id, req.to_profile_id);
        diesel::insert_into(matches::table)
            .values(&NewMatch {
                profile_1_id: low,
                profile_2_id: high,
                created_by: "mutual_like",
                created_by_admin: None,
            })
            .on_conflict((matches::profile_1_id, matches::profile_2_id))
            .do_nothing()
            .execute(&mut conn)?;
        is_match = true;

        tracing::info!(profile_1 = %low, profile_2 = %high, "match created");
    }

    Ok(Json(ApiResponse::ok(LikeResponse {
        is_match,
        remaining: slot.remaining,
        reset_at: slot.reset_at,
    })))
}

fn reverse_like_exists(
    conn: &mut diesel::pg::PgConnection,
    me: Uuid,
    them: Uuid,
) -> AppResult<bool> {
    Ok(likes::table
        .filter(likes::from_profile_id.eq(them))
        .filter(likes::to_profile_id.eq(me))
        .count()
        .get_result::<i64>(conn)
        .map(|c| c > 0)?)
}

#[derive(Debug, Deserialize)]
pub struct DislikeRequest {
    pub character_id: i64,
    pub to_profile_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DislikeResponse {
    pub suppressed_until: DateTime<Utc>,
}

/// POST /dislikes - hide a profile for 10 hours; consumes no quota and
/// restarts the window when repeated.
pub async fn dislike(
    session: Session,
    State(state): State<Arc<AppState>>,
    Json(req): Json<DislikeRequest>,
) -> AppResult<Json<ApiResponse<DislikeResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = super::my_profile(&mut conn, session.account_id, req.character_id)?;
    super::touch_last_active(&mut conn, me.id);

    if me.id == req.to_profile_id {
        return Err(AppError::bad_request("invalid target"));
    }

    let now = Utc::now();
    diesel::insert_into(dislikes::table)
        .values(&NewDislike {
            from_profile_id: me.id,
            to_profile_id: req.to_profile_id,
            created_at: now,
        })
        .on_conflict((dislikes::from_profile_id, dislikes::to_profile_id))
        .do_update()
        .set(dislikes::created_at.eq(now))
        .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(DislikeResponse {
        suppressed_until: now + Duration::hours(DISLIKE_SUPPRESS_HOURS),
    })))
}

#[derive(Debug, Deserialize)]
pub struct UndoRequest {
    pub character_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoResponse {
    pub profile: Option<Profile>,
    pub undo_remaining: i32,
    pub undo_reset_at: DateTime<Utc>,
}

/// POST /dislikes/undo - delete the caller's most recent dislike and
/// return that profile for re-surfacing, within the daily undo quota.
pub async fn undo_dislike(
    session: Session,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UndoRequest>,
) -> AppResult<Json<ApiResponse<UndoResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = super::my_profile(&mut conn, session.account_id, req.character_id)?;

    let last_disliked: Option<Uuid> = dislikes::table
        .filter(dislikes::from_profile_id.eq(me.id))
        .order(dislikes::created_at.desc())
        .select(dislikes::to_profile_id)
        .first(&mut conn)
        .optional()?;

    let Some(target_id) = last_disliked else {
        return Err(AppError::new(ErrorCode::NoDislikeToUndo, "no dislike to undo"));
    };

    let slot = limits::consume_undo_slot(&mut conn, me.id)?;
    if !slot.ok {
        return Err(AppError::with_details(
            ErrorCode::UndoQuotaExhausted,
            "daily undo limit reached",
            serde_json::json!({ "remaining": 0, "resetAt": slot.reset_at }),
        ));
    }

    diesel::delete(
        dislikes::table
            .filter(dislikes::from_profile_id.eq(me.id))
            .filter(dislikes::to_profile_id.eq(target_id)),
    )
    .execute(&mut conn)?;

    let profile: Option<Profile> = profiles::table
        .find(target_id)
        .first(&mut conn)
        .optional()?;

    Ok(Json(ApiResponse::ok(UndoResponse {
        profile,
        undo_remaining: slot.remaining,
        undo_reset_at: slot.reset_at,
    })))
}

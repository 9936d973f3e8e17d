use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use matchpoint_shared::errors::{AppError, AppResult, ErrorCode};
use matchpoint_shared::types::session::Session;
use matchpoint_shared::types::ApiResponse;

use crate::models::{Profile, UpsertProfile};
use crate::schema::{
    boosts, daily_likes, daily_undos, dislikes, likes, matches, messages, profile_views, profiles,
    subscriptions,
};
use crate::services::compatibility::{Gender, Orientation};
use crate::services::referral;
use crate::AppState;

pub const MIN_AGE: i32 = 18;
pub const MAX_EXTRA_PHOTOS: usize = 4;

#[derive(Debug, Deserialize)]
pub struct SubmitProfileRequest {
    pub character_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub weight: Option<i32>,
    pub gender: String,
    pub orientation: String,
    pub phone: Option<String>,
    pub social_handle: String,
    pub description: String,
    pub photo_url: String,
    #[serde(default)]
    pub extra_photos: Vec<String>,
    pub prompts: Option<serde_json::Value>,
    pub looking_for: Option<String>,
    pub ref_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitProfileResponse {
    pub profile: Profile,
}

/// POST /profiles - create or update the caller's profile for one
/// character (upsert keyed on account + character).
pub async fn submit_profile(
    session: Session,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitProfileRequest>,
) -> AppResult<Json<ApiResponse<SubmitProfileResponse>>> {
    let required = [
        ("first_name", &req.first_name),
        ("last_name", &req.last_name),
        ("social_handle", &req.social_handle),
        ("description", &req.description),
        ("photo_url", &req.photo_url),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} is required")));
        }
    }
    if req.age < MIN_AGE {
        return Err(AppError::new(
            ErrorCode::UnderageProfile,
            "applicants must be at least 18",
        ));
    }
    if Gender::from_str(&req.gender).is_err() {
        return Err(AppError::Validation("gender must be male or female".into()));
    }
    if Orientation::from_str(&req.orientation).is_err() {
        return Err(AppError::Validation(
            "orientation must be hetero, homo, or bi".into(),
        ));
    }

    let character = session
        .characters
        .iter()
        .find(|c| c.id == req.character_id)
        .ok_or_else(|| AppError::forbidden("character does not belong to this account"))?;

    let extra_photos: Vec<String> = req
        .extra_photos
        .iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .take(MAX_EXTRA_PHOTOS)
        .collect();

    let prompts = match req.prompts {
        Some(serde_json::Value::Object(map)) => serde_json::Value::Object(
            map.into_iter()
                .filter(|(_, v)| v.as_str().map_or(false, |s| !s.trim().is_empty()))
                .collect(),
        ),
        _ => serde_json::json!({}),
    };

    let looking_for = req
        .looking_for
        .filter(|v| matches!(v.as_str(), "friends" | "dating"));

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // A character with no prior profile counts as a fresh invitee for
    // the referral loop; decide before the upsert lands.
    let was_new_character =
        !referral::has_prior_profile(&mut conn, session.account_id, req.character_id)?;

    let now = Utc::now();
    let upsert = UpsertProfile {
        account_id: session.account_id,
        character_id: req.character_id,
        character_name: character.name.clone(),
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        age: req.age,
        weight: req.weight,
        gender: req.gender.clone(),
        orientation: req.orientation.clone(),
        phone: req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()).map(String::from),
        social_handle: req.social_handle.trim().to_string(),
        description: req.description.clone(),
        photo_url: req.photo_url.clone(),
        extra_photos,
        prompts,
        looking_for,
        updated_at: now,
        last_active_at: now,
    };

    let profile: Profile = diesel::insert_into(profiles::table)
        .values(&upsert)
        .on_conflict((profiles::account_id, profiles::character_id))
        .do_update()
        .set(&upsert)
        .get_result(&mut conn)?;

    if was_new_character {
        if let Some(code) = req.ref_code.as_deref().map(str::trim).filter(|c| referral::is_valid_ref(c)) {
            match referral::referrer_by_code(&mut conn, code) {
                Ok(Some(referrer_account_id)) => {
                    if let Err(e) = referral::record_referral_and_maybe_grant(
                        &mut conn,
                        referrer_account_id,
                        session.account_id,
                        profile.id,
                    ) {
                        tracing::error!(error = %e, "referral record failed");
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::error!(error = %e, "referrer lookup failed"),
            }
        }
    }

    // Every submitter gets a shareable invite code.
    if let Err(e) = referral::get_or_create_code(&mut conn, session.account_id) {
        tracing::error!(error = %e, "ref code creation failed");
    }

    tracing::info!(
        profile_id = %profile.id,
        account_id = session.account_id,
        character_id = req.character_id,
        "profile submitted"
    );

    Ok(Json(ApiResponse::ok(SubmitProfileResponse { profile })))
}

#[derive(Debug, Deserialize)]
pub struct CharacterQuery {
    pub character_id: i64,
}

#[derive(Debug, Serialize)]
pub struct MyProfileResponse {
    pub has_profile: bool,
    pub profile: Option<Profile>,
}

/// GET /profiles/me?character_id= - the caller's profile for a character.
pub async fn get_my_profile(
    session: Session,
    State(state): State<Arc<AppState>>,
    Query(query): Query<CharacterQuery>,
) -> AppResult<Json<ApiResponse<MyProfileResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = super::my_profile_opt(&mut conn, session.account_id, query.character_id)?;

    Ok(Json(ApiResponse::ok(MyProfileResponse {
        has_profile: profile.is_some(),
        profile,
    })))
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

/// DELETE /profiles/:id - owner deletes a profile and everything
/// hanging off it.
pub async fn delete_my_profile(
    session: Session,
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeletedResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile: Profile = profiles::table
        .find(profile_id)
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    if profile.account_id != session.account_id {
        return Err(AppError::new(
            ErrorCode::NotProfileOwner,
            "you do not own this profile",
        ));
    }

    delete_profile_cascade(&mut conn, profile_id)?;

    tracing::info!(profile_id = %profile_id, account_id = session.account_id, "profile deleted by owner");

    Ok(Json(ApiResponse::ok(DeletedResponse { deleted: true })))
}

/// Remove a profile and all dependent rows. Shared with the admin
/// delete endpoint.
pub(crate) fn delete_profile_cascade(
    conn: &mut diesel::pg::PgConnection,
    profile_id: Uuid,
) -> AppResult<()> {
    diesel::delete(
        messages::table.filter(
            messages::sender_profile_id
                .eq(profile_id)
                .or(messages::receiver_profile_id.eq(profile_id)),
        ),
    )
    .execute(conn)?;
    diesel::delete(
        matches::table.filter(
            matches::profile_1_id
                .eq(profile_id)
                .or(matches::profile_2_id.eq(profile_id)),
        ),
    )
    .execute(conn)?;
    diesel::delete(
        likes::table.filter(
            likes::from_profile_id
                .eq(profile_id)
                .or(likes::to_profile_id.eq(profile_id)),
        ),
    )
    .execute(conn)?;
    diesel::delete(
        dislikes::table.filter(
            dislikes::from_profile_id
                .eq(profile_id)
                .or(dislikes::to_profile_id.eq(profile_id)),
        ),
    )
    .execute(conn)?;
    diesel::delete(
        profile_views::table.filter(
            profile_views::viewer_profile_id
                .eq(profile_id)
                .or(profile_views::viewed_profile_id.eq(profile_id)),
        ),
    )
    .execute(conn)?;
    diesel::delete(subscriptions::table.filter(subscriptions::profile_id.eq(profile_id)))
        .execute(conn)?;
    diesel::delete(boosts::table.filter(boosts::profile_id.eq(profile_id))).execute(conn)?;
    diesel::delete(daily_likes::table.filter(daily_likes::profile_id.eq(profile_id)))
        .execute(conn)?;
    diesel::delete(daily_undos::table.filter(daily_undos::profile_id.eq(profile_id)))
        .execute(conn)?;
    diesel::delete(profiles::table.find(profile_id)).execute(conn)?;
    Ok(())
}

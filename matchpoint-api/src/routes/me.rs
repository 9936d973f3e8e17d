use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use matchpoint_shared::errors::{AppError, AppResult};
use matchpoint_shared::types::session::Session;
use matchpoint_shared::types::ApiResponse;

use crate::models::Profile;
use crate::routes::matches::{join_profiles, MatchView};
use crate::schema::{dislikes, likes, matches, payments, profile_views, profiles, referrals};
use crate::services::limits::{self, LimitsInfo};
use crate::services::referral;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CharacterQuery {
    pub character_id: i64,
}

/// GET /me/limits?character_id= - quota, tier, boost and reset state.
pub async fn my_limits(
    session: Session,
    State(state): State<Arc<AppState>>,
    Query(query): Query<CharacterQuery>,
) -> AppResult<Json<ApiResponse<LimitsInfo>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = super::my_profile(&mut conn, session.account_id, query.character_id)?;
    let info = limits::limits_info(&mut conn, me.id)?;

    Ok(Json(ApiResponse::ok(info)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub likes_received: i64,
    pub likes_sent: i64,
    pub matches: i64,
    pub dislikes_sent: i64,
    pub total_views: i64,
    pub weekly_views: i64,
    pub days_active: i64,
    pub match_rate: i64,
    pub member_since: DateTime<Utc>,
}

/// GET /me/stats?character_id= - engagement statistics for the profile.
pub async fn my_stats(
    session: Session,
    State(state): State<Arc<AppState>>,
    Query(query): Query<CharacterQuery>,
) -> AppResult<Json<ApiResponse<StatsResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = super::my_profile(&mut conn, session.account_id, query.character_id)?;
    let now = Utc::now();
    let week_ago = now - Duration::days(7);

    let likes_received: i64 = likes::table
        .filter(likes::to_profile_id.eq(me.id))
        .count()
        .get_result(&mut conn)?;
    let likes_sent: i64 = likes::table
        .filter(likes::from_profile_id.eq(me.id))
        .count()
        .get_result(&mut conn)?;
    let match_count: i64 = matches::table
        .filter(matches::profile_1_id.eq(me.id).or(matches::profile_2_id.eq(me.id)))
        .count()
        .get_result(&mut conn)?;
    let dislikes_sent: i64 = dislikes::table
        .filter(dislikes::from_profile_id.eq(me.id))
        .count()
        .get_result(&mut conn)?;
    let total_views: i64 = profile_views::table
        .filter(profile_views::viewed_profile_id.eq(me.id))
        .count()
        .get_result(&mut conn)?;
    let weekly_views: i64 = profile_views::table
        .filter(profile_views::viewed_profile_id.eq(me.id))
        .filter(profile_views::created_at.gt(week_ago))
        .count()
        .get_result(&mut conn)?;

    let days_active = (now - me.created_at).num_days();
    let match_rate = if likes_sent > 0 {
        (match_count as f64 / likes_sent as f64 * 100.0).round() as i64
    } else {
        0
    };

    Ok(Json(ApiResponse::ok(StatsResponse {
        likes_received,
        likes_sent,
        matches: match_count,
        dislikes_sent,
        total_views,
        weekly_views,
        days_active,
        match_rate,
        member_since: me.created_at,
    })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub product: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub character_name: Option<String>,
}

/// GET /me/orders - payment history across all of the account's
/// profiles.
pub async fn my_orders(
    session: Session,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<OrderItem>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let my_profiles: Vec<(Uuid, String)> = profiles::table
        .filter(profiles::account_id.eq(session.account_id))
        .select((profiles::id, profiles::character_name))
        .load(&mut conn)?;

    if my_profiles.is_empty() {
        return Ok(Json(ApiResponse::ok(vec![])));
    }

    let names: HashMap<Uuid, String> = my_profiles.iter().cloned().collect();
    let ids: Vec<Uuid> = my_profiles.into_iter().map(|(id, _)| id).collect();

    let rows: Vec<(Uuid, Option<Uuid>, String, i64, DateTime<Utc>)> = payments::table
        .filter(payments::profile_id.eq_any(ids.iter().map(|id| Some(*id)).collect::<Vec<_>>()))
        .order(payments::created_at.desc())
        .select((
            payments::id,
            payments::profile_id,
            payments::product,
            payments::amount,
            payments::created_at,
        ))
        .load(&mut conn)?;

    let orders = rows
        .into_iter()
        .map(|(id, profile_id, product, amount, created_at)| OrderItem {
            id,
            product,
            amount,
            created_at,
            character_name: profile_id.and_then(|pid| names.get(&pid).cloned()),
        })
        .collect();

    Ok(Json(ApiResponse::ok(orders)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralCodeResponse {
    pub code: String,
    pub invite_link: String,
    pub referral_count: i64,
}

/// GET /me/referral-code - the caller's invite code, link and count.
pub async fn my_referral_code(
    session: Session,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<ReferralCodeResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let code = referral::get_or_create_code(&mut conn, session.account_id)?;
    let invite_link = format!("{}?ref={}", state.config.base_url.trim_end_matches('/'), code);
    let referral_count: i64 = referrals::table
        .filter(referrals::referrer_account_id.eq(session.account_id))
        .count()
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(ReferralCodeResponse {
        code,
        invite_link,
        referral_count,
    })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResponse {
    pub has_profile: bool,
    pub profile: Option<Profile>,
    pub matches: Vec<MatchView>,
    pub limits: Option<LimitsInfo>,
    pub liked_by_count: usize,
}

/// GET /me/init?character_id= - one-call bootstrap for the client:
/// profile + matches + limits + pending-liker count.
pub async fn init(
    session: Session,
    State(state): State<Arc<AppState>>,
    Query(query): Query<CharacterQuery>,
) -> AppResult<Json<ApiResponse<InitResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let Some(me) = super::my_profile_opt(&mut conn, session.account_id, query.character_id)? else {
        return Ok(Json(ApiResponse::ok(InitResponse {
            has_profile: false,
            profile: None,
            matches: vec![],
            limits: None,
            liked_by_count: 0,
        })));
    };

    super::touch_last_active(&mut conn, me.id);

    let rows = matches::table
        .filter(matches::profile_1_id.eq(me.id).or(matches::profile_2_id.eq(me.id)))
        .order(matches::created_at.desc())
        .load(&mut conn)?;
    let match_views = join_profiles(&mut conn, rows)?;

    let limits_info = limits::limits_info(&mut conn, me.id)?;
    let liked_by_count = crate::routes::discovery::actionable_liker_ids(&mut conn, me.id)?.len();

    Ok(Json(ApiResponse::ok(InitResponse {
        has_profile: true,
        profile: Some(me),
        matches: match_views,
        limits: Some(limits_info),
        liked_by_count,
    })))
}

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use matchpoint_shared::errors::{AppError, AppResult, ErrorCode};
use matchpoint_shared::types::session::Session;
use matchpoint_shared::types::ApiResponse;

use crate::models::{Match, NewRejectedMatch, Profile};
use crate::schema::{blocks, matches, profiles, rejected_matches};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MatchesQuery {
    pub character_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub profile_1: Option<Profile>,
    pub profile_2: Option<Profile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyMatchesResponse {
    pub has_profile: bool,
    pub matches: Vec<MatchView>,
}

/// GET /matches?character_id= - the caller's matches with both profiles
/// joined; counterparts the caller blocked are dropped.
pub async fn my_matches(
    session: Session,
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchesQuery>,
) -> AppResult<Json<ApiResponse<MyMatchesResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let Some(me) = super::my_profile_opt(&mut conn, session.account_id, query.character_id)? else {
        return Ok(Json(ApiResponse::ok(MyMatchesResponse {
            has_profile: false,
            matches: vec![],
        })));
    };

    let rows: Vec<Match> = matches::table
        .filter(matches::profile_1_id.eq(me.id).or(matches::profile_2_id.eq(me.id)))
        .order(matches::created_at.desc())
        .load(&mut conn)?;

    let blocked: HashSet<Uuid> = blocks::table
        .filter(blocks::blocker_profile_id.eq(me.id))
        .select(blocks::blocked_profile_id)
        .load::<Uuid>(&mut conn)?
        .into_iter()
        .collect();

    let views = join_profiles(&mut conn, rows)?
        .into_iter()
        .filter(|v| {
            let counterpart = if v.profile_1.as_ref().map(|p| p.id) == Some(me.id) {
                v.profile_2.as_ref().map(|p| p.id)
            } else {
                v.profile_1.as_ref().map(|p| p.id)
            };
            counterpart.map_or(true, |id| !blocked.contains(&id))
        })
        .collect();

    Ok(Json(ApiResponse::ok(MyMatchesResponse {
        has_profile: true,
        matches: views,
    })))
}

/// Load both profiles for a set of match rows. Shared with the admin
/// listing.
pub(crate) fn join_profiles(
    conn: &mut diesel::pg::PgConnection,
    rows: Vec<Match>,
) -> AppResult<Vec<MatchView>> {
    let mut ids: HashSet<Uuid> = HashSet::new();
    for m in &rows {
        ids.insert(m.profile_1_id);
        ids.insert(m.profile_2_id);
    }
    let ids: Vec<Uuid> = ids.into_iter().collect();

    let by_id: HashMap<Uuid, Profile> = profiles::table
        .filter(profiles::id.eq_any(&ids))
        .load::<Profile>(conn)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(rows
        .into_iter()
        .map(|m| MatchView {
            id: m.id,
            created_at: m.created_at,
            profile_1: by_id.get(&m.profile_1_id).cloned(),
            profile_2: by_id.get(&m.profile_2_id).cloned(),
        })
        .collect())
}

#[derive(Debug, Deserialize)]
pub struct RejectMatchRequest {
    pub character_id: i64,
}

#[derive(Debug, Serialize)]
pub struct RejectMatchResponse {
    pub rejected: bool,
}

/// POST /matches/:id/reject - unmatch; the pair is remembered so it is
/// not re-surfaced.
pub async fn reject_match(
    session: Session,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
    Json(req): Json<RejectMatchRequest>,
) -> AppResult<Json<ApiResponse<RejectMatchResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = super::my_profile(&mut conn, session.account_id, req.character_id)?;

    let matched: Match = matches::table
        .find(match_id)
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::MatchNotFound, "match not found"))?;

    if matched.profile_1_id != me.id && matched.profile_2_id != me.id {
        return Err(AppError::new(
            ErrorCode::NotMatchMember,
            "you are not part of this match",
        ));
    }

    diesel::delete(matches::table.find(match_id)).execute(&mut conn)?;

    let (low, high) = super::sorted_pair(matched.profile_1_id, matched.profile_2_id);
    diesel::insert_into(rejected_matches::table)
        .values(&NewRejectedMatch {
            profile_1_id: low,
            profile_2_id: high,
            rejected_by: me.id,
        })
        .on_conflict((rejected_matches::profile_1_id, rejected_matches::profile_2_id))
        .do_nothing()
        .execute(&mut conn)?;

    tracing::info!(match_id = %match_id, rejected_by = %me.id, "match rejected");

    Ok(Json(ApiResponse::ok(RejectMatchResponse { rejected: true })))
}

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Datelike, Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use matchpoint_shared::errors::{AppError, AppResult};
use matchpoint_shared::types::session::Session;
use matchpoint_shared::types::ApiResponse;

use crate::models::{NewProfileView, Profile, ProfileCard};
use crate::routes::engagement::DISLIKE_SUPPRESS_HOURS;
use crate::schema::{
    blocks, boosts, dislikes, likes, matches, profile_views, profiles, rejected_matches,
};
use crate::services::compatibility::{orientations_accepting, wanted_for, Gender};
use crate::services::completeness::completeness;
use crate::services::limits::{self, Tier};
use crate::AppState;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 50;
const BOOSTED_CAP: usize = 10;
const VIEW_LOG_CAP: usize = 5;

#[derive(Debug, Deserialize)]
pub struct DiscoveryQuery {
    pub character_id: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResponse {
    pub has_profile: bool,
    pub possible_matches: Vec<ProfileCard>,
    pub profile: Option<Profile>,
}

/// GET /discovery - compatible candidates the caller has not yet acted
/// on: boosted first, then by completeness.
pub async fn possible_matches(
    session: Session,
    State(state): State<Arc<AppState>>,
    Query(query): Query<DiscoveryQuery>,
) -> AppResult<Json<ApiResponse<DiscoveryResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let Some(me) = super::my_profile_opt(&mut conn, session.account_id, query.character_id)? else {
        return Ok(Json(ApiResponse::ok(DiscoveryResponse {
            has_profile: false,
            possible_matches: vec![],
            profile: None,
        })));
    };

    let limit = query.limit.clamp(1, MAX_LIMIT) as usize;
    let now = Utc::now();
    let suppress_after = now - Duration::hours(DISLIKE_SUPPRESS_HOURS);

    let liked_ids: Vec<Uuid> = likes::table
        .filter(likes::from_profile_id.eq(me.id))
        .select(likes::to_profile_id)
        .load(&mut conn)?;
    let disliked_ids: Vec<Uuid> = dislikes::table
        .filter(dislikes::from_profile_id.eq(me.id))
        .filter(dislikes::created_at.gt(suppress_after))
        .select(dislikes::to_profile_id)
        .load(&mut conn)?;
    let match_pairs: Vec<(Uuid, Uuid)> = matches::table
        .filter(matches::profile_1_id.eq(me.id).or(matches::profile_2_id.eq(me.id)))
        .select((matches::profile_1_id, matches::profile_2_id))
        .load(&mut conn)?;
    let rejected_pairs: Vec<(Uuid, Uuid)> = rejected_matches::table
        .filter(
            rejected_matches::profile_1_id
                .eq(me.id)
                .or(rejected_matches::profile_2_id.eq(me.id)),
        )
        .select((rejected_matches::profile_1_id, rejected_matches::profile_2_id))
        .load(&mut conn)?;
    let blocked_ids: Vec<Uuid> = blocks::table
        .filter(blocks::blocker_profile_id.eq(me.id))
        .select(blocks::blocked_profile_id)
        .load(&mut conn)?;
    let boosted_ids: HashSet<Uuid> = boosts::table
        .filter(boosts::expires_at.gt(now))
        .select(boosts::profile_id)
        .load::<Uuid>(&mut conn)?
        .into_iter()
        .collect();

    let mut exclude_ids: HashSet<Uuid> = HashSet::new();
    exclude_ids.insert(me.id);
    exclude_ids.extend(liked_ids);
    exclude_ids.extend(disliked_ids);
    exclude_ids.extend(blocked_ids);
    for (a, b) in match_pairs.into_iter().chain(rejected_pairs) {
        exclude_ids.insert(a);
        exclude_ids.insert(b);
    }
    let exclude_ids: Vec<Uuid> = exclude_ids.into_iter().collect();

    let wanted = wanted_for(&me.gender, &me.orientation);
    let Ok(my_gender) = Gender::from_str(&me.gender) else {
        return Ok(Json(ApiResponse::ok(DiscoveryResponse {
            has_profile: true,
            possible_matches: vec![],
            profile: Some(me),
        })));
    };
    if wanted.is_empty() {
        return Ok(Json(ApiResponse::ok(DiscoveryResponse {
            has_profile: true,
            possible_matches: vec![],
            profile: Some(me),
        })));
    }

    // The counterpart half of the compatibility check runs in SQL: a
    // candidate of gender G qualifies only with an orientation that
    // accepts my gender.
    let fetch_size = (limit + 10) as i64;
    let mut candidates: Vec<Profile> = Vec::new();
    for want in wanted {
        let accepted: Vec<&str> = orientations_accepting(*want, my_gender)
            .iter()
            .map(|o| o.as_str())
            .collect();
        let batch: Vec<Profile> = profiles::table
            .filter(profiles::gender.eq(want.as_str()))
            .filter(profiles::orientation.eq_any(&accepted))
            .filter(profiles::id.ne_all(&exclude_ids))
            .limit(fetch_size)
            .load(&mut conn)?;
        candidates.extend(batch);
    }

    let (boosted, mut rest): (Vec<Profile>, Vec<Profile>) = candidates
        .into_iter()
        .partition(|p| boosted_ids.contains(&p.id));
    rest.sort_by_key(|p| std::cmp::Reverse(completeness(p)));

    let surfaced: Vec<Profile> = boosted
        .into_iter()
        .take(BOOSTED_CAP)
        .chain(rest)
        .take(limit)
        .collect();

    let cards = annotate_counts(&mut conn, surfaced)?;

    // Log impressions for the top of the deck.
    let views: Vec<NewProfileView> = cards
        .iter()
        .take(VIEW_LOG_CAP)
        .map(|c| NewProfileView {
            viewer_profile_id: me.id,
            viewed_profile_id: c.profile.id,
        })
        .collect();
    if !views.is_empty() {
        if let Err(e) = diesel::insert_into(profile_views::table)
            .values(&views)
            .execute(&mut conn)
        {
            tracing::error!(error = %e, "profile view logging failed");
        }
    }

    Ok(Json(ApiResponse::ok(DiscoveryResponse {
        has_profile: true,
        possible_matches: cards,
        profile: Some(me),
    })))
}

/// Attach incoming-like and match counts to surfaced profiles.
fn annotate_counts(
    conn: &mut diesel::pg::PgConnection,
    surfaced: Vec<Profile>,
) -> AppResult<Vec<ProfileCard>> {
    let ids: Vec<Uuid> = surfaced.iter().map(|p| p.id).collect();
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let like_counts: HashMap<Uuid, i64> = likes::table
        .filter(likes::to_profile_id.eq_any(&ids))
        .group_by(likes::to_profile_id)
        .select((likes::to_profile_id, diesel::dsl::count_star()))
        .load::<(Uuid, i64)>(conn)?
        .into_iter()
        .collect();

    let mut match_counts: HashMap<Uuid, i64> = HashMap::new();
    let pairs: Vec<(Uuid, Uuid)> = matches::table
        .filter(
            matches::profile_1_id
                .eq_any(&ids)
                .or(matches::profile_2_id.eq_any(&ids)),
        )
        .select((matches::profile_1_id, matches::profile_2_id))
        .load(conn)?;
    for (a, b) in pairs {
        *match_counts.entry(a).or_default() += 1;
        *match_counts.entry(b).or_default() += 1;
    }

    Ok(surfaced
        .into_iter()
        .map(|p| {
            let liked_count = like_counts.get(&p.id).copied().unwrap_or(0);
            let match_count = match_counts.get(&p.id).copied().unwrap_or(0);
            ProfileCard { profile: p, liked_count, match_count }
        })
        .collect())
}

#[derive(Debug, Deserialize)]
pub struct LikedMeQuery {
    pub character_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedMeResponse {
    pub count: usize,
    /// Populated for pro subscribers only; everyone else just sees the
    /// count.
    pub liked_by: Vec<Profile>,
}

/// Incoming likers the caller can still act on: not matched, not
/// currently dislike-suppressed, not already liked back, not blocked.
pub(crate) fn actionable_liker_ids(
    conn: &mut diesel::pg::PgConnection,
    me_id: Uuid,
) -> AppResult<Vec<Uuid>> {
    let suppress_after = Utc::now() - Duration::hours(DISLIKE_SUPPRESS_HOURS);

    let liker_ids: Vec<Uuid> = likes::table
        .filter(likes::to_profile_id.eq(me_id))
        .select(likes::from_profile_id)
        .load(conn)?;

    let matched: HashSet<Uuid> = matches::table
        .filter(matches::profile_1_id.eq(me_id).or(matches::profile_2_id.eq(me_id)))
        .select((matches::profile_1_id, matches::profile_2_id))
        .load::<(Uuid, Uuid)>(conn)?
        .into_iter()
        .map(|(a, b)| if a == me_id { b } else { a })
        .collect();
    let disliked: HashSet<Uuid> = dislikes::table
        .filter(dislikes::from_profile_id.eq(me_id))
        .filter(dislikes::created_at.gt(suppress_after))
        .select(dislikes::to_profile_id)
        .load::<Uuid>(conn)?
        .into_iter()
        .collect();
    let already_liked: HashSet<Uuid> = likes::table
        .filter(likes::from_profile_id.eq(me_id))
        .select(likes::to_profile_id)
        .load::<Uuid>(conn)?
        .into_iter()
        .collect();
    let blocked: HashSet<Uuid> = blocks::table
        .filter(blocks::blocker_profile_id.eq(me_id))
        .select(blocks::blocked_profile_id)
        .load::<Uuid>(conn)?
        .into_iter()
        .collect();

    Ok(liker_ids
        .into_iter()
        .filter(|id| {
            !matched.contains(id)
                && !disliked.contains(id)
                && !already_liked.contains(id)
                && !blocked.contains(id)
        })
        .collect())
}

/// GET /discovery/liked-me - who likes me and is still actionable.
pub async fn liked_me(
    session: Session,
    State(state): State<Arc<AppState>>,
    Query(query): Query<LikedMeQuery>,
) -> AppResult<Json<ApiResponse<LikedMeResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = super::my_profile(&mut conn, session.account_id, query.character_id)?;
    let tier = limits::tier_of(&mut conn, me.id)?;

    let actionable = actionable_liker_ids(&mut conn, me.id)?;
    let count = actionable.len();
    if tier != Tier::Pro || count == 0 {
        return Ok(Json(ApiResponse::ok(LikedMeResponse { count, liked_by: vec![] })));
    }

    let liked_by: Vec<Profile> = profiles::table
        .filter(profiles::id.eq_any(&actionable))
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(LikedMeResponse { count, liked_by })))
}

#[derive(Debug, Serialize)]
pub struct SpotlightResponse {
    pub spotlight: Option<Profile>,
}

/// GET /discovery/spotlight - profile of the day: a boosted profile if
/// one exists, else a day-keyed pick among the week's most liked.
pub async fn spotlight(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<SpotlightResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let now = Utc::now();

    let boosted: Option<Uuid> = boosts::table
        .filter(boosts::expires_at.gt(now))
        .select(boosts::profile_id)
        .first(&mut conn)
        .optional()?;

    let spotlight_id = match boosted {
        Some(id) => Some(id),
        None => {
            let week_ago = now - Duration::days(7);
            let recent: Vec<Uuid> = likes::table
                .filter(likes::created_at.gt(week_ago))
                .select(likes::to_profile_id)
                .limit(200)
                .load(&mut conn)?;

            let mut counts: HashMap<Uuid, i64> = HashMap::new();
            for id in recent {
                *counts.entry(id).or_default() += 1;
            }
            let mut ranked: Vec<(Uuid, i64)> = counts.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

            if ranked.is_empty() {
                None
            } else {
                // Deterministic per calendar day.
                let day_key = format!("{}-{}-{}", now.year(), now.month0(), now.day());
                let day_hash: usize = day_key.bytes().map(|b| b as usize).sum();
                let idx = day_hash % ranked.len().min(5);
                Some(ranked[idx].0)
            }
        }
    };

    let spotlight = match spotlight_id {
        Some(id) => profiles::table.find(id).first::<Profile>(&mut conn).optional()?,
        None => None,
    };

    Ok(Json(ApiResponse::ok(SpotlightResponse { spotlight })))
}

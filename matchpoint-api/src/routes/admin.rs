use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use matchpoint_shared::errors::{AppError, AppResult, ErrorCode};
use matchpoint_shared::middleware::AdminAuth;
use matchpoint_shared::types::pagination::{Paginated, PaginationParams};
use matchpoint_shared::types::ApiResponse;

use crate::models::{Ad, AuditLog, Match, NewMatch, Profile, RejectedMatch, Report, UpsertSetting};
use crate::routes::ads::ADS_ENABLED_KEY;
use crate::routes::matches::{join_profiles, MatchView};
use crate::routes::profiles::delete_profile_cascade;
use crate::schema::{
    ads, audit_logs, boosts, link_visits, matches, payments, profiles, referral_codes, referrals,
    rejected_matches, reports, settings, subscriptions,
};
use crate::services::audit;
use crate::services::limits::{self, Tier};
use crate::AppState;

// --- Profiles ---

/// GET /admin/profiles - every profile, newest first.
pub async fn list_profiles(
    admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Profile>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    tracing::info!(admin_name = %admin.admin_name, "admin listed profiles");
    audit::record(
        &mut conn,
        "admin_login",
        &admin.admin_name,
        serde_json::json!({ "info": "admin panel accessed" }),
    );

    let list: Vec<Profile> = profiles::table
        .order(profiles::created_at.desc())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(list)))
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

/// DELETE /admin/profiles/:id - remove a profile and its dependents.
pub async fn delete_profile(
    admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeletedResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile: Profile = profiles::table
        .find(profile_id)
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    delete_profile_cascade(&mut conn, profile_id)?;

    audit::record(
        &mut conn,
        "delete_profile",
        &admin.admin_name,
        serde_json::json!({
            "profile_id": profile_id,
            "name": format!("{} {}", profile.first_name, profile.last_name),
        }),
    );
    tracing::info!(admin_name = %admin.admin_name, profile_id = %profile_id, "admin deleted profile");

    Ok(Json(ApiResponse::ok(DeletedResponse { deleted: true })))
}

// --- Matches ---

/// GET /admin/matches - every match with both profiles joined.
pub async fn list_matches(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<MatchView>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<Match> = matches::table
        .order(matches::created_at.desc())
        .load(&mut conn)?;
    let views = join_profiles(&mut conn, rows)?;

    Ok(Json(ApiResponse::ok(views)))
}

#[derive(Debug, Deserialize)]
pub struct CreateMatchRequest {
    pub profile_1_id: Uuid,
    pub profile_2_id: Uuid,
}

/// POST /admin/matches - create a match by hand.
pub async fn create_match(
    admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMatchRequest>,
) -> AppResult<Json<ApiResponse<Match>>> {
    if req.profile_1_id == req.profile_2_id {
        return Err(AppError::bad_request("cannot match a profile with itself"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let (low, high) = super::sorted_pair(req.profile_1_id, req.profile_2_id);
    let created: Match = diesel::insert_into(matches::table)
        .values(&NewMatch {
            profile_1_id: low,
            profile_2_id: high,
            created_by: "admin",
            created_by_admin: Some(&admin.admin_name),
        })
        .on_conflict((matches::profile_1_id, matches::profile_2_id))
        .do_update()
        .set(matches::created_by_admin.eq(&admin.admin_name))
        .get_result(&mut conn)?;

    audit::record(
        &mut conn,
        "create_match",
        &admin.admin_name,
        serde_json::json!({ "match_id": created.id, "profile_1": low, "profile_2": high }),
    );

    Ok(Json(ApiResponse::ok(created)))
}

/// DELETE /admin/matches/:id
pub async fn delete_match(
    admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeletedResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let deleted = diesel::delete(matches::table.find(match_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::new(ErrorCode::MatchNotFound, "match not found"));
    }

    audit::record(
        &mut conn,
        "delete_match",
        &admin.admin_name,
        serde_json::json!({ "match_id": match_id }),
    );

    Ok(Json(ApiResponse::ok(DeletedResponse { deleted: true })))
}

/// GET /admin/rejected-matches
pub async fn list_rejected_matches(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<RejectedMatch>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<RejectedMatch> = rejected_matches::table
        .order(rejected_matches::created_at.desc())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(rows)))
}

/// GET /admin/reports
pub async fn list_reports(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Report>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<Report> = reports::table
        .order(reports::created_at.desc())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(rows)))
}

// --- Subscriptions ---

#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    pub profile_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub tier: Tier,
    pub expires_at: Option<DateTime<Utc>>,
    pub boost_expires_at: Option<DateTime<Utc>>,
}

/// GET /admin/subscription?profile_id= - membership state of a profile.
pub async fn get_subscription(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SubscriptionQuery>,
) -> AppResult<Json<ApiResponse<SubscriptionStatus>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let now = Utc::now();
    let sub = limits::subscription_of(&mut conn, query.profile_id)?;
    let (tier, expires_at) = match sub {
        Some(s) if s.expires_at > now => (Tier::parse(&s.tier), Some(s.expires_at)),
        Some(s) => (Tier::Free, Some(s.expires_at)),
        None => (Tier::Free, None),
    };
    let boost_expires_at = limits::boost_expiry(&mut conn, query.profile_id)?;

    Ok(Json(ApiResponse::ok(SubscriptionStatus {
        tier,
        expires_at,
        boost_expires_at,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SetSubscriptionRequest {
    pub profile_id: Uuid,
    pub tier: String,
    pub duration_days: Option<i64>,
}

/// POST /admin/subscription - override a profile's membership. Setting
/// tier `free` removes the subscription row.
pub async fn set_subscription(
    admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetSubscriptionRequest>,
) -> AppResult<Json<ApiResponse<SubscriptionStatus>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    if req.tier == "free" {
        diesel::delete(subscriptions::table.filter(subscriptions::profile_id.eq(req.profile_id)))
            .execute(&mut conn)?;
    } else {
        let tier = match req.tier.as_str() {
            "plus" => Tier::Plus,
            "pro" => Tier::Pro,
            _ => return Err(AppError::Validation("tier must be free, plus, or pro".into())),
        };
        let days = req.duration_days.unwrap_or(30).max(1);
        limits::extend_or_set_subscription(&mut conn, req.profile_id, tier, days)?;
    }

    audit::record(
        &mut conn,
        "set_subscription",
        &admin.admin_name,
        serde_json::json!({ "profile_id": req.profile_id, "tier": req.tier }),
    );

    let now = Utc::now();
    let sub = limits::subscription_of(&mut conn, req.profile_id)?;
    let (tier, expires_at) = match sub {
        Some(s) if s.expires_at > now => (Tier::parse(&s.tier), Some(s.expires_at)),
        _ => (Tier::Free, None),
    };
    let boost_expires_at = limits::boost_expiry(&mut conn, req.profile_id)?;

    Ok(Json(ApiResponse::ok(SubscriptionStatus {
        tier,
        expires_at,
        boost_expires_at,
    })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionListItem {
    pub profile_id: Uuid,
    pub tier: String,
    pub expires_at: DateTime<Utc>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub character_name: Option<String>,
}

/// GET /admin/subscriptions - all active memberships with names.
pub async fn list_subscriptions(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<SubscriptionListItem>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let now = Utc::now();
    let subs: Vec<(Uuid, String, DateTime<Utc>)> = subscriptions::table
        .filter(subscriptions::expires_at.gt(now))
        .order(subscriptions::expires_at.desc())
        .select((subscriptions::profile_id, subscriptions::tier, subscriptions::expires_at))
        .load(&mut conn)?;

    let ids: Vec<Uuid> = subs.iter().map(|(id, _, _)| *id).collect();
    let names = profile_names(&mut conn, &ids)?;

    let list = subs
        .into_iter()
        .map(|(profile_id, tier, expires_at)| {
            let name = names.get(&profile_id);
            SubscriptionListItem {
                profile_id,
                tier,
                expires_at,
                first_name: name.map(|n| n.0.clone()),
                last_name: name.map(|n| n.1.clone()),
                character_name: name.map(|n| n.2.clone()),
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(list)))
}

// --- Payments ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentListItem {
    pub id: Uuid,
    pub profile_id: Option<Uuid>,
    pub product: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub character_name: Option<String>,
}

/// GET /admin/payments - all receipts with names.
pub async fn list_payments(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<PaymentListItem>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<(Uuid, Option<Uuid>, String, i64, DateTime<Utc>)> = payments::table
        .order(payments::created_at.desc())
        .select((
            payments::id,
            payments::profile_id,
            payments::product,
            payments::amount,
            payments::created_at,
        ))
        .load(&mut conn)?;

    let ids: Vec<Uuid> = rows.iter().filter_map(|(_, pid, _, _, _)| *pid).collect();
    let names = profile_names(&mut conn, &ids)?;

    let list = rows
        .into_iter()
        .map(|(id, profile_id, product, amount, created_at)| {
            let name = profile_id.and_then(|pid| names.get(&pid));
            PaymentListItem {
                id,
                profile_id,
                product,
                amount,
                created_at,
                first_name: name.map(|n| n.0.clone()),
                last_name: name.map(|n| n.1.clone()),
                character_name: name.map(|n| n.2.clone()),
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(list)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub total: i64,
    pub last_week: i64,
    pub from_subscriptions: i64,
    pub from_boosts: i64,
    pub from_ads: i64,
    pub by_product: HashMap<String, i64>,
}

/// GET /admin/payments/stats - revenue totals.
pub async fn payment_stats(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<PaymentStats>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<(String, i64, DateTime<Utc>)> = payments::table
        .select((payments::product, payments::amount, payments::created_at))
        .load(&mut conn)?;

    let week_ago = Utc::now() - Duration::days(7);
    let mut total = 0;
    let mut last_week = 0;
    let mut by_product: HashMap<String, i64> = HashMap::new();
    for (product, amount, created_at) in rows {
        total += amount;
        if created_at >= week_ago {
            last_week += amount;
        }
        *by_product.entry(product).or_default() += amount;
    }

    let sum = |keys: &[&str]| -> i64 {
        keys.iter().filter_map(|k| by_product.get(*k)).sum()
    };
    let from_subscriptions = sum(&["plus", "pro"]);
    let from_boosts = sum(&["boost"]);
    let from_ads = sum(&["ad_left", "ad_right"]);

    Ok(Json(ApiResponse::ok(PaymentStats {
        total,
        last_week,
        from_subscriptions,
        from_boosts,
        from_ads,
        by_product,
    })))
}

// --- Referrals / link stats ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStatsItem {
    pub code: String,
    pub account_id: i64,
    pub owner_name: String,
    pub count: i64,
}

/// GET /admin/referrals - invite codes ranked by redeemed invites.
pub async fn referral_stats(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ReferralStatsItem>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let codes: Vec<(i64, String)> = referral_codes::table
        .order(referral_codes::account_id.asc())
        .select((referral_codes::account_id, referral_codes::code))
        .load(&mut conn)?;

    if codes.is_empty() {
        return Ok(Json(ApiResponse::ok(vec![])));
    }

    let referrers: Vec<i64> = referrals::table
        .select(referrals::referrer_account_id)
        .load(&mut conn)?;
    let mut counts: HashMap<i64, i64> = HashMap::new();
    for id in referrers {
        *counts.entry(id).or_default() += 1;
    }

    let account_ids: Vec<i64> = codes.iter().map(|(id, _)| *id).collect();
    let owners: Vec<(i64, String, String)> = profiles::table
        .filter(profiles::account_id.eq_any(&account_ids))
        .select((profiles::account_id, profiles::first_name, profiles::last_name))
        .load(&mut conn)?;
    let mut owner_names: HashMap<i64, String> = HashMap::new();
    for (account_id, first, last) in owners {
        owner_names
            .entry(account_id)
            .or_insert_with(|| format!("{first} {last}"));
    }

    let mut list: Vec<ReferralStatsItem> = codes
        .into_iter()
        .map(|(account_id, code)| ReferralStatsItem {
            code,
            account_id,
            owner_name: owner_names
                .get(&account_id)
                .cloned()
                .unwrap_or_else(|| format!("account {account_id}")),
            count: counts.get(&account_id).copied().unwrap_or(0),
        })
        .collect();
    list.sort_by(|a, b| b.count.cmp(&a.count));

    Ok(Json(ApiResponse::ok(list)))
}

#[derive(Debug, Deserialize)]
pub struct LinkStatsQuery {
    #[serde(rename = "ref")]
    pub ref_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    pub total: i64,
    pub last_7_days: i64,
    pub today: i64,
}

/// GET /admin/link-stats?ref= - visit counts for a campaign tag.
pub async fn link_stats(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    Query(query): Query<LinkStatsQuery>,
) -> AppResult<Json<ApiResponse<LinkStats>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let now = Utc::now();
    let week_ago = now - Duration::days(7);
    let today_start = now
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc();

    let total: i64 = link_visits::table
        .filter(link_visits::ref_code.eq(&query.ref_code))
        .count()
        .get_result(&mut conn)?;
    let last_7_days: i64 = link_visits::table
        .filter(link_visits::ref_code.eq(&query.ref_code))
        .filter(link_visits::created_at.ge(week_ago))
        .count()
        .get_result(&mut conn)?;
    let today: i64 = link_visits::table
        .filter(link_visits::ref_code.eq(&query.ref_code))
        .filter(link_visits::created_at.ge(today_start))
        .count()
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(LinkStats { total, last_7_days, today })))
}

// --- Ads / settings ---

#[derive(Debug, Serialize)]
pub struct AdsToggleResponse {
    pub enabled: bool,
}

/// GET /admin/ads/status
pub async fn get_ads_toggle(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<AdsToggleResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let enabled = crate::routes::ads::ads_enabled(&mut conn)?;
    Ok(Json(ApiResponse::ok(AdsToggleResponse { enabled })))
}

#[derive(Debug, Deserialize)]
pub struct SetAdsToggleRequest {
    pub enabled: bool,
}

/// POST /admin/ads/status - switch banners on or off site-wide.
pub async fn set_ads_toggle(
    admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetAdsToggleRequest>,
) -> AppResult<Json<ApiResponse<AdsToggleResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let value = if req.enabled { "true" } else { "false" };
    diesel::insert_into(settings::table)
        .values(&UpsertSetting { key: ADS_ENABLED_KEY, value })
        .on_conflict(settings::key)
        .do_update()
        .set(settings::value.eq(value))
        .execute(&mut conn)?;

    audit::record(
        &mut conn,
        "toggle_ads",
        &admin.admin_name,
        serde_json::json!({ "enabled": req.enabled }),
    );

    Ok(Json(ApiResponse::ok(AdsToggleResponse { enabled: req.enabled })))
}

/// GET /admin/ads - every ad row, newest first.
pub async fn list_ads(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Ad>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let list: Vec<Ad> = ads::table.order(ads::created_at.desc()).load(&mut conn)?;

    Ok(Json(ApiResponse::ok(list)))
}

/// DELETE /admin/ads/:id - deactivate (rows are kept for bookkeeping).
pub async fn deactivate_ad(
    admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    Path(ad_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeletedResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let updated = diesel::update(ads::table.find(ad_id))
        .set(ads::is_active.eq(false))
        .execute(&mut conn)?;
    if updated == 0 {
        return Err(AppError::not_found("ad not found"));
    }

    audit::record(
        &mut conn,
        "deactivate_ad",
        &admin.admin_name,
        serde_json::json!({ "ad_id": ad_id }),
    );

    Ok(Json(ApiResponse::ok(DeletedResponse { deleted: true })))
}

/// GET /admin/logs - the audit trail, newest first, paginated.
pub async fn list_logs(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<AuditLog>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let total: i64 = audit_logs::table.count().get_result(&mut conn)?;
    let logs: Vec<AuditLog> = audit_logs::table
        .order(audit_logs::created_at.desc())
        .offset(params.offset() as i64)
        .limit(params.limit() as i64)
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(logs, total as u64, &params))))
}

// --- Boost overview used by the admin dashboard ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostListItem {
    pub profile_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// GET /admin/boosts - currently active boosts.
pub async fn list_boosts(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<BoostListItem>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<(Uuid, DateTime<Utc>)> = boosts::table
        .filter(boosts::expires_at.gt(Utc::now()))
        .order(boosts::expires_at.desc())
        .select((boosts::profile_id, boosts::expires_at))
        .load(&mut conn)?;

    let list = rows
        .into_iter()
        .map(|(profile_id, expires_at)| BoostListItem { profile_id, expires_at })
        .collect();

    Ok(Json(ApiResponse::ok(list)))
}

fn profile_names(
    conn: &mut diesel::pg::PgConnection,
    ids: &[Uuid],
) -> AppResult<HashMap<Uuid, (String, String, String)>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, String, String, String)> = profiles::table
        .filter(profiles::id.eq_any(ids))
        .select((
            profiles::id,
            profiles::first_name,
            profiles::last_name,
            profiles::character_name,
        ))
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(id, first, last, character)| (id, (first, last, character)))
        .collect())
}

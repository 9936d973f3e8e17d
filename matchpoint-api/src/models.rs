use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{
    accounts, ads, audit_logs, blocks, boosts, characters, daily_likes, dislikes, likes,
    link_visits, matches, messages, payments, pending_orders, profile_views, profiles, referrals,
    rejected_matches, reports, settings, subscriptions,
};

// --- Account / Character (silent identity tracking) ---

#[derive(Debug, Insertable)]
#[diesel(table_name = accounts)]
pub struct NewAccount<'a> {
    pub account_id: i64,
    pub username: &'a str,
    pub last_login_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = characters)]
pub struct NewCharacter<'a> {
    pub character_id: i64,
    pub account_id: i64,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub updated_at: DateTime<Utc>,
}

// --- Profile ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: Uuid,
    pub account_id: i64,
    pub character_id: i64,
    pub character_name: String,
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
    pub extra_photos: Vec<String>,
    pub prompts: serde_json::Value,
    pub looking_for: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = profiles)]
pub struct UpsertProfile {
    pub account_id: i64,
    pub character_id: i64,
    pub character_name: String,
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
    pub extra_photos: Vec<String>,
    pub prompts: serde_json::Value,
    pub looking_for: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

// --- Like / Dislike ---

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub from_profile_id: Uuid,
    pub to_profile_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = dislikes)]
pub struct NewDislike {
    pub from_profile_id: Uuid,
    pub to_profile_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// --- Match ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = matches)]
pub struct Match {
    pub id: Uuid,
    pub profile_1_id: Uuid,
    pub profile_2_id: Uuid,
    pub created_by: String,
    pub created_by_admin: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatch<'a> {
    pub profile_1_id: Uuid,
    pub profile_2_id: Uuid,
    pub created_by: &'a str,
    pub created_by_admin: Option<&'a str>,
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_profile_id: Uuid,
    pub receiver_profile_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub match_id: Uuid,
    pub sender_profile_id: Uuid,
    pub receiver_profile_id: Uuid,
    pub content: String,
}

// --- Block / Report ---

#[derive(Debug, Insertable)]
#[diesel(table_name = blocks)]
pub struct NewBlock {
    pub blocker_profile_id: Uuid,
    pub blocked_profile_id: Uuid,
}

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = reports)]
pub struct Report {
    pub id: Uuid,
    pub reporter_profile_id: Uuid,
    pub reported_profile_id: Uuid,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reports)]
pub struct NewReport {
    pub reporter_profile_id: Uuid,
    pub reported_profile_id: Uuid,
    pub reason: Option<String>,
}

// --- Rejected match ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = rejected_matches)]
pub struct RejectedMatch {
    pub id: Uuid,
    pub profile_1_id: Uuid,
    pub profile_2_id: Uuid,
    pub rejected_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = rejected_matches)]
pub struct NewRejectedMatch {
    pub profile_1_id: Uuid,
    pub profile_2_id: Uuid,
    pub rejected_by: Uuid,
}

// --- Profile view ---

#[derive(Debug, Insertable)]
#[diesel(table_name = profile_views)]
pub struct NewProfileView {
    pub viewer_profile_id: Uuid,
    pub viewed_profile_id: Uuid,
}

// --- Subscription / Boost / Daily counters ---

#[derive(Debug, Queryable, Serialize)]
#[diesel(table_name = subscriptions)]
pub struct Subscription {
    pub profile_id: Uuid,
    pub tier: String,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct UpsertSubscription<'a> {
    pub profile_id: Uuid,
    pub tier: &'a str,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = boosts)]
pub struct NewBoost {
    pub profile_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Queryable)]
#[diesel(table_name = daily_likes)]
pub struct DailyCounter {
    pub profile_id: Uuid,
    pub used: i32,
    pub reset_at: DateTime<Utc>,
}

// --- Referral ---

#[derive(Debug, Insertable)]
#[diesel(table_name = referrals)]
pub struct NewReferral {
    pub referrer_account_id: i64,
    pub referred_account_id: i64,
    pub referred_profile_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = link_visits)]
pub struct NewLinkVisit<'a> {
    pub ref_code: &'a str,
}

// --- Billing ---

#[derive(Debug, Queryable, Serialize, Clone)]
#[diesel(table_name = pending_orders)]
pub struct PendingOrder {
    pub order_id: String,
    pub profile_id: Option<Uuid>,
    pub account_id: i64,
    pub product: String,
    pub amount: i64,
    pub gateway_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = pending_orders)]
pub struct NewPendingOrder<'a> {
    pub order_id: &'a str,
    pub profile_id: Option<Uuid>,
    pub account_id: i64,
    pub product: &'a str,
    pub amount: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = payments)]
pub struct NewPayment<'a> {
    pub order_id: &'a str,
    pub profile_id: Option<Uuid>,
    pub product: &'a str,
    pub amount: i64,
    pub gateway_token: &'a str,
    pub gateway_response: serde_json::Value,
}

// --- Ads / Settings / Audit ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = ads)]
pub struct Ad {
    pub id: Uuid,
    pub account_id: i64,
    pub slot: String,
    pub image_url: String,
    pub link_url: String,
    pub order_id: Option<String>,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ads)]
pub struct NewAd<'a> {
    pub account_id: i64,
    pub slot: &'a str,
    pub image_url: &'a str,
    pub link_url: &'a str,
    pub order_id: Option<&'a str>,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = settings)]
pub struct UpsertSetting<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = audit_logs)]
pub struct AuditLog {
    pub id: Uuid,
    pub action: String,
    pub admin_name: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = audit_logs)]
pub struct NewAuditLog<'a> {
    pub action: &'a str,
    pub admin_name: &'a str,
    pub details: serde_json::Value,
}

/// Public projection of a profile as surfaced in discovery and match
/// listings, with engagement counts attached.
#[derive(Debug, Serialize)]
pub struct ProfileCard {
    #[serde(flatten)]
    pub profile: Profile,
    pub liked_count: i64,
    pub match_count: i64,
}

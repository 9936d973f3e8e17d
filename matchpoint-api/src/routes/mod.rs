pub mod admin;
pub mod ads;
pub mod badges;
pub mod billing;
pub mod chat;
pub mod discovery;
pub mod engagement;
pub mod health;
pub mod matches;
pub mod me;
pub mod moderation;
pub mod profiles;
pub mod referrals;
pub mod session;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use matchpoint_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::Profile;
use crate::schema::profiles as profiles_dsl;

/// The caller's profile for one of their characters; 404 when the
/// character has none.
pub(crate) fn my_profile(
    conn: &mut PgConnection,
    account_id: i64,
    character_id: i64,
) -> AppResult<Profile> {
    profiles_dsl::table
        .filter(profiles_dsl::account_id.eq(account_id))
        .filter(profiles_dsl::character_id.eq(character_id))
        .first::<Profile>(conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))
}

pub(crate) fn my_profile_opt(
    conn: &mut PgConnection,
    account_id: i64,
    character_id: i64,
) -> AppResult<Option<Profile>> {
    Ok(profiles_dsl::table
        .filter(profiles_dsl::account_id.eq(account_id))
        .filter(profiles_dsl::character_id.eq(character_id))
        .first::<Profile>(conn)
        .optional()?)
}

/// Refresh the activity timestamp; failures are not worth surfacing.
pub(crate) fn touch_last_active(conn: &mut PgConnection, profile_id: Uuid) {
    let _ = diesel::update(profiles_dsl::table.find(profile_id))
        .set(profiles_dsl::last_active_at.eq(Utc::now()))
        .execute(conn);
}

/// Sort a pair so matches and rejected pairs store (low, high).
pub(crate) fn sorted_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

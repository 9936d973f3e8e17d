//! Subscription tiers and per-profile daily quotas (likes, undos).
//! Counter rows reset lazily on read once the 24h window has passed;
//! there is no background job.

use chrono::{DateTime, Duration, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use matchpoint_shared::errors::AppResult;

use crate::models::{DailyCounter, Subscription, UpsertSubscription};
use crate::schema::{boosts, daily_likes, daily_undos, subscriptions};

pub const FREE_DAILY_LIKES: i32 = 25;
pub const PLUS_DAILY_LIKES: i32 = 20;
pub const PRO_DAILY_LIKES: i32 = 999_999;
pub const FREE_DAILY_UNDOS: i32 = 1;
pub const PRO_DAILY_UNDOS: i32 = 5;
pub const RESET_WINDOW_HOURS: i64 = 24;

/// Subscription tier; ordering is the upgrade ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Plus,
    Pro,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Plus => "plus",
            Tier::Pro => "pro",
        }
    }

    /// Unknown or legacy values resolve to free.
    pub fn parse(s: &str) -> Tier {
        match s {
            "plus" => Tier::Plus,
            "pro" => Tier::Pro,
            _ => Tier::Free,
        }
    }
}

pub fn daily_like_limit(tier: Tier) -> i32 {
    match tier {
        Tier::Free => FREE_DAILY_LIKES,
        Tier::Plus => PLUS_DAILY_LIKES,
        Tier::Pro => PRO_DAILY_LIKES,
    }
}

/// Plus inherits the free undo allowance.
pub fn daily_undo_limit(tier: Tier) -> i32 {
    match tier {
        Tier::Pro => PRO_DAILY_UNDOS,
        _ => FREE_DAILY_UNDOS,
    }
}

/// Roll a counter window forward: once `now` reaches `reset_at` the
/// counter restarts at zero with a fresh 24h window.
pub fn rolled_window(used: i32, reset_at: DateTime<Utc>, now: DateTime<Utc>) -> (i32, DateTime<Utc>, bool) {
    if now >= reset_at {
        (0, now + Duration::hours(RESET_WINDOW_HOURS), true)
    } else {
        (used, reset_at, false)
    }
}

/// Compute the effective tier and expiry for a purchase of `purchased`
/// lasting `days`. An unexpired higher tier is kept; the expiry always
/// extends from `max(now, current expiry)`.
pub fn resolve_extension(
    current: Option<(Tier, DateTime<Utc>)>,
    purchased: Tier,
    days: i64,
    now: DateTime<Utc>,
) -> (Tier, DateTime<Utc>) {
    let (effective, base) = match current {
        Some((tier, expires_at)) if expires_at > now => (tier.max(purchased), expires_at),
        _ => (purchased, now),
    };
    (effective, base + Duration::days(days))
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotOutcome {
    pub ok: bool,
    pub remaining: i32,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsInfo {
    pub tier: Tier,
    pub daily_limit: i32,
    pub remaining: i32,
    pub reset_at: DateTime<Utc>,
    pub boost_expires_at: Option<DateTime<Utc>>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub undo_remaining: i32,
    pub undo_reset_at: DateTime<Utc>,
}

pub fn subscription_of(conn: &mut PgConnection, profile_id: Uuid) -> AppResult<Option<Subscription>> {
    Ok(subscriptions::table
        .find(profile_id)
        .first::<Subscription>(conn)
        .optional()?)
}

/// Active tier; an absent or expired subscription row means free.
pub fn tier_of(conn: &mut PgConnection, profile_id: Uuid) -> AppResult<Tier> {
    let now = Utc::now();
    Ok(match subscription_of(conn, profile_id)? {
        Some(sub) if sub.expires_at > now => Tier::parse(&sub.tier),
        _ => Tier::Free,
    })
}

pub fn boost_expiry(conn: &mut PgConnection, profile_id: Uuid) -> AppResult<Option<DateTime<Utc>>> {
    let now = Utc::now();
    Ok(boosts::table
        .filter(boosts::profile_id.eq(profile_id))
        .filter(boosts::expires_at.gt(now))
        .order(boosts::expires_at.desc())
        .select(boosts::expires_at)
        .first::<DateTime<Utc>>(conn)
        .optional()?)
}

fn like_counter(
    conn: &mut PgConnection,
    profile_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<(i32, DateTime<Utc>)> {
    let row: Option<DailyCounter> = daily_likes::table
        .find(profile_id)
        .first::<DailyCounter>(conn)
        .optional()?;

    match row {
        None => {
            let reset_at = now + Duration::hours(RESET_WINDOW_HOURS);
            diesel::insert_into(daily_likes::table)
                .values((
                    daily_likes::profile_id.eq(profile_id),
                    daily_likes::used.eq(0),
                    daily_likes::reset_at.eq(reset_at),
                ))
                .on_conflict(daily_likes::profile_id)
                .do_update()
                .set((daily_likes::used.eq(0), daily_likes::reset_at.eq(reset_at)))
                .execute(conn)?;
            Ok((0, reset_at))
        }
        Some(counter) => {
            let (used, reset_at, rolled) = rolled_window(counter.used, counter.reset_at, now);
            if rolled {
                diesel::update(daily_likes::table.find(profile_id))
                    .set((daily_likes::used.eq(0), daily_likes::reset_at.eq(reset_at)))
                    .execute(conn)?;
            }
            Ok((used, reset_at))
        }
    }
}

fn undo_counter(
    conn: &mut PgConnection,
    profile_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<(i32, DateTime<Utc>)> {
    let row: Option<DailyCounter> = daily_undos::table
        .find(profile_id)
        .first::<DailyCounter>(conn)
        .optional()?;

    match row {
        None => {
            let reset_at = now + Duration::hours(RESET_WINDOW_HOURS);
            diesel::insert_into(daily_undos::table)
                .values((
                    daily_undos::profile_id.eq(profile_id),
                    daily_undos::used.eq(0),
                    daily_undos::reset_at.eq(reset_at),
                ))
                .on_conflict(daily_undos::profile_id)
                .do_update()
                .set((daily_undos::used.eq(0), daily_undos::reset_at.eq(reset_at)))
                .execute(conn)?;
            Ok((0, reset_at))
        }
        Some(counter) => {
            let (used, reset_at, rolled) = rolled_window(counter.used, counter.reset_at, now);
            if rolled {
                diesel::update(daily_undos::table.find(profile_id))
                    .set((daily_undos::used.eq(0), daily_undos::reset_at.eq(reset_at)))
                    .execute(conn)?;
            }
            Ok((used, reset_at))
        }
    }
}

/// Consume one like slot. Read-then-write: concurrent consumers can
/// slightly overrun the cap.
pub fn consume_like_slot(conn: &mut PgConnection, profile_id: Uuid) -> AppResult<SlotOutcome> {
    let now = Utc::now();
    let limit = daily_like_limit(tier_of(conn, profile_id)?);
    let (used, reset_at) = like_counter(conn, profile_id, now)?;

    if used >= limit {
        return Ok(SlotOutcome { ok: false, remaining: 0, reset_at });
    }

    let new_used = used + 1;
    diesel::insert_into(daily_likes::table)
        .values((
            daily_likes::profile_id.eq(profile_id),
            daily_likes::used.eq(new_used),
            daily_likes::reset_at.eq(reset_at),
        ))
        .on_conflict(daily_likes::profile_id)
        .do_update()
        .set((daily_likes::used.eq(new_used), daily_likes::reset_at.eq(reset_at)))
        .execute(conn)?;

    Ok(SlotOutcome {
        ok: true,
        remaining: limit - new_used,
        reset_at,
    })
}

pub fn consume_undo_slot(conn: &mut PgConnection, profile_id: Uuid) -> AppResult<SlotOutcome> {
    let now = Utc::now();
    let limit = daily_undo_limit(tier_of(conn, profile_id)?);
    let (used, reset_at) = undo_counter(conn, profile_id, now)?;

    if used >= limit {
        return Ok(SlotOutcome { ok: false, remaining: 0, reset_at });
    }

    let new_used = used + 1;
    diesel::insert_into(daily_undos::table)
        .values((
            daily_undos::profile_id.eq(profile_id),
            daily_undos::used.eq(new_used),
            daily_undos::reset_at.eq(reset_at),
        ))
        .on_conflict(daily_undos::profile_id)
        .do_update()
        .set((daily_undos::used.eq(new_used), daily_undos::reset_at.eq(reset_at)))
        .execute(conn)?;

    Ok(SlotOutcome {
        ok: true,
        remaining: limit - new_used,
        reset_at,
    })
}

pub fn limits_info(conn: &mut PgConnection, profile_id: Uuid) -> AppResult<LimitsInfo> {
    let now = Utc::now();

    let sub = subscription_of(conn, profile_id)?;
    let (tier, subscription_expires_at) = match sub {
        Some(s) if s.expires_at > now => (Tier::parse(&s.tier), Some(s.expires_at)),
        _ => (Tier::Free, None),
    };

    let daily_limit = daily_like_limit(tier);
    let (used, reset_at) = like_counter(conn, profile_id, now)?;
    let remaining = (daily_limit - used).max(0);

    let boost_expires_at = boost_expiry(conn, profile_id)?;

    let undo_limit = daily_undo_limit(tier);
    let (undo_used, undo_reset_at) = undo_counter(conn, profile_id, now)?;
    let undo_remaining = (undo_limit - undo_used).max(0);

    Ok(LimitsInfo {
        tier,
        daily_limit,
        remaining,
        reset_at,
        boost_expires_at,
        subscription_expires_at,
        undo_remaining,
        undo_reset_at,
    })
}

/// Apply a subscription purchase or grant through the extend-or-keep
/// rule of `resolve_extension`.
pub fn extend_or_set_subscription(
    conn: &mut PgConnection,
    profile_id: Uuid,
    purchased: Tier,
    days: i64,
) -> AppResult<()> {
    let now = Utc::now();
    let current = subscription_of(conn, profile_id)?
        .map(|s| (Tier::parse(&s.tier), s.expires_at));
    let (tier, expires_at) = resolve_extension(current, purchased, days, now);

    diesel::insert_into(subscriptions::table)
        .values(&UpsertSubscription {
            profile_id,
            tier: tier.as_str(),
            expires_at,
            updated_at: now,
        })
        .on_conflict(subscriptions::profile_id)
        .do_update()
        .set((
            subscriptions::tier.eq(tier.as_str()),
            subscriptions::expires_at.eq(expires_at),
            subscriptions::updated_at.eq(now),
        ))
        .execute(conn)?;

    tracing::info!(
        profile_id = %profile_id,
        tier = tier.as_str(),
        expires_at = %expires_at,
        "subscription extended"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ranking() {
        assert!(Tier::Pro > Tier::Plus);
        assert!(Tier::Plus > Tier::Free);
        assert_eq!(Tier::parse("pro"), Tier::Pro);
        assert_eq!(Tier::parse("nonsense"), Tier::Free);
    }

    #[test]
    fn like_limits_per_tier() {
        assert_eq!(daily_like_limit(Tier::Free), 25);
        assert_eq!(daily_like_limit(Tier::Plus), 20);
        assert_eq!(daily_like_limit(Tier::Pro), 999_999);
    }

    #[test]
    fn undo_limits_plus_inherits_free() {
        assert_eq!(daily_undo_limit(Tier::Free), 1);
        assert_eq!(daily_undo_limit(Tier::Plus), 1);
        assert_eq!(daily_undo_limit(Tier::Pro), 5);
    }

    #[test]
    fn window_holds_until_reset() {
        let now = Utc::now();
        let reset_at = now + Duration::hours(3);
        let (used, at, rolled) = rolled_window(17, reset_at, now);
        assert_eq!((used, at, rolled), (17, reset_at, false));
    }

    #[test]
    fn window_rolls_exactly_at_reset() {
        let now = Utc::now();
        let (used, at, rolled) = rolled_window(25, now, now);
        assert!(rolled);
        assert_eq!(used, 0);
        assert_eq!(at, now + Duration::hours(24));
    }

    #[test]
    fn extension_with_no_subscription_starts_now() {
        let now = Utc::now();
        let (tier, expires) = resolve_extension(None, Tier::Plus, 7, now);
        assert_eq!(tier, Tier::Plus);
        assert_eq!(expires, now + Duration::days(7));
    }

    #[test]
    fn extension_with_expired_subscription_starts_now() {
        let now = Utc::now();
        let current = Some((Tier::Pro, now - Duration::days(1)));
        let (tier, expires) = resolve_extension(current, Tier::Plus, 7, now);
        assert_eq!(tier, Tier::Plus);
        assert_eq!(expires, now + Duration::days(7));
    }

    #[test]
    fn active_higher_tier_survives_lower_purchase() {
        let now = Utc::now();
        let pro_until = now + Duration::days(3);
        let (tier, expires) = resolve_extension(Some((Tier::Pro, pro_until)), Tier::Plus, 7, now);
        assert_eq!(tier, Tier::Pro);
        assert_eq!(expires, pro_until + Duration::days(7));
    }

    #[test]
    fn active_lower_tier_upgrades() {
        let now = Utc::now();
        let plus_until = now + Duration::days(2);
        let (tier, expires) = resolve_extension(Some((Tier::Plus, plus_until)), Tier::Pro, 7, now);
        assert_eq!(tier, Tier::Pro);
        assert_eq!(expires, plus_until + Duration::days(7));
    }
}

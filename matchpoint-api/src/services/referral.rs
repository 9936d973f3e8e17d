//! Referral codes and the invite reward loop: one short code per
//! account, one referral row per unique (inviter, invitee) pair, and a
//! 30-day pro grant on exactly the 20th distinct invite.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rand::Rng;
use uuid::Uuid;

use matchpoint_shared::errors::AppResult;

use crate::models::NewReferral;
use crate::schema::{profiles, referral_codes, referrals};
use crate::services::limits::{self, Tier};

pub const REFERRAL_REWARD_COUNT: i64 = 20;
pub const PRO_REWARD_DAYS: i64 = 30;
const CODE_LEN: usize = 8;
const CODE_ATTEMPTS: usize = 10;

const CODE_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub fn generate_code(rng: &mut impl Rng) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_CHARS[rng.gen_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Shape check for ref codes arriving from the outside (visit tracking
/// accepts campaign tags as well as user codes).
pub fn is_valid_ref(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= 64
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub fn get_or_create_code(conn: &mut PgConnection, account_id: i64) -> AppResult<String> {
    let existing: Option<String> = referral_codes::table
        .find(account_id)
        .select(referral_codes::code)
        .first(conn)
        .optional()?;
    if let Some(code) = existing {
        return Ok(code);
    }

    let mut rng = rand::thread_rng();
    let mut code = generate_code(&mut rng);
    for _ in 0..CODE_ATTEMPTS {
        let inserted = diesel::insert_into(referral_codes::table)
            .values((
                referral_codes::account_id.eq(account_id),
                referral_codes::code.eq(&code),
            ))
            .on_conflict(referral_codes::account_id)
            .do_nothing()
            .execute(conn);

        match inserted {
            Ok(_) => {
                // Either our insert landed or another request won the
                // account-level conflict; read back the winning code.
                let code: String = referral_codes::table
                    .find(account_id)
                    .select(referral_codes::code)
                    .first(conn)?;
                return Ok(code);
            }
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                // Code collision with another account; try a new one.
                code = generate_code(&mut rng);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(code)
}

pub fn referrer_by_code(conn: &mut PgConnection, code: &str) -> AppResult<Option<i64>> {
    Ok(referral_codes::table
        .filter(referral_codes::code.eq(code))
        .select(referral_codes::account_id)
        .first(conn)
        .optional()?)
}

/// Whether this (account, character) pair ever had a profile. A
/// character without one counts as a fresh invitee.
pub fn has_prior_profile(conn: &mut PgConnection, account_id: i64, character_id: i64) -> AppResult<bool> {
    let count: i64 = profiles::table
        .filter(profiles::account_id.eq(account_id))
        .filter(profiles::character_id.eq(character_id))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

pub fn referral_count(conn: &mut PgConnection, referrer_account_id: i64) -> AppResult<i64> {
    Ok(referrals::table
        .filter(referrals::referrer_account_id.eq(referrer_account_id))
        .count()
        .get_result(conn)?)
}

/// Record a referral; on exactly the 20th distinct invite the inviter's
/// oldest profile receives a 30-day pro extension. Duplicate pairs and
/// self-referrals are silently ignored.
pub fn record_referral_and_maybe_grant(
    conn: &mut PgConnection,
    referrer_account_id: i64,
    referred_account_id: i64,
    referred_profile_id: Uuid,
) -> AppResult<()> {
    if referrer_account_id == referred_account_id {
        return Ok(());
    }

    let inserted = diesel::insert_into(referrals::table)
        .values(&NewReferral {
            referrer_account_id,
            referred_account_id,
            referred_profile_id,
        })
        .execute(conn);

    match inserted {
        Ok(_) => {}
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => return Ok(()),
        Err(e) => return Err(e.into()),
    }

    let count = referral_count(conn, referrer_account_id)?;
    // Fires only on the insert that reaches the threshold; earlier and
    // later inserts never re-trigger the grant.
    if count != REFERRAL_REWARD_COUNT {
        return Ok(());
    }

    let oldest_profile: Option<Uuid> = profiles::table
        .filter(profiles::account_id.eq(referrer_account_id))
        .order(profiles::created_at.asc())
        .select(profiles::id)
        .first(conn)
        .optional()?;

    if let Some(profile_id) = oldest_profile {
        limits::extend_or_set_subscription(conn, profile_id, Tier::Pro, PRO_REWARD_DAYS)?;
        tracing::info!(
            referrer_account_id,
            profile_id = %profile_id,
            "referral reward granted"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn codes_are_eight_lowercase_alphanumerics() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), 8);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn ref_shape_validation() {
        assert!(is_valid_ref("abc123"));
        assert!(is_valid_ref("with_underscore-and-dash"));
        assert!(!is_valid_ref(""));
        assert!(!is_valid_ref("has space"));
        assert!(!is_valid_ref("emoji💔"));
        assert!(!is_valid_ref(&"x".repeat(65)));
        assert!(is_valid_ref(&"x".repeat(64)));
    }
}

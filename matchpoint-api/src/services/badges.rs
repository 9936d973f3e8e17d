//! Profile badges shown on cards; computed on demand, nothing stored.

use serde::Serialize;

use crate::services::limits::Tier;

pub const NEW_MEMBER_MAX_DAYS: i64 = 7;
pub const VETERAN_MIN_DAYS: i64 = 30;
pub const POPULAR_MIN_MATCHES: i64 = 10;
pub const SUPER_POPULAR_MIN_MATCHES: i64 = 25;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Badge {
    pub key: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct BadgeInput {
    pub is_verified: bool,
    pub has_phone: bool,
    pub days_since_creation: i64,
    pub match_count: i64,
    pub tier: Tier,
}

pub fn badges_for(input: BadgeInput) -> Vec<Badge> {
    let mut badges = Vec::new();

    if input.is_verified {
        badges.push(Badge { key: "verified", label: "Verified", icon: "fa-circle-check", color: "blue" });
    }
    if input.has_phone {
        badges.push(Badge { key: "phone_verified", label: "Phone on file", icon: "fa-phone", color: "green" });
    }
    if input.days_since_creation < NEW_MEMBER_MAX_DAYS {
        badges.push(Badge { key: "new_member", label: "New member", icon: "fa-seedling", color: "green" });
    }
    if input.days_since_creation >= VETERAN_MIN_DAYS {
        badges.push(Badge { key: "veteran", label: "Veteran", icon: "fa-medal", color: "amber" });
    }
    if input.match_count >= 1 {
        badges.push(Badge { key: "first_match", label: "First match", icon: "fa-heart", color: "pink" });
    }
    if input.match_count >= POPULAR_MIN_MATCHES {
        badges.push(Badge { key: "popular", label: "Popular", icon: "fa-fire", color: "orange" });
    }
    if input.match_count >= SUPER_POPULAR_MIN_MATCHES {
        badges.push(Badge { key: "super_popular", label: "Super popular", icon: "fa-star", color: "yellow" });
    }
    match input.tier {
        Tier::Pro => badges.push(Badge { key: "pro_member", label: "Pro member", icon: "fa-crown", color: "violet" }),
        Tier::Plus => badges.push(Badge { key: "plus_member", label: "Plus member", icon: "fa-star", color: "pink" }),
        Tier::Free => {}
    }

    badges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> BadgeInput {
        BadgeInput {
            is_verified: false,
            has_phone: false,
            days_since_creation: 10,
            match_count: 0,
            tier: Tier::Free,
        }
    }

    fn keys(badges: &[Badge]) -> Vec<&'static str> {
        badges.iter().map(|b| b.key).collect()
    }

    #[test]
    fn fresh_profile_has_no_badges() {
        assert!(badges_for(input()).is_empty());
    }

    #[test]
    fn new_and_veteran_are_mutually_exclusive() {
        let mut i = input();
        i.days_since_creation = 3;
        assert_eq!(keys(&badges_for(i)), vec!["new_member"]);
        i.days_since_creation = 45;
        assert_eq!(keys(&badges_for(i)), vec!["veteran"]);
    }

    #[test]
    fn match_badges_stack() {
        let mut i = input();
        i.match_count = 25;
        assert_eq!(keys(&badges_for(i)), vec!["first_match", "popular", "super_popular"]);
    }

    #[test]
    fn tier_badge_matches_tier() {
        let mut i = input();
        i.tier = Tier::Pro;
        assert!(keys(&badges_for(i)).contains(&"pro_member"));
        i.tier = Tier::Plus;
        let k = keys(&badges_for(i));
        assert!(k.contains(&"plus_member"));
        assert!(!k.contains(&"pro_member"));
    }
}

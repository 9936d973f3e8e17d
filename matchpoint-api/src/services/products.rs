//! Purchasable products and their fixed in-game prices.

use serde::Serialize;

use crate::services::limits::Tier;

pub const SUBSCRIPTION_DAYS: i64 = 7;
pub const BOOST_HOURS: i64 = 24;
pub const AD_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    Plus,
    Pro,
    Boost,
    AdLeft,
    AdRight,
}

impl Product {
    pub fn parse(s: &str) -> Option<Product> {
        match s {
            "plus" => Some(Product::Plus),
            "pro" => Some(Product::Pro),
            "boost" => Some(Product::Boost),
            "ad_left" => Some(Product::AdLeft),
            "ad_right" => Some(Product::AdRight),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Plus => "plus",
            Product::Pro => "pro",
            Product::Boost => "boost",
            Product::AdLeft => "ad_left",
            Product::AdRight => "ad_right",
        }
    }

    pub fn price(&self) -> i64 {
        match self {
            Product::Plus => 5_000,
            Product::Pro => 16_500,
            Product::Boost => 5_000,
            Product::AdLeft | Product::AdRight => 25_000,
        }
    }

    pub fn is_ad(&self) -> bool {
        matches!(self, Product::AdLeft | Product::AdRight)
    }

    /// Banner slot for ad products.
    pub fn ad_slot(&self) -> Option<&'static str> {
        match self {
            Product::AdLeft => Some("left"),
            Product::AdRight => Some("right"),
            _ => None,
        }
    }

    /// Subscription tier for subscription products.
    pub fn tier(&self) -> Option<Tier> {
        match self {
            Product::Plus => Some(Tier::Plus),
            Product::Pro => Some(Tier::Pro),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips() {
        for p in [Product::Plus, Product::Pro, Product::Boost, Product::AdLeft, Product::AdRight] {
            assert_eq!(Product::parse(p.as_str()), Some(p));
        }
        assert_eq!(Product::parse("gold"), None);
    }

    #[test]
    fn prices_are_fixed() {
        assert_eq!(Product::Plus.price(), 5_000);
        assert_eq!(Product::Pro.price(), 16_500);
        assert_eq!(Product::Boost.price(), 5_000);
        assert_eq!(Product::AdLeft.price(), 25_000);
        assert_eq!(Product::AdRight.price(), 25_000);
    }

    #[test]
    fn ad_slots() {
        assert_eq!(Product::AdLeft.ad_slot(), Some("left"));
        assert_eq!(Product::AdRight.ad_slot(), Some("right"));
        assert_eq!(Product::Boost.ad_slot(), None);
        assert!(Product::AdLeft.is_ad());
        assert!(!Product::Plus.is_ad());
    }
}

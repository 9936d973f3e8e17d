//! Payment settlement: locate the pending order, check the paid amount,
//! apply the purchased effect exactly once, write the receipt.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use chrono::{Duration, Utc};

use matchpoint_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{NewBoost, NewPayment, PendingOrder};
use crate::schema::{ads, boosts, payments, pending_orders};
use crate::services::limits;
use crate::services::products::{Product, AD_DAYS, BOOST_HOURS, SUBSCRIPTION_DAYS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    Applied,
    /// A receipt for this order already exists; the effect was not
    /// re-applied.
    AlreadySettled,
}

/// Locate the order a gateway callback refers to. The chain is
/// deliberately permissive: checkout cookie, then the callback token,
/// then the most recently created pending order.
pub fn resolve_order(
    conn: &mut PgConnection,
    cookie_order_id: Option<&str>,
    url_token: Option<&str>,
) -> AppResult<Option<PendingOrder>> {
    if let Some(order_id) = cookie_order_id {
        let order = pending_orders::table
            .find(order_id)
            .first::<PendingOrder>(conn)
            .optional()?;
        if order.is_some() {
            return Ok(order);
        }
        tracing::info!(order_id, "callback order not found by cookie, trying token");
    }

    if let Some(token) = url_token {
        let order = pending_orders::table
            .filter(pending_orders::gateway_token.eq(token))
            .first::<PendingOrder>(conn)
            .optional()?;
        if order.is_some() {
            return Ok(order);
        }
        tracing::info!("callback order not found by token, trying latest pending");
    }

    Ok(pending_orders::table
        .order(pending_orders::created_at.desc())
        .first::<PendingOrder>(conn)
        .optional()?)
}

/// Settle an order: verify the paid amount covers the recorded price,
/// then within one transaction insert the receipt (unique per order id
/// so a replayed callback applies nothing), apply the product effect,
/// and drop the pending order.
pub fn settle(
    conn: &mut PgConnection,
    order: &PendingOrder,
    paid_amount: i64,
    token: &str,
    gateway_response: serde_json::Value,
) -> AppResult<SettleOutcome> {
    if paid_amount < order.amount {
        tracing::error!(
            order_id = %order.order_id,
            paid_amount,
            expected = order.amount,
            "insufficient payment amount"
        );
        return Err(AppError::new(ErrorCode::PaymentRejected, "insufficient payment amount"));
    }

    let product = Product::parse(&order.product)
        .ok_or_else(|| AppError::new(ErrorCode::InvalidProduct, "unknown product on order"))?;

    conn.transaction::<SettleOutcome, AppError, _>(|conn| {
        let inserted = diesel::insert_into(payments::table)
            .values(&NewPayment {
                order_id: &order.order_id,
                profile_id: order.profile_id,
                product: product.as_str(),
                amount: paid_amount,
                gateway_token: token,
                gateway_response,
            })
            .on_conflict(payments::order_id)
            .do_nothing()
            .execute(conn)?;

        if inserted == 0 {
            tracing::warn!(order_id = %order.order_id, "duplicate settlement callback ignored");
            return Ok(SettleOutcome::AlreadySettled);
        }

        apply_effect(conn, order, product)?;

        diesel::delete(pending_orders::table.find(&order.order_id)).execute(conn)?;

        tracing::info!(
            order_id = %order.order_id,
            product = product.as_str(),
            amount = paid_amount,
            "payment settled"
        );

        Ok(SettleOutcome::Applied)
    })
}

fn apply_effect(conn: &mut PgConnection, order: &PendingOrder, product: Product) -> AppResult<()> {
    let now = Utc::now();

    if let Some(tier) = product.tier() {
        let profile_id = order
            .profile_id
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound, "subscription order without profile"))?;
        limits::extend_or_set_subscription(conn, profile_id, tier, SUBSCRIPTION_DAYS)?;
        return Ok(());
    }

    if product == Product::Boost {
        let profile_id = order
            .profile_id
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound, "boost order without profile"))?;
        diesel::insert_into(boosts::table)
            .values(&NewBoost {
                profile_id,
                expires_at: now + Duration::hours(BOOST_HOURS),
            })
            .execute(conn)?;
        return Ok(());
    }

    // Ad products: activate the row created at checkout time.
    diesel::update(ads::table.filter(ads::order_id.eq(&order.order_id)))
        .set((
            ads::is_active.eq(true),
            ads::expires_at.eq(now + Duration::days(AD_DAYS)),
        ))
        .execute(conn)?;
    Ok(())
}

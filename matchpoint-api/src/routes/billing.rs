use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use diesel::prelude::*;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use matchpoint_shared::errors::{AppError, AppResult, ErrorCode};
use matchpoint_shared::types::session::Session;
use matchpoint_shared::types::ApiResponse;

use crate::models::{NewAd, NewPendingOrder};
use crate::schema::{ads, pending_orders, profiles};
use crate::services::products::Product;
use crate::services::settlement::{self, SettleOutcome};
use crate::AppState;

pub const PENDING_ORDER_COOKIE: &str = "matchpoint_pending_order";
const COOKIE_TTL_MINUTES: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub product: String,
    pub character_id: Option<i64>,
    pub ad_image_url: Option<String>,
    pub ad_link_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub redirect_url: String,
}

/// POST /billing/checkout - create a pending order, obtain a gateway
/// token for the product's fixed price, and hand the browser the
/// gateway URL. The order id travels in a short-lived cookie for the
/// callback.
pub async fn checkout(
    session: Session,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<CheckoutRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<CheckoutResponse>>)> {
    let product = Product::parse(&req.product)
        .ok_or_else(|| AppError::new(ErrorCode::InvalidProduct, "invalid product"))?;

    if state.config.gateway_auth_key.is_empty() {
        return Err(AppError::new(
            ErrorCode::ServiceUnavailable,
            "payment system not configured",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // Ad products attach to any of the account's profiles; everything
    // else needs the owning character's profile.
    let profile_id: Option<Uuid> = if product.is_ad() {
        let has_urls = req.ad_image_url.as_deref().map_or(false, |u| !u.trim().is_empty())
            && req.ad_link_url.as_deref().map_or(false, |u| !u.trim().is_empty());
        if !has_urls {
            return Err(AppError::Validation("image and link are required for an ad".into()));
        }
        profiles::table
            .filter(profiles::account_id.eq(session.account_id))
            .select(profiles::id)
            .first::<Uuid>(&mut conn)
            .optional()?
    } else {
        let character_id = req
            .character_id
            .ok_or_else(|| AppError::Validation("character_id is required".into()))?;
        Some(super::my_profile(&mut conn, session.account_id, character_id)?.id)
    };

    let order_id = generate_order_id();

    diesel::insert_into(pending_orders::table)
        .values(&NewPendingOrder {
            order_id: &order_id,
            profile_id,
            account_id: session.account_id,
            product: product.as_str(),
            amount: product.price(),
        })
        .execute(&mut conn)?;

    if let Some(slot) = product.ad_slot() {
        // Created inactive; settlement activates it.
        let inserted = diesel::insert_into(ads::table)
            .values(&NewAd {
                account_id: session.account_id,
                slot,
                image_url: req.ad_image_url.as_deref().unwrap_or_default(),
                link_url: req.ad_link_url.as_deref().unwrap_or_default(),
                order_id: Some(&order_id),
                is_active: false,
                expires_at: Utc::now(),
            })
            .execute(&mut conn);
        if let Err(e) = inserted {
            tracing::error!(error = %e, order_id, "ad row insert failed");
        }
    }

    let token = state.gateway.generate_token(product.price()).await?;

    diesel::update(pending_orders::table.find(&order_id))
        .set(pending_orders::gateway_token.eq(&token))
        .execute(&mut conn)?;

    let redirect_url = state.gateway.redirect_url(&token);

    tracing::info!(
        order_id,
        product = product.as_str(),
        amount = product.price(),
        "checkout started"
    );

    let cookie = Cookie::build((PENDING_ORDER_COOKIE, order_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(COOKIE_TTL_MINUTES))
        .build();

    Ok((jar.add(cookie), Json(ApiResponse::ok(CheckoutResponse { redirect_url }))))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub token: Option<String>,
}

/// GET /billing/callback - the gateway redirects the browser here after
/// payment. Every failure funnels to the error page without touching
/// subscription/boost/ad state.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> (CookieJar, Redirect) {
    let base = state.config.base_url.trim_end_matches('/').to_string();
    let success_url = format!("{base}/?payment=success");
    let error_url = format!("{base}/?payment=error");

    let cookie_order_id = jar.get(PENDING_ORDER_COOKIE).map(|c| c.value().to_string());

    match process_callback(&state, cookie_order_id.as_deref(), query.token.as_deref()).await {
        Ok(outcome) => {
            if outcome == SettleOutcome::AlreadySettled {
                tracing::warn!("settlement callback replay");
            }
            let jar = jar.remove(Cookie::from(PENDING_ORDER_COOKIE));
            (jar, Redirect::to(&success_url))
        }
        Err(e) => {
            tracing::error!(error = %e, "payment callback failed");
            (jar, Redirect::to(&error_url))
        }
    }
}

async fn process_callback(
    state: &AppState,
    cookie_order_id: Option<&str>,
    url_token: Option<&str>,
) -> AppResult<SettleOutcome> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let order = settlement::resolve_order(&mut conn, cookie_order_id, url_token)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound, "no pending order for callback"))?;

    let token = url_token
        .map(str::to_string)
        .or_else(|| order.gateway_token.clone())
        .ok_or_else(|| AppError::new(ErrorCode::PaymentRejected, "no token to verify"))?;

    let mut verdict = state.gateway.verify_token(&token).await?;
    let mut verified_token = token.clone();

    // The callback token and the stored token can disagree when the
    // gateway rewrites it; try the stored one before giving up.
    if verdict.is_none() {
        if let Some(stored) = order.gateway_token.as_deref() {
            if stored != token {
                verdict = state.gateway.verify_token(stored).await?;
                if verdict.is_some() {
                    verified_token = stored.to_string();
                }
            }
        }
    }

    match verdict {
        Some(v) => {
            let response = serde_json::to_value(&v).unwrap_or_else(|_| serde_json::json!({}));
            settlement::settle(&mut conn, &order, v.paid_amount(), &verified_token, response)
        }
        None if state.gateway.trust_redirect => {
            tracing::warn!(order_id = %order.order_id, "no strategy confirmed, trusting redirect");
            settlement::settle(
                &mut conn,
                &order,
                order.amount,
                &verified_token,
                serde_json::json!({ "trusted_redirect": true }),
            )
        }
        None => Err(AppError::new(
            ErrorCode::PaymentRejected,
            "gateway did not confirm the payment",
        )),
    }
}

fn generate_order_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();
    format!("{}-{}", to_base36(millis), suffix)
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".into();
    }
    let mut out = String::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }
    out.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base36_encodes_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_000_000), "lfls");
    }

    #[test]
    fn order_ids_are_unique_enough() {
        let a = generate_order_id();
        let b = generate_order_id();
        assert_ne!(a, b);
        assert!(a.contains('-'));
        assert!(a.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }
}

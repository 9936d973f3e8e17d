use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use matchpoint_shared::clients::db::{create_pool, DbPool};
use services::gateway::GatewayClient;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub gateway: GatewayClient,
    pub http: reqwest::Client,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    matchpoint_shared::middleware::init_tracing("matchpoint-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let db = create_pool(&config.database_url);
    let gateway = GatewayClient::new(&config);
    let http = reqwest::Client::new();

    let state = Arc::new(AppState { db, config, gateway, http });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/session", post(routes::session::create_session))
        .route("/auth/me", get(routes::session::session_me))
        .route("/profiles", post(routes::profiles::submit_profile))
        .route("/profiles/me", get(routes::profiles::get_my_profile))
        .route("/profiles/:id", delete(routes::profiles::delete_my_profile))
        .route("/discovery", get(routes::discovery::possible_matches))
        .route("/discovery/liked-me", get(routes::discovery::liked_me))
        .route("/discovery/spotlight", get(routes::discovery::spotlight))
        .route("/likes", post(routes::engagement::like))
        .route("/dislikes", post(routes::engagement::dislike))
        .route("/dislikes/undo", post(routes::engagement::undo_dislike))
        .route("/matches", get(routes::matches::my_matches))
        .route("/matches/:id/reject", post(routes::matches::reject_match))
        .route("/chat/conversations", get(routes::chat::conversations))
        .route(
            "/chat/:match_id/messages",
            get(routes::chat::list_messages).post(routes::chat::send_message),
        )
        .route("/blocks", post(routes::moderation::block))
        .route("/reports", post(routes::moderation::report))
        .route("/me/limits", get(routes::me::my_limits))
        .route("/me/stats", get(routes::me::my_stats))
        .route("/me/orders", get(routes::me::my_orders))
        .route("/me/referral-code", get(routes::me::my_referral_code))
        .route("/me/init", get(routes::me::init))
        .route("/referrals/visit", post(routes::referrals::track_visit))
        .route("/badges", get(routes::badges::badges))
        .route("/billing/checkout", post(routes::billing::checkout))
        .route("/billing/callback", get(routes::billing::callback))
        .route("/ads", get(routes::ads::active_ads))
        .route("/ads/status", get(routes::ads::ads_status))
        // Admin endpoints (shared-secret Authorization header)
        .route("/admin/profiles", get(routes::admin::list_profiles))
        .route("/admin/profiles/:id", delete(routes::admin::delete_profile))
        .route(
            "/admin/matches",
            get(routes::admin::list_matches).post(routes::admin::create_match),
        )
        .route("/admin/matches/:id", delete(routes::admin::delete_match))
        .route("/admin/rejected-matches", get(routes::admin::list_rejected_matches))
        .route("/admin/reports", get(routes::admin::list_reports))
        .route(
            "/admin/subscription",
            get(routes::admin::get_subscription).post(routes::admin::set_subscription),
        )
        .route("/admin/subscriptions", get(routes::admin::list_subscriptions))
        .route("/admin/payments", get(routes::admin::list_payments))
        .route("/admin/payments/stats", get(routes::admin::payment_stats))
        .route("/admin/referrals", get(routes::admin::referral_stats))
        .route("/admin/link-stats", get(routes::admin::link_stats))
        .route("/admin/ads", get(routes::admin::list_ads))
        .route("/admin/ads/:id", delete(routes::admin::deactivate_ad))
        .route(
            "/admin/ads/status",
            get(routes::admin::get_ads_toggle).post(routes::admin::set_ads_toggle),
        )
        .route("/admin/boosts", get(routes::admin::list_boosts))
        .route("/admin/logs", get(routes::admin::list_logs))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "matchpoint-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

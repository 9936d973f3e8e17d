use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use matchpoint_shared::errors::{AppError, AppResult, ErrorCode};
use matchpoint_shared::types::session::Session;
use matchpoint_shared::types::ApiResponse;

use crate::models::{NewBlock, NewReport};
use crate::schema::{blocks, reports};
use crate::AppState;

const MAX_REASON_LEN: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    pub character_id: i64,
    pub blocked_profile_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct BlockResponse {
    pub blocked: bool,
}

/// POST /blocks - hide a profile from all of the caller's listings.
pub async fn block(
    session: Session,
    State(state): State<Arc<AppState>>,
    Json(req): Json<BlockRequest>,
) -> AppResult<Json<ApiResponse<BlockResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = super::my_profile(&mut conn, session.account_id, req.character_id)?;

    if me.id == req.blocked_profile_id {
        return Err(AppError::new(ErrorCode::CannotBlockSelf, "you cannot block yourself"));
    }

    diesel::insert_into(blocks::table)
        .values(&NewBlock {
            blocker_profile_id: me.id,
            blocked_profile_id: req.blocked_profile_id,
        })
        .on_conflict((blocks::blocker_profile_id, blocks::blocked_profile_id))
        .do_nothing()
        .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(BlockResponse { blocked: true })))
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub character_id: i64,
    pub reported_profile_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub reported: bool,
}

/// POST /reports - flag a profile for the admins.
pub async fn report(
    session: Session,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReportRequest>,
) -> AppResult<Json<ApiResponse<ReportResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = super::my_profile(&mut conn, session.account_id, req.character_id)?;

    if me.id == req.reported_profile_id {
        return Err(AppError::new(ErrorCode::CannotReportSelf, "you cannot report yourself"));
    }

    let reason = req
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| r.chars().take(MAX_REASON_LEN).collect::<String>());

    diesel::insert_into(reports::table)
        .values(&NewReport {
            reporter_profile_id: me.id,
            reported_profile_id: req.reported_profile_id,
            reason,
        })
        .execute(&mut conn)?;

    tracing::info!(
        reporter = %me.id,
        reported = %req.reported_profile_id,
        "profile reported"
    );

    Ok(Json(ApiResponse::ok(ReportResponse { reported: true })))
}

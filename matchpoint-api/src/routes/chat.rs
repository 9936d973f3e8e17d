use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use matchpoint_shared::errors::{AppError, AppResult, ErrorCode};
use matchpoint_shared::types::session::Session;
use matchpoint_shared::types::ApiResponse;

use crate::models::{Match, Message, NewMessage, Profile};
use crate::schema::{matches, messages, profiles};
use crate::AppState;

/// Load a match and check the profile is one of its two sides.
fn member_match(
    conn: &mut diesel::pg::PgConnection,
    match_id: Uuid,
    profile_id: Uuid,
) -> AppResult<Match> {
    let matched: Match = matches::table
        .find(match_id)
        .first(conn)
        .map_err(|_| AppError::new(ErrorCode::MatchNotFound, "match not found"))?;

    if matched.profile_1_id != profile_id && matched.profile_2_id != profile_id {
        return Err(AppError::new(
            ErrorCode::NotMatchMember,
            "you are not part of this match",
        ));
    }

    Ok(matched)
}

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub character_id: i64,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

/// GET /chat/:match_id/messages - full history, oldest first. Fetching
/// marks the caller's unread incoming messages as read.
pub async fn list_messages(
    session: Session,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
    Query(query): Query<ChatQuery>,
) -> AppResult<Json<ApiResponse<MessagesResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = super::my_profile(&mut conn, session.account_id, query.character_id)?;
    member_match(&mut conn, match_id, me.id)?;

    let history: Vec<Message> = messages::table
        .filter(messages::match_id.eq(match_id))
        .order(messages::created_at.asc())
        .load(&mut conn)?;

    diesel::update(
        messages::table
            .filter(messages::match_id.eq(match_id))
            .filter(messages::receiver_profile_id.eq(me.id))
            .filter(messages::is_read.eq(false)),
    )
    .set(messages::is_read.eq(true))
    .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(MessagesResponse { messages: history })))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub character_id: i64,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message: Message,
}

/// POST /chat/:match_id/messages - send a message to the other side.
pub async fn send_message(
    session: Session,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<SendMessageResponse>>> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::new(ErrorCode::MessageEmpty, "message content is required"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = super::my_profile(&mut conn, session.account_id, req.character_id)?;
    let matched = member_match(&mut conn, match_id, me.id)?;

    let receiver_profile_id = if matched.profile_1_id == me.id {
        matched.profile_2_id
    } else {
        matched.profile_1_id
    };

    let message: Message = diesel::insert_into(messages::table)
        .values(&NewMessage {
            match_id,
            sender_profile_id: me.id,
            receiver_profile_id,
            content,
        })
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(SendMessageResponse { message })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub match_id: Uuid,
    pub matched_at: DateTime<Utc>,
    pub profile: Option<Profile>,
    pub unread_count: i64,
    pub last_message: Option<Message>,
}

#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<Conversation>,
}

/// GET /chat/conversations - one entry per match with the counterpart
/// profile, unread count, and latest message.
pub async fn conversations(
    session: Session,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChatQuery>,
) -> AppResult<Json<ApiResponse<ConversationsResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = super::my_profile(&mut conn, session.account_id, query.character_id)?;

    let rows: Vec<Match> = matches::table
        .filter(matches::profile_1_id.eq(me.id).or(matches::profile_2_id.eq(me.id)))
        .load(&mut conn)?;

    let mut conversations = Vec::with_capacity(rows.len());
    for matched in rows {
        let other_id = if matched.profile_1_id == me.id {
            matched.profile_2_id
        } else {
            matched.profile_1_id
        };

        let profile: Option<Profile> = profiles::table
            .find(other_id)
            .first(&mut conn)
            .optional()?;

        let unread_count: i64 = messages::table
            .filter(messages::match_id.eq(matched.id))
            .filter(messages::receiver_profile_id.eq(me.id))
            .filter(messages::is_read.eq(false))
            .count()
            .get_result(&mut conn)?;

        let last_message: Option<Message> = messages::table
            .filter(messages::match_id.eq(matched.id))
            .order(messages::created_at.desc())
            .first(&mut conn)
            .optional()?;

        conversations.push(Conversation {
            match_id: matched.id,
            matched_at: matched.created_at,
            profile,
            unread_count,
            last_message,
        });
    }

    // Most recent activity first.
    conversations.sort_by_key(|c| {
        std::cmp::Reverse(c.last_message.as_ref().map(|m| m.created_at).unwrap_or(c.matched_at))
    });

    Ok(Json(ApiResponse::ok(ConversationsResponse { conversations })))
}

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use matchpoint_shared::errors::{AppError, AppResult, ErrorCode};
use matchpoint_shared::types::session::{CharacterRef, Session, SessionClaims, SessionToken};
use matchpoint_shared::types::ApiResponse;

use crate::models::{NewAccount, NewCharacter};
use crate::schema::{accounts, characters};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
struct ProviderTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ProviderCharacter {
    id: i64,
    firstname: String,
    lastname: String,
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: i64,
    username: String,
    #[serde(default)]
    character: Vec<ProviderCharacter>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub token: SessionToken,
    pub account_id: i64,
    pub username: String,
    pub characters: Vec<CharacterRef>,
}

/// POST /auth/session - exchange the provider's authorization code for a
/// signed session token.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> AppResult<Json<ApiResponse<SessionResponse>>> {
    let token_url = format!("{}/oauth/token", state.config.provider_base_url.trim_end_matches('/'));
    let token_response = state
        .http
        .post(&token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", req.code.as_str()),
            ("client_id", &state.config.provider_client_id),
            ("client_secret", &state.config.provider_client_secret),
            ("redirect_uri", &state.config.provider_redirect_uri),
        ])
        .send()
        .await
        .map_err(|e| AppError::new(ErrorCode::OAuthError, format!("token exchange failed: {e}")))?;

    if !token_response.status().is_success() {
        let body = token_response.text().await.unwrap_or_default();
        return Err(AppError::new(ErrorCode::OAuthError, format!("provider token error: {body}")));
    }

    let provider_token: ProviderTokenResponse = token_response
        .json()
        .await
        .map_err(|e| AppError::new(ErrorCode::OAuthError, format!("invalid token response: {e}")))?;

    let user_url = format!("{}/api/user", state.config.provider_base_url.trim_end_matches('/'));
    let user_response = state
        .http
        .get(&user_url)
        .bearer_auth(&provider_token.access_token)
        .send()
        .await
        .map_err(|e| AppError::new(ErrorCode::OAuthError, format!("user info request failed: {e}")))?;

    let provider_user: ProviderUser = user_response
        .json()
        .await
        .map_err(|e| AppError::new(ErrorCode::OAuthError, format!("invalid user info response: {e}")))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // Silent identity tracking: refresh the account and character rows
    // on every sign-in.
    let now = Utc::now();
    diesel::insert_into(accounts::table)
        .values(&NewAccount {
            account_id: provider_user.id,
            username: &provider_user.username,
            last_login_at: now,
        })
        .on_conflict(accounts::account_id)
        .do_update()
        .set((
            accounts::username.eq(&provider_user.username),
            accounts::last_login_at.eq(now),
        ))
        .execute(&mut conn)?;

    for character in &provider_user.character {
        diesel::insert_into(characters::table)
            .values(&NewCharacter {
                character_id: character.id,
                account_id: provider_user.id,
                first_name: &character.firstname,
                last_name: &character.lastname,
                updated_at: now,
            })
            .on_conflict(characters::character_id)
            .do_update()
            .set((
                characters::first_name.eq(&character.firstname),
                characters::last_name.eq(&character.lastname),
                characters::updated_at.eq(now),
            ))
            .execute(&mut conn)?;
    }

    let character_refs: Vec<CharacterRef> = provider_user
        .character
        .iter()
        .map(|c| CharacterRef {
            id: c.id,
            name: format!("{} {}", c.firstname, c.lastname),
        })
        .collect();

    let claims = SessionClaims::new(
        provider_user.id,
        provider_user.username.clone(),
        character_refs.clone(),
        state.config.session_ttl_secs,
    );
    let access_token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))?;

    tracing::info!(
        account_id = provider_user.id,
        username = %provider_user.username,
        characters = character_refs.len(),
        "session created"
    );

    Ok(Json(ApiResponse::ok(SessionResponse {
        token: SessionToken::new(access_token, state.config.session_ttl_secs),
        account_id: provider_user.id,
        username: provider_user.username,
        characters: character_refs,
    })))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub account_id: i64,
    pub username: String,
    pub characters: Vec<CharacterRef>,
}

/// GET /auth/me - echo the session identity.
pub async fn session_me(session: Session) -> AppResult<Json<ApiResponse<MeResponse>>> {
    Ok(Json(ApiResponse::ok(MeResponse {
        account_id: session.account_id,
        username: session.username,
        characters: session.characters,
    })))
}

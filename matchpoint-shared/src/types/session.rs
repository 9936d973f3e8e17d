use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One playable character of the signed-in community account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterRef {
    pub id: i64,
    pub name: String,
}

/// JWT claims for a signed-in session. The subject is the external
/// community account id; the character list is fixed at sign-in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i64,
    pub username: String,
    pub characters: Vec<CharacterRef>,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(account_id: i64, username: String, characters: Vec<CharacterRef>, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: account_id,
            username,
            characters,
            iat: now,
            exp: now + duration_secs,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Authenticated session, extracted from the bearer JWT on every
/// non-admin endpoint.
#[derive(Debug, Clone)]
pub struct Session {
    pub account_id: i64,
    pub username: String,
    pub characters: Vec<CharacterRef>,
}

impl Session {
    /// Whether the session account owns the given character.
    pub fn owns_character(&self, character_id: i64) -> bool {
        self.characters.iter().any(|c| c.id == character_id)
    }
}

impl From<SessionClaims> for Session {
    fn from(claims: SessionClaims) -> Self {
        Self {
            account_id: claims.sub,
            username: claims.username,
            characters: claims.characters,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl SessionToken {
    pub fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

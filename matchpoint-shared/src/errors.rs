use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Session/identity errors
/// - E2xxx: Profile errors
/// - E3xxx: Discovery/matching errors
/// - E4xxx: Chat errors
/// - E5xxx: Billing errors
/// - E6xxx: Moderation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimited,
    ServiceUnavailable,
    BadRequest,

    // Session (E1xxx)
    OAuthError,
    TokenExpired,
    TokenInvalid,
    AdminAuthRejected,

    // Profile (E2xxx)
    ProfileNotFound,
    ProfileIncomplete,
    UnderageProfile,
    NotProfileOwner,

    // Discovery (E3xxx)
    MatchNotFound,
    NotMatchMember,
    CannotLikeSelf,
    NoDislikeToUndo,
    LikeQuotaExhausted,
    UndoQuotaExhausted,

    // Chat (E4xxx)
    MessageEmpty,

    // Billing (E5xxx)
    InvalidProduct,
    OrderNotFound,
    GatewayUnavailable,
    PaymentRejected,
    OrderAlreadySettled,

    // Moderation (E6xxx)
    CannotBlockSelf,
    CannotReportSelf,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::RateLimited => "E0006",
            Self::ServiceUnavailable => "E0007",
            Self::BadRequest => "E0008",

            // Session
            Self::OAuthError => "E1001",
            Self::TokenExpired => "E1002",
            Self::TokenInvalid => "E1003",
            Self::AdminAuthRejected => "E1004",

            // Profile
            Self::ProfileNotFound => "E2001",
            Self::ProfileIncomplete => "E2002",
            Self::UnderageProfile => "E2003",
            Self::NotProfileOwner => "E2004",

            // Discovery
            Self::MatchNotFound => "E3001",
            Self::NotMatchMember => "E3002",
            Self::CannotLikeSelf => "E3003",
            Self::NoDislikeToUndo => "E3004",
            Self::LikeQuotaExhausted => "E3005",
            Self::UndoQuotaExhausted => "E3006",

            // Chat
            Self::MessageEmpty => "E4001",

            // Billing
            Self::InvalidProduct => "E5001",
            Self::OrderNotFound => "E5002",
            Self::GatewayUnavailable => "E5003",
            Self::PaymentRejected => "E5004",
            Self::OrderAlreadySettled => "E5005",

            // Moderation
            Self::CannotBlockSelf => "E6001",
            Self::CannotReportSelf => "E6002",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::ServiceUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::ProfileIncomplete
            | Self::UnderageProfile | Self::MessageEmpty | Self::InvalidProduct
            | Self::CannotLikeSelf => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::ProfileNotFound | Self::MatchNotFound
            | Self::NoDislikeToUndo | Self::OrderNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::OAuthError | Self::TokenExpired
            | Self::TokenInvalid | Self::AdminAuthRejected => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::NotProfileOwner | Self::NotMatchMember
            | Self::CannotBlockSelf | Self::CannotReportSelf => StatusCode::FORBIDDEN,
            Self::RateLimited | Self::LikeQuotaExhausted | Self::UndoQuotaExhausted => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::OrderAlreadySettled => StatusCode::CONFLICT,
            Self::GatewayUnavailable | Self::PaymentRejected => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::{AnuncioError, ImageError, SearchError, TokenError};

/// Error returned by every API handler, rendered as `{"erro": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    Conflict(String),

    QuotaExceeded(String),

    InternalError(String),

    Unauthorized(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::QuotaExceeded(msg) => write!(f, "Quota exceeded: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Erro no banco de dados".to_string(),
                )
            }
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::QuotaExceeded(msg) => (StatusCode::PAYMENT_REQUIRED, msg.clone()),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Erro interno do servidor".to_string(),
                )
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
        };

        (status, Json(json!({ "erro": error_message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::DatabaseError(format!("{err:#}"))
    }
}

impl From<AnuncioError> for ApiError {
    fn from(err: AnuncioError) -> Self {
        match err {
            AnuncioError::NotFound(_)
            | AnuncioError::NotOwner(_)
            | AnuncioError::ImagemNotFound(_)
            | AnuncioError::UsuarioNotFound(_) => Self::NotFound(err.to_string()),
            AnuncioError::Quota { .. } => Self::QuotaExceeded(err.to_string()),
            AnuncioError::Validation(msg) => Self::ValidationError(msg),
            AnuncioError::Image(ImageError::Processing(msg)) => Self::InternalError(msg),
            AnuncioError::Image(e) => Self::ValidationError(e.to_string()),
            AnuncioError::Database(msg) => Self::DatabaseError(msg),
            AnuncioError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::EmptyQuery => Self::ValidationError(err.to_string()),
            SearchError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => Self::InternalError(msg),
            other => Self::Unauthorized(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}

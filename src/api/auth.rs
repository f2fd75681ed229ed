use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use tracing::info;

use super::{ApiError, AppState, LoginRequest, LoginResponse, RefreshResponse};
use crate::domain::{Identity, UsuarioId, create_identity};
use crate::services::{TokenError, TokenKind};

/// Caller authenticated with an access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUsuario(pub Identity);

impl AuthUsuario {
    #[must_use]
    pub const fn id(&self) -> UsuarioId {
        self.0.id
    }
}

/// Caller presenting a refresh token.
#[derive(Debug, Clone, Copy)]
pub struct RefreshUsuario(pub Identity);

impl FromRequestParts<Arc<AppState>> for AuthUsuario {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        verify(&parts.headers, state, TokenKind::Access).map(Self)
    }
}

impl FromRequestParts<Arc<AppState>> for RefreshUsuario {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        verify(&parts.headers, state, TokenKind::Refresh).map(Self)
    }
}

fn verify(headers: &HeaderMap, state: &AppState, kind: TokenKind) -> Result<Identity, ApiError> {
    let token = extract_bearer(headers).ok_or(TokenError::Missing)?;
    let identity = state.shared.tokens.verify(token, kind)?;
    tracing::Span::current().record("user_id", identity.id.value());
    Ok(identity)
}

/// Reads `Authorization: Bearer <token>`.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// POST /login
/// Exchanges a registered external id for an access/refresh token pair.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let facebook_id = payload
        .facebook_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::not_found("Informe o facebook_id do usuario"))?;

    let usuario = state
        .store()
        .usuarios()
        .get_by_facebook_id(facebook_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Usuario {facebook_id} nao existe")))?;

    let identity = create_identity(usuario.id, &usuario.facebook_id);
    let tokens = &state.shared.tokens;
    let response = LoginResponse {
        usuario_id: usuario.id,
        access_token: tokens.create_access_token(&identity)?,
        refresh_token: tokens.create_refresh_token(&identity)?,
    };

    info!(usuario_id = usuario.id, "User logged in");
    Ok(Json(response))
}

/// POST /refresh_token
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    RefreshUsuario(identity): RefreshUsuario,
) -> Result<Json<RefreshResponse>, ApiError> {
    let access_token = state
        .shared
        .tokens
        .create_access_token(&identity.encode())?;
    Ok(Json(RefreshResponse { access_token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer(&headers), None);
    }
}

//! Access and refresh tokens for API users.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;
use crate::domain::{Identity, parse_identity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Identity string, `<usuario_id>-<external_id>`
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub typ: TokenKind,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token ausente")]
    Missing,

    #[error("Token invalido")]
    Invalid,

    #[error("Token expirado")]
    Expired,

    #[error("Tipo de token incorreto")]
    WrongKind,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::minutes(config.access_token_minutes),
            refresh_ttl: Duration::days(config.refresh_token_days),
        }
    }

    fn sign(&self, identity: &str, typ: TokenKind, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.to_owned(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            typ,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn create_access_token(&self, identity: &str) -> Result<String, TokenError> {
        self.sign(identity, TokenKind::Access, self.access_ttl)
    }

    pub fn create_refresh_token(&self, identity: &str) -> Result<String, TokenError> {
        self.sign(identity, TokenKind::Refresh, self.refresh_ttl)
    }

    /// Verifies signature, expiry and kind, then parses the subject.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            },
        )?;

        if data.claims.typ != expected {
            return Err(TokenError::WrongKind);
        }

        parse_identity(&data.claims.sub).map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UsuarioId;

    fn service() -> TokenService {
        TokenService::new(&AuthConfig::default())
    }

    #[test]
    fn access_token_round_trip() {
        let tokens = service();
        let token = tokens.create_access_token("5-123456789").unwrap();

        let identity = tokens.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(identity.id, UsuarioId::new(5));
        assert_eq!(identity.external_id, 123_456_789);
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let tokens = service();
        let refresh = tokens.create_refresh_token("5-1").unwrap();

        assert!(matches!(
            tokens.verify(&refresh, TokenKind::Access),
            Err(TokenError::WrongKind)
        ));
        assert!(tokens.verify(&refresh, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn expired_and_foreign_tokens_are_rejected() {
        let tokens = service();
        let expired = tokens
            .sign("5-1", TokenKind::Access, Duration::minutes(-10))
            .unwrap();
        assert!(matches!(
            tokens.verify(&expired, TokenKind::Access),
            Err(TokenError::Expired)
        ));

        let other = TokenService::new(&AuthConfig {
            jwt_secret: "another-secret".to_string(),
            ..AuthConfig::default()
        });
        let foreign = other.create_access_token("5-1").unwrap();
        assert!(matches!(
            tokens.verify(&foreign, TokenKind::Access),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn malformed_subject_is_rejected() {
        let tokens = service();
        let token = tokens.create_access_token("not-an-identity").unwrap();
        assert!(matches!(
            tokens.verify(&token, TokenKind::Access),
            Err(TokenError::Invalid)
        ));
    }
}

//! Token subject codec.
//!
//! A logged-in user is identified by `"<usuario_id>-<external_id>"`, where the
//! external id is the social-login id the account was registered with.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::UsuarioId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UsuarioId,
    pub external_id: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity is missing the '-' separator")]
    MissingSeparator,

    #[error("invalid user id in identity: {0}")]
    InvalidUserId(String),

    #[error("invalid external id in identity: {0}")]
    InvalidExternalId(String),
}

/// Builds the identity string for a user, e.g. `5-123456789`.
#[must_use]
pub fn create_identity(usuario_id: i32, external_id: &str) -> String {
    format!("{usuario_id}-{external_id}")
}

pub fn parse_identity(identity: &str) -> Result<Identity, IdentityError> {
    let (id, external) = identity
        .split_once('-')
        .ok_or(IdentityError::MissingSeparator)?;

    let id = id
        .parse::<i32>()
        .map_err(|_| IdentityError::InvalidUserId(id.to_string()))?;
    let external_id = external
        .parse::<u64>()
        .map_err(|_| IdentityError::InvalidExternalId(external.to_string()))?;

    Ok(Identity {
        id: UsuarioId::new(id),
        external_id,
    })
}

impl Identity {
    #[must_use]
    pub fn encode(&self) -> String {
        create_identity(self.id.value(), &self.external_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_IDENTITY: &str = "5-123456789";

    #[test]
    fn create_identity_joins_ids() {
        assert_eq!(create_identity(5, "123456789"), VALID_IDENTITY);
    }

    #[test]
    fn parse_identity_recovers_both_ids() {
        let identity = parse_identity(VALID_IDENTITY).unwrap();
        assert_eq!(identity.id, UsuarioId::new(5));
        assert_eq!(identity.external_id, 123_456_789);
        assert_eq!(identity.encode(), VALID_IDENTITY);
    }

    #[test]
    fn parse_identity_rejects_malformed() {
        assert_eq!(
            parse_identity("5123456789"),
            Err(IdentityError::MissingSeparator)
        );
        assert!(matches!(
            parse_identity("x-123"),
            Err(IdentityError::InvalidUserId(_))
        ));
        assert!(matches!(
            parse_identity("5-abc"),
            Err(IdentityError::InvalidExternalId(_))
        ));
        assert!(parse_identity("5-").is_err());
    }
}

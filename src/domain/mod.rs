//! Domain types for the marketplace with strong typing.
//!
//! Newtype identifiers keep user and listing ids from being mixed up at
//! service boundaries; the submodules hold the pure rules (identity codec,
//! search text, listing order) that the services and handlers share.

pub mod events;
pub mod identity;
pub mod search;

pub use identity::{Identity, IdentityError, create_identity, parse_identity};
pub use search::{OrdemAnuncios, build_match_expression, build_search_text};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a `Usuario`.
///
/// # Examples
///
/// ```rust
/// use clozer::domain::UsuarioId;
///
/// let id = UsuarioId::new(5);
/// assert_eq!(id.value(), 5);
/// assert_eq!(id.to_string(), "5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsuarioId(i32);

impl UsuarioId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for UsuarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for UsuarioId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl From<UsuarioId> for i32 {
    fn from(id: UsuarioId) -> Self {
        id.0
    }
}

/// Unique identifier for an `Anuncio` (listing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnuncioId(i32);

impl AnuncioId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for AnuncioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for AnuncioId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl From<AnuncioId> for i32 {
    fn from(id: AnuncioId) -> Self {
        id.0
    }
}

/// Account kind shown on a seller profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TipoUsuario {
    #[default]
    #[serde(rename = "Pessoa Fisica")]
    PessoaFisica,
    #[serde(rename = "Garagem")]
    Garagem,
}

impl TipoUsuario {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PessoaFisica => "Pessoa Fisica",
            Self::Garagem => "Garagem",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Pessoa Fisica" => Some(Self::PessoaFisica),
            "Garagem" => Some(Self::Garagem),
            _ => None,
        }
    }
}

impl fmt::Display for TipoUsuario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamp layout used in every JSON payload and admin page.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[must_use]
pub fn format_timestamp(ts: &chrono::NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Formats an integer amount of reais as Brazilian currency, e.g. `R$ 45.000,00`.
#[must_use]
pub fn format_brl(valor: i64) -> String {
    let digits = valor.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if valor < 0 { "-" } else { "" };
    format!("{sign}R$ {grouped},00")
}

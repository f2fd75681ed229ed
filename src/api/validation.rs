use super::ApiError;
use crate::domain::OrdemAnuncios;

const MIN_LIMIT: u64 = 1;
const MAX_LIMIT: u64 = 1000;

/// Parses an optional `limit` query parameter. Blank means no limit.
pub fn parse_limit(raw: Option<&str>) -> Result<Option<u64>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let limit = raw
        .parse::<u64>()
        .map_err(|_| ApiError::validation(format!("Limite invalido: {raw}")))?;

    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Limite invalido: {limit}. Deve estar entre {MIN_LIMIT} e {MAX_LIMIT}"
        )));
    }
    Ok(Some(limit))
}

/// Parses an optional `order_by` against the allowlist.
pub fn parse_ordem(raw: Option<&str>, default: OrdemAnuncios) -> Result<OrdemAnuncios, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(value) => OrdemAnuncios::parse(value)
            .ok_or_else(|| ApiError::validation(format!("Ordenacao invalida: {value}"))),
    }
}

pub fn validate_id(id: i32, resource: &str) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::not_found(format!("{resource} {id} nao existe")));
    }
    Ok(id)
}

use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;

use super::{AnuncioDto, AnunciosResponse, ApiError, AppState, BuscaQuery};
use crate::api::validation::{parse_limit, parse_ordem};
use crate::domain::OrdemAnuncios;

pub async fn buscar(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BuscaQuery>,
) -> Result<Json<AnunciosResponse>, ApiError> {
    let limit = parse_limit(query.limit.as_deref())?;
    let ordem = parse_ordem(query.order_by.as_deref(), OrdemAnuncios::Relevancia)?;

    let anuncios = state
        .search_service()
        .search(query.query.as_deref().unwrap_or_default(), ordem, limit)
        .await?;

    Ok(Json(AnunciosResponse {
        anuncios: anuncios
            .iter()
            .map(|a| AnuncioDto::from_detalhado(a, true))
            .collect(),
    }))
}

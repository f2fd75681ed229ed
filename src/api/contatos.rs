use axum::{
    Json,
    extract::{Path, State},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::{ApiError, AppState, ContatoDto, ContatoRequest, ContatoResponse, keyed_by_id};
use crate::domain::events::NotificationEvent;

pub async fn list_contatos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ContatoDto>>, ApiError> {
    let contatos = state.store().contatos().all().await?;
    Ok(Json(contatos.iter().map(ContatoDto::from).collect()))
}

pub async fn get_contato(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ContatoResponse>, ApiError> {
    let contato = state
        .store()
        .contatos()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Contato {id} nao existe")))?;

    Ok(Json(ContatoResponse {
        contato: ContatoDto::from(&contato),
    }))
}

pub async fn create_contato(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ContatoRequest>,
) -> Result<Json<BTreeMap<String, ContatoDto>>, ApiError> {
    if payload.texto.trim().is_empty() {
        return Err(ApiError::validation("Informe a mensagem do contato"));
    }

    let contato = state
        .store()
        .contatos()
        .create(payload.nome.trim(), payload.contato.trim(), &payload.texto)
        .await?;
    info!(contato_id = contato.id, "Contact message received");

    state
        .shared
        .notifier
        .notify(&NotificationEvent::ContatoRecebido {
            contato_id: contato.id,
            nome: contato.nome.clone(),
            contato: contato.contato.clone(),
            texto: contato.texto.clone(),
        })
        .await;

    Ok(Json(keyed_by_id(contato.id, ContatoDto::from(&contato))))
}

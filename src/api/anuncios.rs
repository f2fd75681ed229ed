use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::auth::AuthUsuario;
use super::{AnuncioDto, AnuncioResponse, AnunciosResponse, ApiError, AppState, ListQuery, keyed_by_id};
use crate::api::validation::{parse_limit, parse_ordem, validate_id};
use crate::domain::{AnuncioId, OrdemAnuncios};
use crate::models::anuncio::{AnuncioUpdate, NovoAnuncio};

/// Multipart part name carrying image files.
const IMAGES_FIELD: &str = "imagens";

pub async fn list_anuncios(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<AnunciosResponse>, ApiError> {
    let limit = parse_limit(query.limit.as_deref())?;
    let ordem = parse_ordem(query.order_by.as_deref(), OrdemAnuncios::Recentes)?;

    let anuncios = state.anuncios().list_approved(ordem, limit).await?;

    Ok(Json(AnunciosResponse {
        anuncios: anuncios
            .iter()
            .map(|a| AnuncioDto::from_detalhado(a, true))
            .collect(),
    }))
}

pub async fn get_anuncio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<AnuncioResponse>, ApiError> {
    let id = validate_id(id, "Anuncio")?;
    let anuncio = state.anuncios().get(AnuncioId::new(id), true).await?;

    Ok(Json(AnuncioResponse {
        anuncio: AnuncioDto::from_detalhado(&anuncio, true),
    }))
}

pub async fn create_anuncio(
    State(state): State<Arc<AppState>>,
    auth: AuthUsuario,
    multipart: Multipart,
) -> Result<Json<BTreeMap<String, AnuncioDto>>, ApiError> {
    let (fields, uploads) = read_multipart(multipart).await?;

    let novo = NovoAnuncio::from_fields(&fields).map_err(ApiError::validation)?;
    if novo.titulo.is_empty() {
        return Err(ApiError::validation("Informe o titulo do anuncio"));
    }

    let anuncio = state.anuncios().create(auth.id(), novo, uploads).await?;

    Ok(Json(keyed_by_id(
        anuncio.anuncio.id,
        AnuncioDto::from_detalhado(&anuncio, false),
    )))
}

pub async fn update_anuncio(
    State(state): State<Arc<AppState>>,
    auth: AuthUsuario,
    Path(id): Path<i32>,
    Json(changes): Json<AnuncioUpdate>,
) -> Result<Json<BTreeMap<String, AnuncioDto>>, ApiError> {
    let id = validate_id(id, "Anuncio")?;
    let anuncio = state
        .anuncios()
        .update(auth.id(), AnuncioId::new(id), changes)
        .await?;

    Ok(Json(keyed_by_id(
        anuncio.anuncio.id,
        AnuncioDto::from_detalhado(&anuncio, false),
    )))
}

pub async fn delete_anuncio(
    State(state): State<Arc<AppState>>,
    auth: AuthUsuario,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let id = validate_id(id, "Anuncio")?;
    state
        .anuncios()
        .delete(Some(auth.id()), AnuncioId::new(id))
        .await?;
    Ok(Json(json!({})))
}

pub async fn delete_imagem(
    State(state): State<Arc<AppState>>,
    auth: AuthUsuario,
    Path((anuncio_id, imagem_id)): Path<(i32, i32)>,
) -> Result<Json<Value>, ApiError> {
    let anuncio_id = validate_id(anuncio_id, "Anuncio")?;
    state
        .anuncios()
        .delete_imagem(auth.id(), AnuncioId::new(anuncio_id), imagem_id)
        .await?;
    Ok(Json(json!({})))
}

/// Splits a multipart body into text fields and image payloads.
///
/// Empty file parts (a file input left blank) are skipped.
async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(HashMap<String, String>, Vec<Vec<u8>>), ApiError> {
    let mut fields = HashMap::new();
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Formulario invalido: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGES_FIELD {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Formulario invalido: {e}")))?;
            if !bytes.is_empty() {
                uploads.push(bytes.to_vec());
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::validation(format!("Campo {name} invalido: {e}")))?;
            fields.insert(name, value);
        }
    }

    Ok((fields, uploads))
}

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, AppState, ImagemDto, ImagemResponse};

pub async fn get_imagem(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ImagemResponse>, ApiError> {
    let imagem = state
        .store()
        .imagens()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Imagem de id {id} nao existe")))?;

    Ok(Json(ImagemResponse {
        imagem: ImagemDto::from(&imagem),
    }))
}

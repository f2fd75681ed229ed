use axum::{
    Json,
    extract::{Path, State},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::auth::AuthUsuario;
use super::{ApiError, AppState, UsuarioDto, UsuarioResponse, UsuariosResponse, keyed_by_id};
use crate::db::repositories::is_unique_violation;
use crate::domain::UsuarioId;
use crate::domain::events::NotificationEvent;
use crate::models::usuario::{NovoUsuario, UsuarioUpdate};

pub async fn list_usuarios(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsuariosResponse>, ApiError> {
    let usuarios = state.store().usuarios().all().await?;
    Ok(Json(UsuariosResponse {
        usuarios: usuarios.iter().map(UsuarioDto::from).collect(),
    }))
}

/// Short numeric keys are internal ids; anything else is the external id.
pub async fn get_usuario(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<UsuarioResponse>, ApiError> {
    let mut usuario = state
        .store()
        .usuarios()
        .get_by_lookup_key(&key)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Usuario {key} nao existe")))?;

    state.store().usuarios().increment_views(usuario.id).await?;
    usuario.views += 1;

    let anuncios = state
        .anuncios()
        .list_by_owner(UsuarioId::new(usuario.id))
        .await?;

    Ok(Json(UsuarioResponse {
        usuario: UsuarioDto::with_anuncios(&usuario, &anuncios),
    }))
}

pub async fn create_usuario(
    State(state): State<Arc<AppState>>,
    Json(novo): Json<NovoUsuario>,
) -> Result<Json<BTreeMap<String, UsuarioDto>>, ApiError> {
    let tipo = novo.validate().map_err(ApiError::validation)?;
    let facebook_id = novo.facebook_id.trim();

    let usuarios = state.store().usuarios();
    if let Some(existing) = usuarios.get_by_facebook_id(facebook_id).await? {
        return Err(ja_existe(facebook_id, existing.id));
    }

    let usuario = match usuarios.create(&novo, tipo).await {
        Ok(usuario) => usuario,
        // A concurrent signup won the insert after our lookup
        Err(e) if is_unique_violation(&e) => {
            let existing = usuarios.get_by_facebook_id(facebook_id).await?;
            return Err(match existing {
                Some(existing) => ja_existe(facebook_id, existing.id),
                None => e.into(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    info!(usuario_id = usuario.id, "User registered");

    state
        .shared
        .notifier
        .notify(&NotificationEvent::UsuarioCadastrado {
            usuario_id: usuario.id,
            nome: usuario.nome.clone(),
            email: usuario.email.clone(),
            telefone: usuario.telefone.clone(),
            cidade: usuario.cidade.clone(),
            estado: usuario.estado.clone(),
        })
        .await;

    Ok(Json(keyed_by_id(usuario.id, UsuarioDto::from(&usuario))))
}

fn ja_existe(facebook_id: &str, id: i32) -> ApiError {
    ApiError::Conflict(format!("Usuario {facebook_id} ja existe. Id {id}"))
}

/// Users may only edit themselves. Another user's id answers as not found.
pub async fn update_usuario(
    State(state): State<Arc<AppState>>,
    auth: AuthUsuario,
    Path(id): Path<i32>,
    Json(changes): Json<UsuarioUpdate>,
) -> Result<Json<UsuarioResponse>, ApiError> {
    if auth.id().value() != id {
        return Err(ApiError::not_found(format!("Usuario {id} nao existe")));
    }
    changes.validate().map_err(ApiError::validation)?;

    let usuario = state
        .store()
        .usuarios()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Usuario {id} nao existe")))?;

    let usuario = state.store().usuarios().update(usuario, &changes).await?;
    info!(usuario_id = usuario.id, "User updated");

    Ok(Json(UsuarioResponse {
        usuario: UsuarioDto::from(&usuario),
    }))
}

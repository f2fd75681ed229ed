use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::{info, warn};

use super::{
    ADMIN_HOME, ADMIN_LOGIN, SESSION_USER_KEY, set_flash, take_flash, views,
};
use crate::api::AppState;
use crate::domain::{AnuncioId, UsuarioId};
use crate::models::anuncio::AdminAnuncioForm;
use crate::models::usuario::UsuarioUpdate;

/// Rows shown in the search log table.
const RECENT_SEARCHES: u64 = 50;

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ModeracaoForm {
    pub decisao: String,
}

/// Stores the outcome as a flash message and goes back to the dashboard.
async fn finish(session: &Session, outcome: Result<String, String>) -> Redirect {
    let message = outcome.unwrap_or_else(|e| {
        warn!(error = %e, "Admin action failed");
        e
    });
    set_flash(session, message).await;
    Redirect::to(ADMIN_HOME)
}

pub async fn login_page(session: Session) -> Html<String> {
    let flash = take_flash(&session).await;
    Html(views::login_page(flash.as_deref()))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Redirect {
    let valid = match state
        .store()
        .verify_admin_password(&form.username, &form.password)
        .await
    {
        Ok(valid) => valid,
        Err(e) => {
            warn!(error = %e, "Admin authentication error");
            false
        }
    };

    if !valid {
        set_flash(&session, "Usuario ou senha invalidos").await;
        return Redirect::to(ADMIN_LOGIN);
    }

    if let Err(e) = session.cycle_id().await {
        warn!(error = %e, "Failed to rotate session id");
    }
    if let Err(e) = session.insert(SESSION_USER_KEY, &form.username).await {
        warn!(error = %e, "Failed to create admin session");
        set_flash(&session, "Falha ao iniciar sessao").await;
        return Redirect::to(ADMIN_LOGIN);
    }

    info!(username = %form.username, "Moderator logged in");
    Redirect::to(ADMIN_HOME)
}

pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = session.flush().await {
        warn!(error = %e, "Failed to end admin session");
    }
    Redirect::to(ADMIN_LOGIN)
}

pub async fn index(State(state): State<Arc<AppState>>, session: Session) -> Response {
    let flash = take_flash(&session).await;
    let store = state.store();

    let loaded = tokio::try_join!(
        async { store.usuarios().all().await },
        async { store.anuncios().count_by_owner_map().await },
        async { state.anuncios().list_all().await.map_err(anyhow::Error::from) },
        async { store.buscas().recent(RECENT_SEARCHES).await },
    );

    match loaded {
        Ok((usuarios, contagem, anuncios, buscas)) => Html(views::index_page(
            flash.as_deref(),
            &usuarios,
            &contagem,
            &anuncios,
            &buscas,
        ))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load admin dashboard");
            Html(views::index_page(
                Some("Erro ao carregar os dados"),
                &[],
                &Default::default(),
                &[],
                &[],
            ))
            .into_response()
        }
    }
}

pub async fn edit_anuncio(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Response {
    match state.anuncios().get(AnuncioId::new(id), false).await {
        Ok(anuncio) => Html(views::anuncio_form(&anuncio)).into_response(),
        Err(e) => finish(&session, Err(e.to_string())).await.into_response(),
    }
}

pub async fn update_anuncio(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<AdminAnuncioForm>,
) -> Redirect {
    let outcome = match form.into_update() {
        Ok(changes) => state
            .anuncios()
            .admin_update(AnuncioId::new(id), changes)
            .await
            .map(|_| format!("Anuncio {id} atualizado"))
            .map_err(|e| e.to_string()),
        Err(e) => Err(e),
    };
    finish(&session, outcome).await
}

pub async fn moderate_anuncio(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<ModeracaoForm>,
) -> Redirect {
    let aprovado = match form.decisao.as_str() {
        "aprovar" => true,
        "reprovar" => false,
        other => {
            return finish(&session, Err(format!("Decisao invalida: {other}"))).await;
        }
    };

    let outcome = state
        .anuncios()
        .moderate(AnuncioId::new(id), aprovado)
        .await
        .map(|_| {
            if aprovado {
                format!("Anuncio {id} aprovado")
            } else {
                format!("Anuncio {id} reprovado")
            }
        })
        .map_err(|e| e.to_string());
    finish(&session, outcome).await
}

pub async fn delete_anuncio(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Redirect {
    let outcome = state
        .anuncios()
        .delete(None, AnuncioId::new(id))
        .await
        .map(|()| format!("Anuncio {id} excluido"))
        .map_err(|e| e.to_string());
    finish(&session, outcome).await
}

pub async fn edit_usuario(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Response {
    match state.store().usuarios().get(id).await {
        Ok(Some(usuario)) => Html(views::usuario_form(&usuario)).into_response(),
        Ok(None) => finish(&session, Err(format!("Usuario {id} nao existe")))
            .await
            .into_response(),
        Err(e) => finish(&session, Err(format!("{e:#}"))).await.into_response(),
    }
}

pub async fn update_usuario(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
    Form(changes): Form<UsuarioUpdate>,
) -> Redirect {
    let outcome = async {
        changes.validate()?;
        let usuarios = state.store().usuarios();
        let usuario = usuarios
            .get(id)
            .await
            .map_err(|e| format!("{e:#}"))?
            .ok_or_else(|| format!("Usuario {id} nao existe"))?;
        usuarios
            .update(usuario, &changes)
            .await
            .map_err(|e| format!("{e:#}"))?;
        info!(usuario_id = id, "User edited by moderator");
        Ok::<_, String>(format!("Usuario {id} atualizado"))
    }
    .await;
    finish(&session, outcome).await
}

pub async fn delete_usuario(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Redirect {
    let outcome = state
        .anuncios()
        .delete_usuario(UsuarioId::new(id))
        .await
        .map(|()| format!("Usuario {id} excluido"))
        .map_err(|e| e.to_string());
    finish(&session, outcome).await
}

pub async fn refresh_search(State(state): State<Arc<AppState>>, session: Session) -> Redirect {
    let outcome = state
        .anuncios()
        .refresh_search_text()
        .await
        .map(|updated| format!("Texto de busca atualizado em {updated} anuncios"))
        .map_err(|e| e.to_string());
    finish(&session, outcome).await
}

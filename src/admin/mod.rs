//! Moderation pages under `/admin`, behind a session login.

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::api::AppState;

mod handlers;
pub mod views;

/// Session key holding the logged-in moderator's username.
const SESSION_USER_KEY: &str = "admin_user";
/// Session key holding a message shown once on the next page.
const SESSION_FLASH_KEY: &str = "flash";

const ADMIN_HOME: &str = "/admin";
const ADMIN_LOGIN: &str = "/admin/login";

pub fn router(secure_cookies: bool) -> Router<Arc<AppState>> {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(60)));

    let protected = Router::new()
        .route(ADMIN_HOME, get(handlers::index))
        .route(
            "/admin/anuncios/{id}",
            get(handlers::edit_anuncio).post(handlers::update_anuncio),
        )
        .route(
            "/admin/anuncios/{id}/moderacao",
            post(handlers::moderate_anuncio),
        )
        .route("/admin/anuncios/{id}/excluir", post(handlers::delete_anuncio))
        .route(
            "/admin/usuarios/{id}",
            get(handlers::edit_usuario).post(handlers::update_usuario),
        )
        .route("/admin/usuarios/{id}/excluir", post(handlers::delete_usuario))
        .route("/admin/busca/atualizar", post(handlers::refresh_search))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .merge(protected)
        .route(ADMIN_LOGIN, get(handlers::login_page).post(handlers::login))
        .route("/admin/logout", post(handlers::logout))
        .layer(session_layer)
}

/// Redirects to the login page unless the session holds a moderator.
async fn require_admin(session: Session, request: Request, next: Next) -> Response {
    match session.get::<String>(SESSION_USER_KEY).await {
        Ok(Some(user)) => {
            tracing::Span::current().record("user_id", &user);
            next.run(request).await
        }
        Ok(None) => Redirect::to(ADMIN_LOGIN).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read admin session");
            Redirect::to(ADMIN_LOGIN).into_response()
        }
    }
}

async fn set_flash(session: &Session, message: impl Into<String>) {
    if let Err(e) = session.insert(SESSION_FLASH_KEY, message.into()).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

async fn take_flash(session: &Session) -> Option<String> {
    session
        .remove::<String>(SESSION_FLASH_KEY)
        .await
        .ok()
        .flatten()
}

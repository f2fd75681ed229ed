use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod anuncios;
pub mod auth;
mod busca;
mod contatos;
mod error;
mod imagens;
mod observability;
mod types;
mod usuarios;
mod validation;

pub use error::ApiError;
pub use types::*;

use crate::services::{AnuncioService, SearchService};
use metrics_exporter_prometheus::PrometheusHandle;

/// Prefix of every JSON route.
pub const API_PREFIX: &str = "/api/v1";

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn anuncios(&self) -> &Arc<dyn AnuncioService> {
        &self.shared.anuncio_service
    }

    #[must_use]
    pub fn search_service(&self) -> &Arc<SearchService> {
        &self.shared.search_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config().clone();

    let cors_origins = &config.server.cors_allowed_origins;
    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest(API_PREFIX, create_api_router())
        .route("/metrics", get(observability::get_metrics))
        .merge(crate::admin::router(config.server.secure_cookies))
        .nest_service("/images", ServeDir::new(&config.images.root))
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .with_state(state)
}

fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contatos", get(contatos::list_contatos))
        .route("/contato", post(contatos::create_contato))
        .route("/contato/{id}", get(contatos::get_contato))
        .route("/usuarios", get(usuarios::list_usuarios))
        .route("/usuario", post(usuarios::create_usuario))
        .route("/usuario/{id}", get(usuarios::get_usuario))
        .route("/usuario/{id}", put(usuarios::update_usuario))
        .route("/anuncios", get(anuncios::list_anuncios))
        .route("/anuncio", post(anuncios::create_anuncio))
        .route("/anuncio/{id}", get(anuncios::get_anuncio))
        .route("/anuncio/{id}", put(anuncios::update_anuncio))
        .route("/anuncio/{id}", delete(anuncios::delete_anuncio))
        .route(
            "/anuncio/{anuncio_id}/imagem/{id}",
            delete(anuncios::delete_imagem),
        )
        .route("/imagem/{id}", get(imagens::get_imagem))
        .route("/busca", get(busca::buscar))
        .route("/login", post(auth::login))
        .route("/refresh_token", post(auth::refresh_token))
}

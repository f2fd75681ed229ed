use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::db::Store;
use crate::domain::{OrdemAnuncios, build_match_expression};
use crate::models::anuncio::AnuncioDetalhado;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Informe o termo da busca")]
    EmptyQuery,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SearchError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// Full-text search over approved listings.
pub struct SearchService {
    store: Arc<Store>,
}

impl SearchService {
    #[must_use]
    pub const fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Every term must match. The executed expression is appended to the
    /// search log whether or not anything was found.
    pub async fn search(
        &self,
        query: &str,
        ordem: OrdemAnuncios,
        limit: Option<u64>,
    ) -> Result<Vec<AnuncioDetalhado>, SearchError> {
        let expression = build_match_expression(query).ok_or(SearchError::EmptyQuery)?;
        debug!(%expression, %ordem, ?limit, "Running full-text search");

        let anuncios = self
            .store
            .anuncios()
            .search(&expression, ordem, limit)
            .await?;

        self.store.buscas().log(&expression).await?;

        info!(
            query = %query.trim(),
            results = anuncios.len(),
            "Search executed"
        );

        Ok(self.store.detalhar(anuncios).await?)
    }
}

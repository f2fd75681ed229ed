//! Listing lifecycle: creation with images, owner edits, moderation and
//! cascading deletes.

use crate::domain::{AnuncioId, OrdemAnuncios, UsuarioId};
use crate::models::anuncio::{AnuncioDetalhado, AnuncioUpdate, NovoAnuncio};
use crate::services::image::ImageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnuncioError {
    #[error("Anuncio de id {0} nao existe")]
    NotFound(AnuncioId),

    /// Reported to clients exactly like a missing listing.
    #[error("Criador do anuncio nao eh este usuario")]
    NotOwner(AnuncioId),

    #[error("Imagem de id {0} nao existe")]
    ImagemNotFound(i32),

    #[error("Usuario {0} nao existe")]
    UsuarioNotFound(UsuarioId),

    #[error("Limite de Anuncios excedido!")]
    Quota { limit: u64 },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AnuncioError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AnuncioError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// Domain service for listings.
///
/// Handlers only talk to this trait, so tests can swap the storage out.
#[async_trait::async_trait]
pub trait AnuncioService: Send + Sync {
    /// Approved listings only.
    async fn list_approved(
        &self,
        ordem: OrdemAnuncios,
        limit: Option<u64>,
    ) -> Result<Vec<AnuncioDetalhado>, AnuncioError>;

    /// Every listing, newest first, for moderation.
    async fn list_all(&self) -> Result<Vec<AnuncioDetalhado>, AnuncioError>;

    async fn list_by_owner(&self, owner: UsuarioId) -> Result<Vec<AnuncioDetalhado>, AnuncioError>;

    /// Loads a listing. Public reads pass `count_view` to bump the counter.
    async fn get(&self, id: AnuncioId, count_view: bool) -> Result<AnuncioDetalhado, AnuncioError>;

    /// Creates an unapproved listing with its images in one transaction.
    ///
    /// # Errors
    ///
    /// - [`AnuncioError::Quota`] when the owner would exceed the listing cap
    /// - [`AnuncioError::Image`] when an upload cannot be decoded
    async fn create(
        &self,
        owner: UsuarioId,
        novo: NovoAnuncio,
        uploads: Vec<Vec<u8>>,
    ) -> Result<AnuncioDetalhado, AnuncioError>;

    /// Owner edit. The listing goes back to moderation.
    async fn update(
        &self,
        owner: UsuarioId,
        id: AnuncioId,
        changes: AnuncioUpdate,
    ) -> Result<AnuncioDetalhado, AnuncioError>;

    /// Moderator edit. Approval is left as it is.
    async fn admin_update(
        &self,
        id: AnuncioId,
        changes: AnuncioUpdate,
    ) -> Result<AnuncioDetalhado, AnuncioError>;

    async fn moderate(&self, id: AnuncioId, aprovado: bool) -> Result<AnuncioDetalhado, AnuncioError>;

    /// Deletes a listing, its images and its directory. `owner = None` skips
    /// the ownership check (moderators).
    async fn delete(&self, owner: Option<UsuarioId>, id: AnuncioId) -> Result<(), AnuncioError>;

    async fn delete_imagem(
        &self,
        owner: UsuarioId,
        anuncio_id: AnuncioId,
        imagem_id: i32,
    ) -> Result<(), AnuncioError>;

    /// Deletes a user together with every listing they own.
    async fn delete_usuario(&self, id: UsuarioId) -> Result<(), AnuncioError>;

    /// Recomputes the search text of every listing. Returns how many changed.
    async fn refresh_search_text(&self) -> Result<u64, AnuncioError>;
}

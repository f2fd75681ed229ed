//! `SeaORM` implementation of the [`AnuncioService`] trait.

use sea_orm::{DatabaseTransaction, DbErr, TransactionTrait};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::Store;
use crate::db::repositories::{
    anuncio as anuncio_repo, imagem as imagem_repo, usuario as usuario_repo,
};
use crate::domain::events::NotificationEvent;
use crate::domain::{AnuncioId, OrdemAnuncios, UsuarioId};
use crate::entities::{anuncio, imagem};
use crate::models::anuncio::{AnuncioDetalhado, AnuncioUpdate, NovoAnuncio};
use crate::services::anuncio_service::{AnuncioError, AnuncioService};
use crate::services::{ImageService, Notifier};

pub struct SeaOrmAnuncioService {
    store: Arc<Store>,
    images: Arc<ImageService>,
    notifier: Arc<Notifier>,
    quota: u64,
}

impl SeaOrmAnuncioService {
    #[must_use]
    pub const fn new(
        store: Arc<Store>,
        images: Arc<ImageService>,
        notifier: Arc<Notifier>,
        quota: u64,
    ) -> Self {
        Self {
            store,
            images,
            notifier,
            quota,
        }
    }

    async fn detalhar_one(&self, anuncio: anuncio::Model) -> Result<AnuncioDetalhado, AnuncioError> {
        let id = anuncio.id;
        self.store
            .detalhar(vec![anuncio])
            .await?
            .pop()
            .ok_or(AnuncioError::NotFound(AnuncioId::new(id)))
    }

    async fn load(&self, id: AnuncioId) -> Result<anuncio::Model, AnuncioError> {
        self.store
            .anuncios()
            .get(id.value())
            .await?
            .ok_or(AnuncioError::NotFound(id))
    }

    async fn load_owned(&self, owner: UsuarioId, id: AnuncioId) -> Result<anuncio::Model, AnuncioError> {
        let anuncio = self.load(id).await?;
        if anuncio.usuario_id != owner.value() {
            return Err(AnuncioError::NotOwner(id));
        }
        Ok(anuncio)
    }

    /// Inserts the listing and its images inside `txn`, enforcing the quota.
    ///
    /// If anything fails once files were written, the listing directory is
    /// removed before returning; the caller only has to drop the transaction.
    async fn insert_in(
        &self,
        txn: &DatabaseTransaction,
        owner: UsuarioId,
        novo: &NovoAnuncio,
        processed: &[Vec<u8>],
    ) -> Result<(anuncio::Model, Vec<imagem::Model>), AnuncioError> {
        // Counting after the insert means the write lock is already held, so
        // concurrent creations by the same owner are serialised here.
        let anuncio = anuncio_repo::insert(txn, owner.value(), novo).await?;
        let total = anuncio_repo::count_by_owner(txn, owner.value()).await?;
        if total > self.quota {
            return Err(AnuncioError::Quota { limit: self.quota });
        }

        match self.attach_images(txn, owner, anuncio.id, processed).await {
            Ok(imagens) => Ok((anuncio, imagens)),
            Err(e) => {
                self.remove_listing_files(owner.value(), anuncio.id, &[]).await;
                Err(e)
            }
        }
    }

    async fn attach_images(
        &self,
        txn: &DatabaseTransaction,
        owner: UsuarioId,
        anuncio_id: i32,
        processed: &[Vec<u8>],
    ) -> Result<Vec<imagem::Model>, AnuncioError> {
        let paths = self
            .images
            .write_listing_images(owner.value(), anuncio_id, processed)
            .await
            .map_err(|e| AnuncioError::Internal(format!("{e:#}")))?;

        let mut imagens = Vec::with_capacity(paths.len());
        for path in &paths {
            imagens.push(imagem_repo::insert(txn, anuncio_id, path).await?);
        }
        Ok(imagens)
    }

    async fn save(
        &self,
        mut anuncio: anuncio::Model,
        changes: &AnuncioUpdate,
        reset_approval: bool,
    ) -> Result<AnuncioDetalhado, AnuncioError> {
        changes.apply(&mut anuncio);
        if reset_approval {
            anuncio.aprovado = false;
        }

        let txn = self.store.conn.begin().await?;
        let saved = anuncio_repo::save(&txn, anuncio).await?;
        txn.commit().await?;

        self.detalhar_one(saved).await
    }

    /// Removes files of a deleted listing. The rows are already gone, so
    /// failures are only logged.
    async fn remove_listing_files(&self, usuario_id: i32, anuncio_id: i32, imagens: &[imagem::Model]) {
        for img in imagens {
            if let Err(e) = self.images.remove_file(&img.img_filename).await {
                warn!(anuncio_id, error = %e, "Failed to remove image file");
            }
        }
        if let Err(e) = self.images.remove_listing_dir(usuario_id, anuncio_id).await {
            warn!(anuncio_id, error = %e, "Failed to remove listing directory");
        }
    }
}

#[async_trait::async_trait]
impl AnuncioService for SeaOrmAnuncioService {
    async fn list_approved(
        &self,
        ordem: OrdemAnuncios,
        limit: Option<u64>,
    ) -> Result<Vec<AnuncioDetalhado>, AnuncioError> {
        let anuncios = self.store.anuncios().list_approved(ordem, limit).await?;
        Ok(self.store.detalhar(anuncios).await?)
    }

    async fn list_all(&self) -> Result<Vec<AnuncioDetalhado>, AnuncioError> {
        let anuncios = self.store.anuncios().list_newest().await?;
        Ok(self.store.detalhar(anuncios).await?)
    }

    async fn list_by_owner(&self, owner: UsuarioId) -> Result<Vec<AnuncioDetalhado>, AnuncioError> {
        let anuncios = self.store.anuncios().list_by_owner(owner.value()).await?;
        Ok(self.store.detalhar(anuncios).await?)
    }

    async fn get(&self, id: AnuncioId, count_view: bool) -> Result<AnuncioDetalhado, AnuncioError> {
        if count_view {
            self.store.anuncios().increment_views(id.value()).await?;
        }
        let anuncio = self.load(id).await?;
        self.detalhar_one(anuncio).await
    }

    async fn create(
        &self,
        owner: UsuarioId,
        novo: NovoAnuncio,
        uploads: Vec<Vec<u8>>,
    ) -> Result<AnuncioDetalhado, AnuncioError> {
        let usuario = self
            .store
            .usuarios()
            .get(owner.value())
            .await?
            .ok_or(AnuncioError::UsuarioNotFound(owner))?;

        let processed = self.images.process_uploads(uploads).await?;

        let txn = self.store.conn.begin().await?;
        let (anuncio, imagens) = match self.insert_in(&txn, owner, &novo, &processed).await {
            Ok(inserted) => inserted,
            Err(e) => {
                let e = keep_cause(txn.rollback(), e).await;
                if matches!(e, AnuncioError::Quota { .. }) {
                    warn!(usuario_id = owner.value(), limit = self.quota, "Listing quota exceeded");
                }
                return Err(e);
            }
        };

        if let Err(e) = txn.commit().await {
            self.remove_listing_files(owner.value(), anuncio.id, &imagens).await;
            return Err(e.into());
        }

        info!(
            anuncio_id = anuncio.id,
            usuario_id = owner.value(),
            imagens = imagens.len(),
            "Listing created"
        );

        self.notifier
            .notify(&NotificationEvent::AnuncioCriado {
                anuncio_id: anuncio.id,
                titulo: anuncio.titulo.clone(),
                valor: anuncio.valor,
                usuario_id: usuario.id,
                usuario_nome: usuario.nome.clone(),
                usuario_email: usuario.email.clone(),
            })
            .await;

        Ok(AnuncioDetalhado {
            anuncio,
            usuario: Some(usuario),
            imagens,
        })
    }

    async fn update(
        &self,
        owner: UsuarioId,
        id: AnuncioId,
        changes: AnuncioUpdate,
    ) -> Result<AnuncioDetalhado, AnuncioError> {
        let anuncio = self.load_owned(owner, id).await?;
        let detalhado = self.save(anuncio, &changes, true).await?;
        info!(anuncio_id = id.value(), usuario_id = owner.value(), "Listing updated");
        Ok(detalhado)
    }

    async fn admin_update(
        &self,
        id: AnuncioId,
        changes: AnuncioUpdate,
    ) -> Result<AnuncioDetalhado, AnuncioError> {
        let anuncio = self.load(id).await?;
        let detalhado = self.save(anuncio, &changes, false).await?;
        info!(anuncio_id = id.value(), "Listing edited by moderator");
        Ok(detalhado)
    }

    async fn moderate(&self, id: AnuncioId, aprovado: bool) -> Result<AnuncioDetalhado, AnuncioError> {
        let anuncio = self
            .store
            .anuncios()
            .set_approval(id.value(), aprovado)
            .await?
            .ok_or(AnuncioError::NotFound(id))?;
        let detalhado = self.detalhar_one(anuncio).await?;

        info!(anuncio_id = id.value(), aprovado, "Listing moderated");

        if let Some(usuario) = &detalhado.usuario {
            self.notifier
                .notify(&NotificationEvent::AnuncioModerado {
                    anuncio_id: id.value(),
                    titulo: detalhado.anuncio.titulo.clone(),
                    aprovado,
                    usuario_email: usuario.email.clone(),
                })
                .await;
        }

        Ok(detalhado)
    }

    async fn delete(&self, owner: Option<UsuarioId>, id: AnuncioId) -> Result<(), AnuncioError> {
        let anuncio = match owner {
            Some(owner) => self.load_owned(owner, id).await?,
            None => self.load(id).await?,
        };
        let imagens = self.store.imagens().list_for_anuncio(anuncio.id).await?;

        let txn = self.store.conn.begin().await?;
        anuncio_repo::delete_with_children(&txn, anuncio.id).await?;
        txn.commit().await?;

        self.remove_listing_files(anuncio.usuario_id, anuncio.id, &imagens)
            .await;

        info!(
            anuncio_id = anuncio.id,
            usuario_id = anuncio.usuario_id,
            imagens = imagens.len(),
            "Listing deleted"
        );
        Ok(())
    }

    async fn delete_imagem(
        &self,
        owner: UsuarioId,
        anuncio_id: AnuncioId,
        imagem_id: i32,
    ) -> Result<(), AnuncioError> {
        self.load_owned(owner, anuncio_id).await?;

        let imagem = self
            .store
            .imagens()
            .get(imagem_id)
            .await?
            .filter(|img| img.anuncio_id == anuncio_id.value())
            .ok_or(AnuncioError::ImagemNotFound(imagem_id))?;

        self.store.imagens().delete(imagem.id).await?;
        if let Err(e) = self.images.remove_file(&imagem.img_filename).await {
            warn!(imagem_id, error = %e, "Failed to remove image file");
        }

        info!(imagem_id, anuncio_id = anuncio_id.value(), "Image deleted");
        Ok(())
    }

    async fn delete_usuario(&self, id: UsuarioId) -> Result<(), AnuncioError> {
        self.store
            .usuarios()
            .get(id.value())
            .await?
            .ok_or(AnuncioError::UsuarioNotFound(id))?;

        let txn = self.store.conn.begin().await?;
        let anuncio_ids = usuario_repo::delete_with_children(&txn, id.value()).await?;
        txn.commit().await?;

        if let Err(e) = self.images.remove_user_dir(id.value()).await {
            warn!(usuario_id = id.value(), error = %e, "Failed to remove user image directory");
        }

        info!(
            usuario_id = id.value(),
            anuncios = anuncio_ids.len(),
            "User deleted"
        );
        Ok(())
    }

    async fn refresh_search_text(&self) -> Result<u64, AnuncioError> {
        Ok(self.store.anuncios().refresh_search_text().await?)
    }
}

/// Waits for a rollback and hands back the error that caused it.
async fn keep_cause(
    rollback: impl Future<Output = Result<(), DbErr>>,
    cause: AnuncioError,
) -> AnuncioError {
    if let Err(e) = rollback.await {
        warn!(error = %e, cause = %cause, "Failed to roll back listing insert");
    }
    cause
}

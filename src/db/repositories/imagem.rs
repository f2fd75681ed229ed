use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use super::Repository;
use crate::entities::imagem;

pub struct ImagemRepository {
    base: Repository<imagem::Entity>,
}

impl ImagemRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self {
            base: Repository::new(conn),
        }
    }

    pub async fn get(&self, id: i32) -> Result<Option<imagem::Model>> {
        self.base.find_by_id(id).await
    }

    pub async fn list_for_anuncio(&self, anuncio_id: i32) -> Result<Vec<imagem::Model>> {
        self.list_for_anuncios(&[anuncio_id]).await
    }

    /// One query for any number of listings, ordered by image id.
    pub async fn list_for_anuncios(&self, anuncio_ids: &[i32]) -> Result<Vec<imagem::Model>> {
        if anuncio_ids.is_empty() {
            return Ok(Vec::new());
        }

        imagem::Entity::find()
            .filter(imagem::Column::AnuncioId.is_in(anuncio_ids.iter().copied()))
            .order_by_asc(imagem::Column::Id)
            .all(self.base.conn())
            .await
            .context("Failed to list images for listings")
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        self.base.delete_by_id(id).await
    }
}

/// Records an image file; runs inside the caller's transaction.
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    anuncio_id: i32,
    img_filename: &str,
) -> Result<imagem::Model> {
    let active = imagem::ActiveModel {
        anuncio_id: Set(anuncio_id),
        titulo: Set(None),
        img_filename: Set(img_filename.to_string()),
        ..Default::default()
    };

    active
        .insert(db)
        .await
        .context("Failed to insert image row")
}

use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{Repository, anuncio as anuncio_repo};
use crate::domain::TipoUsuario;
use crate::entities::{anuncio, prelude::*, usuario};
use crate::models::usuario::{NovoUsuario, UsuarioUpdate};

pub struct UsuarioRepository {
    base: Repository<usuario::Entity>,
}

impl UsuarioRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self {
            base: Repository::new(conn),
        }
    }

    pub async fn all(&self) -> Result<Vec<usuario::Model>> {
        Usuario::find()
            .order_by_asc(usuario::Column::Id)
            .all(self.base.conn())
            .await
            .context("Failed to list users")
    }

    pub async fn get(&self, id: i32) -> Result<Option<usuario::Model>> {
        self.base.find_by_id(id).await
    }

    pub async fn get_by_ids(&self, ids: &[i32]) -> Result<Vec<usuario::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Usuario::find()
            .filter(usuario::Column::Id.is_in(ids.iter().copied()))
            .all(self.base.conn())
            .await
            .context("Failed to query users by ids")
    }

    pub async fn get_by_facebook_id(&self, facebook_id: &str) -> Result<Option<usuario::Model>> {
        Usuario::find()
            .filter(usuario::Column::FacebookId.eq(facebook_id))
            .one(self.base.conn())
            .await
            .context("Failed to query user by facebook_id")
    }

    /// Resolves a public lookup key: short numeric keys are internal ids,
    /// anything else is a social-login id.
    pub async fn get_by_lookup_key(&self, key: &str) -> Result<Option<usuario::Model>> {
        match key.parse::<i32>() {
            Ok(id) if key.len() < 6 => self.get(id).await,
            _ => self.get_by_facebook_id(key).await,
        }
    }

    pub async fn create(&self, novo: &NovoUsuario, tipo: TipoUsuario) -> Result<usuario::Model> {
        let active = usuario::ActiveModel {
            facebook_id: Set(novo.facebook_id.trim().to_string()),
            nome: Set(novo.nome.trim().to_string()),
            tipo: Set(tipo.as_str().to_string()),
            cidade: Set(novo.cidade.trim().to_string()),
            estado: Set(novo.estado.trim().to_string()),
            telefone: Set(novo.telefone.trim().to_string()),
            email: Set(novo.email.trim().to_string()),
            views: Set(0),
            cadastrado_em: Set(chrono::Local::now().naive_local()),
            ..Default::default()
        };

        self.base.insert(active).await
    }

    pub async fn update(
        &self,
        model: usuario::Model,
        changes: &UsuarioUpdate,
    ) -> Result<usuario::Model> {
        let mut active: usuario::ActiveModel = model.into();
        changes.apply(&mut active);
        self.base.update(active).await
    }

    pub async fn increment_views(&self, id: i32) -> Result<()> {
        Usuario::update_many()
            .col_expr(
                usuario::Column::Views,
                Expr::col(usuario::Column::Views).add(1),
            )
            .filter(usuario::Column::Id.eq(id))
            .exec(self.base.conn())
            .await
            .context("Failed to increment user views")?;
        Ok(())
    }
}

/// Deletes a user with every owned listing, image row and index entry.
///
/// Returns the ids of the removed listings so the caller can clean up files.
pub async fn delete_with_children<C: ConnectionTrait>(db: &C, usuario_id: i32) -> Result<Vec<i32>> {
    let anuncio_ids: Vec<i32> = Anuncio::find()
        .filter(anuncio::Column::UsuarioId.eq(usuario_id))
        .all(db)
        .await
        .context("Failed to list listings of user")?
        .into_iter()
        .map(|a| a.id)
        .collect();

    for anuncio_id in &anuncio_ids {
        anuncio_repo::delete_with_children(db, *anuncio_id).await?;
    }

    Usuario::delete_by_id(usuario_id)
        .exec(db)
        .await
        .context("Failed to delete user")?;

    Ok(anuncio_ids)
}

use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set};

use super::Repository;
use crate::entities::busca;

/// Append-only log of executed searches.
pub struct BuscaRepository {
    base: Repository<busca::Entity>,
}

impl BuscaRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self {
            base: Repository::new(conn),
        }
    }

    /// The submitting user is never recorded.
    pub async fn log(&self, expressao: &str) -> Result<busca::Model> {
        let active = busca::ActiveModel {
            usuario: Set(None),
            busca: Set(expressao.to_string()),
            buscado_em: Set(chrono::Local::now().naive_local()),
            ..Default::default()
        };

        self.base.insert(active).await
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<busca::Model>> {
        busca::Entity::find()
            .order_by_desc(busca::Column::Id)
            .limit(limit)
            .all(self.base.conn())
            .await
            .context("Failed to list recent searches")
    }

    pub async fn count(&self) -> Result<u64> {
        self.base.count().await
    }
}

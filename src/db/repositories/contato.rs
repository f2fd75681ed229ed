use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set};

use super::Repository;
use crate::entities::contato;

pub struct ContatoRepository {
    base: Repository<contato::Entity>,
}

impl ContatoRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self {
            base: Repository::new(conn),
        }
    }

    pub async fn all(&self) -> Result<Vec<contato::Model>> {
        contato::Entity::find()
            .order_by_asc(contato::Column::Id)
            .all(self.base.conn())
            .await
            .context("Failed to list contacts")
    }

    pub async fn get(&self, id: i32) -> Result<Option<contato::Model>> {
        self.base.find_by_id(id).await
    }

    pub async fn create(&self, nome: &str, contato: &str, texto: &str) -> Result<contato::Model> {
        let active = contato::ActiveModel {
            nome: Set(nome.to_string()),
            contato: Set(contato.to_string()),
            texto: Set(texto.to_string()),
            timestamp: Set(chrono::Local::now().naive_local()),
            ..Default::default()
        };

        self.base.insert(active).await
    }
}

//! Shared CRUD behaviour for every table keyed by an integer id.

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, PrimaryKeyTrait, SqlErr,
};
use std::marker::PhantomData;

/// True when a repository write failed on a unique index.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<DbErr>().and_then(DbErr::sql_err),
        Some(SqlErr::UniqueConstraintViolation(_))
    )
}

/// Thin generic repository over a sea-orm entity.
///
/// Entity-specific repositories wrap one of these and add their own queries.
pub struct Repository<E> {
    conn: DatabaseConnection,
    _entity: PhantomData<E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self::new(self.conn.clone())
    }
}

impl<E> Repository<E> {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub const fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }
}

impl<E> Repository<E>
where
    E: EntityTrait,
    E::Model: Send + Sync,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    pub async fn all(&self) -> Result<Vec<E::Model>> {
        E::find()
            .all(&self.conn)
            .await
            .with_context(|| format!("Failed to list {}", E::default().table_name()))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<E::Model>> {
        E::find_by_id(id)
            .one(&self.conn)
            .await
            .with_context(|| format!("Failed to query {} {id}", E::default().table_name()))
    }

    pub async fn insert<A>(&self, model: A) -> Result<E::Model>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        model
            .insert(&self.conn)
            .await
            .with_context(|| format!("Failed to insert into {}", E::default().table_name()))
    }

    pub async fn update<A>(&self, model: A) -> Result<E::Model>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        model
            .update(&self.conn)
            .await
            .with_context(|| format!("Failed to update {}", E::default().table_name()))
    }

    /// Returns whether a row was removed.
    pub async fn delete_by_id(&self, id: i32) -> Result<bool> {
        let result = E::delete_by_id(id)
            .exec(&self.conn)
            .await
            .with_context(|| format!("Failed to delete {} {id}", E::default().table_name()))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        E::find()
            .count(&self.conn)
            .await
            .with_context(|| format!("Failed to count {}", E::default().table_name()))
    }
}

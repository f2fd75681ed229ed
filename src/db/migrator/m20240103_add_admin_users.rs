use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Bootstrap moderator; change it with `clozer admin-password`.
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "password";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(AdminUsers)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = crate::db::repositories::admin::hash_password(DEFAULT_ADMIN_PASSWORD)
            .map_err(|e| DbErr::Custom(format!("Failed to hash default password: {e}")))?;

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(AdminUsers)
            .columns([
                crate::entities::admin_users::Column::Username,
                crate::entities::admin_users::Column::PasswordHash,
                crate::entities::admin_users::Column::CreatedAt,
                crate::entities::admin_users::Column::UpdatedAt,
            ])
            .values_panic([
                DEFAULT_ADMIN_USERNAME.into(),
                password_hash.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminUsers).to_owned())
            .await?;

        Ok(())
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE VIRTUAL TABLE IF NOT EXISTS anuncio_busca USING fts5(\
                anuncio_id UNINDEXED, \
                query_busca, \
                tokenize = 'unicode61 remove_diacritics 2'\
            )",
        )
        .await?;

        // Backfill rows that existed before the index did.
        db.execute_unprepared(
            "INSERT INTO anuncio_busca (anuncio_id, query_busca) \
             SELECT id, query_busca FROM anuncio \
             WHERE id NOT IN (SELECT anuncio_id FROM anuncio_busca)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS anuncio_busca")
            .await?;

        Ok(())
    }
}

use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, Statement,
    TransactionTrait,
};
use std::collections::HashMap;
use tracing::info;

use super::Repository;
use crate::domain::{OrdemAnuncios, build_search_text};
use crate::entities::{anuncio, imagem, prelude::*};
use crate::models::anuncio::NovoAnuncio;

pub struct AnuncioRepository {
    base: Repository<anuncio::Entity>,
}

fn apply_order(query: Select<Anuncio>, ordem: OrdemAnuncios) -> Select<Anuncio> {
    let query = match ordem {
        // Relevance needs a text query; without one newest first is the best we have.
        OrdemAnuncios::Recentes | OrdemAnuncios::Relevancia => {
            query.order_by_desc(anuncio::Column::CriadoEm)
        }
        OrdemAnuncios::Aleatorio => query.order_by(Expr::cust("RANDOM()"), Order::Asc),
        OrdemAnuncios::MenorPreco => query.order_by_asc(anuncio::Column::Valor),
        OrdemAnuncios::MaiorPreco => query.order_by_desc(anuncio::Column::Valor),
        OrdemAnuncios::MaisVistos => query.order_by_desc(anuncio::Column::Views),
    };
    query.order_by_desc(anuncio::Column::Id)
}

impl AnuncioRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self {
            base: Repository::new(conn),
        }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.base.conn()
    }

    pub async fn get(&self, id: i32) -> Result<Option<anuncio::Model>> {
        self.base.find_by_id(id).await
    }

    pub async fn list_approved(
        &self,
        ordem: OrdemAnuncios,
        limit: Option<u64>,
    ) -> Result<Vec<anuncio::Model>> {
        apply_order(
            Anuncio::find().filter(anuncio::Column::Aprovado.eq(true)),
            ordem,
        )
        .limit(limit)
        .all(self.conn())
        .await
        .context("Failed to list approved listings")
    }

    /// Every listing, approved or not, newest first.
    pub async fn list_newest(&self) -> Result<Vec<anuncio::Model>> {
        Anuncio::find()
            .order_by_desc(anuncio::Column::CriadoEm)
            .order_by_desc(anuncio::Column::Id)
            .all(self.conn())
            .await
            .context("Failed to list listings")
    }

    pub async fn list_by_owner(&self, usuario_id: i32) -> Result<Vec<anuncio::Model>> {
        Anuncio::find()
            .filter(anuncio::Column::UsuarioId.eq(usuario_id))
            .order_by_asc(anuncio::Column::Id)
            .all(self.conn())
            .await
            .context("Failed to list listings by owner")
    }

    /// Full-text search over approved listings.
    ///
    /// `expression` is an FTS5 query and is bound as a parameter; the order
    /// clause comes from a fixed allowlist.
    pub async fn search(
        &self,
        expression: &str,
        ordem: OrdemAnuncios,
        limit: Option<u64>,
    ) -> Result<Vec<anuncio::Model>> {
        let sql = format!(
            "SELECT anuncio.* FROM anuncio \
             JOIN anuncio_busca ON anuncio_busca.anuncio_id = anuncio.id \
             WHERE anuncio.aprovado = 1 AND anuncio_busca MATCH ? \
             ORDER BY {} \
             LIMIT ?",
            ordem.search_order_clause()
        );
        // SQLite treats a negative limit as "no limit".
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

        Anuncio::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                sql,
                [expression.into(), limit.into()],
            ))
            .all(self.conn())
            .await
            .context("Full-text search failed")
    }

    pub async fn increment_views(&self, id: i32) -> Result<()> {
        Anuncio::update_many()
            .col_expr(
                anuncio::Column::Views,
                Expr::col(anuncio::Column::Views).add(1),
            )
            .filter(anuncio::Column::Id.eq(id))
            .exec(self.conn())
            .await
            .context("Failed to increment listing views")?;
        Ok(())
    }

    /// Stamps the decision time whatever the outcome.
    pub async fn set_approval(&self, id: i32, aprovado: bool) -> Result<Option<anuncio::Model>> {
        let Some(model) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: anuncio::ActiveModel = model.into();
        active.aprovado = Set(aprovado);
        active.aprovado_em = Set(Some(chrono::Local::now().naive_local()));

        Ok(Some(self.base.update(active).await?))
    }

    /// Number of listings per owner, for owners that have any.
    pub async fn count_by_owner_map(&self) -> Result<HashMap<i32, u64>> {
        let rows: Vec<(i32, i64)> = Anuncio::find()
            .select_only()
            .column(anuncio::Column::UsuarioId)
            .column_as(Expr::col(anuncio::Column::Id).count(), "total")
            .group_by(anuncio::Column::UsuarioId)
            .into_tuple()
            .all(self.conn())
            .await
            .context("Failed to count listings per owner")?;

        Ok(rows
            .into_iter()
            .map(|(usuario_id, total)| (usuario_id, u64::try_from(total).unwrap_or(0)))
            .collect())
    }

    /// Recomputes the search text of every listing and rebuilds the index.
    pub async fn refresh_search_text(&self) -> Result<u64> {
        let txn = self.conn().begin().await?;

        let listings = Anuncio::find().all(&txn).await?;
        let mut changed = 0;

        for listing in listings {
            let text = build_search_text(
                listing.marca.as_deref(),
                listing.modelo.as_deref(),
                listing.ano,
                listing.cor.as_deref(),
            );

            if text != listing.query_busca {
                changed += 1;
            }

            let id = listing.id;
            let mut active: anuncio::ActiveModel = listing.into();
            active.query_busca = Set(text.clone());
            active.update(&txn).await?;

            sync_search_index(&txn, id, &text).await?;
        }

        txn.commit().await?;

        info!(changed, "Search text refreshed");
        Ok(changed)
    }
}

/// Inserts a new, unapproved listing.
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    usuario_id: i32,
    novo: &NovoAnuncio,
) -> Result<anuncio::Model> {
    let active = anuncio::ActiveModel {
        usuario_id: Set(usuario_id),
        titulo: Set(novo.titulo.clone()),
        descricao: Set(novo.descricao.clone()),
        valor: Set(novo.valor),
        marca: Set(novo.marca.clone()),
        modelo: Set(novo.modelo.clone()),
        ano: Set(novo.ano),
        cor: Set(novo.cor.clone()),
        query_busca: Set(novo.search_text()),
        aprovado: Set(false),
        views: Set(0),
        troca: Set(novo.troca),
        leilao: Set(novo.leilao),
        aprovado_em: Set(None),
        criado_em: Set(chrono::Local::now().naive_local()),
        cidade_veiculo: Set(novo.cidade_veiculo.clone()),
        estado_veiculo: Set(novo.estado_veiculo.clone()),
        ..Default::default()
    };

    let model = active
        .insert(db)
        .await
        .context("Failed to insert listing")?;
    sync_search_index(db, model.id, &model.query_busca).await?;

    Ok(model)
}

pub async fn count_by_owner<C: ConnectionTrait>(db: &C, usuario_id: i32) -> Result<u64> {
    Anuncio::find()
        .filter(anuncio::Column::UsuarioId.eq(usuario_id))
        .count(db)
        .await
        .context("Failed to count listings by owner")
}

/// Writes every column of `model` and mirrors its search text into the index.
pub async fn save<C: ConnectionTrait>(db: &C, model: anuncio::Model) -> Result<anuncio::Model> {
    let active: anuncio::ActiveModel = model.into();
    let saved = active
        .reset_all()
        .update(db)
        .await
        .context("Failed to update listing")?;
    sync_search_index(db, saved.id, &saved.query_busca).await?;

    Ok(saved)
}

pub async fn sync_search_index<C: ConnectionTrait>(db: &C, anuncio_id: i32, text: &str) -> Result<()> {
    remove_search_index(db, anuncio_id).await?;
    db.execute(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        "INSERT INTO anuncio_busca (anuncio_id, query_busca) VALUES (?, ?)",
        [anuncio_id.into(), text.into()],
    ))
    .await
    .context("Failed to index listing")?;
    Ok(())
}

async fn remove_search_index<C: ConnectionTrait>(db: &C, anuncio_id: i32) -> Result<()> {
    db.execute(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        "DELETE FROM anuncio_busca WHERE anuncio_id = ?",
        [anuncio_id.into()],
    ))
    .await
    .context("Failed to remove listing from index")?;
    Ok(())
}

/// Deletes a listing with its image rows and index entry.
///
/// Files are the caller's job, once the transaction has committed.
pub async fn delete_with_children<C: ConnectionTrait>(db: &C, anuncio_id: i32) -> Result<bool> {
    Imagem::delete_many()
        .filter(imagem::Column::AnuncioId.eq(anuncio_id))
        .exec(db)
        .await
        .context("Failed to delete listing images")?;

    remove_search_index(db, anuncio_id).await?;

    let result = Anuncio::delete_by_id(anuncio_id)
        .exec(db)
        .await
        .context("Failed to delete listing")?;

    Ok(result.rows_affected > 0)
}

use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, Statement,
    TransactionTrait,
};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{anuncio, imagem};
use crate::models::anuncio::AnuncioDetalhado;

pub mod migrator;
pub mod repositories;

use repositories::{
    admin::AdminRepository, anuncio::AnuncioRepository, busca::BuscaRepository,
    contato::ContatoRepository, imagem::ImagemRepository, usuario::UsuarioRepository,
};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Starts a transaction for flows that span several tables.
    pub async fn begin(&self) -> Result<DatabaseTransaction> {
        Ok(self.conn.begin().await?)
    }

    #[must_use]
    pub fn usuarios(&self) -> UsuarioRepository {
        UsuarioRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn anuncios(&self) -> AnuncioRepository {
        AnuncioRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn imagens(&self) -> ImagemRepository {
        ImagemRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn buscas(&self) -> BuscaRepository {
        BuscaRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn contatos(&self) -> ContatoRepository {
        ContatoRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn admins(&self) -> AdminRepository {
        AdminRepository::new(self.conn.clone())
    }

    /// Joins listings with their owners and images using one query per relation.
    pub async fn detalhar(&self, anuncios: Vec<anuncio::Model>) -> Result<Vec<AnuncioDetalhado>> {
        let anuncio_ids: Vec<i32> = anuncios.iter().map(|a| a.id).collect();
        let mut usuario_ids: Vec<i32> = anuncios.iter().map(|a| a.usuario_id).collect();
        usuario_ids.sort_unstable();
        usuario_ids.dedup();

        let (usuarios_repo, imagens_repo) = (self.usuarios(), self.imagens());
        let (usuarios, imagens) = tokio::try_join!(
            usuarios_repo.get_by_ids(&usuario_ids),
            imagens_repo.list_for_anuncios(&anuncio_ids)
        )?;

        let usuarios: HashMap<i32, _> = usuarios.into_iter().map(|u| (u.id, u)).collect();
        let mut imagens_por_anuncio: HashMap<i32, Vec<imagem::Model>> = HashMap::new();
        for img in imagens {
            imagens_por_anuncio.entry(img.anuncio_id).or_default().push(img);
        }

        Ok(anuncios
            .into_iter()
            .map(|anuncio| AnuncioDetalhado {
                usuario: usuarios.get(&anuncio.usuario_id).cloned(),
                imagens: imagens_por_anuncio.remove(&anuncio.id).unwrap_or_default(),
                anuncio,
            })
            .collect())
    }

    pub async fn verify_admin_password(&self, username: &str, password: &str) -> Result<bool> {
        self.admins().verify_password(username, password).await
    }

    pub async fn update_admin_password(&self, username: &str, password: &str) -> Result<()> {
        self.admins().update_password(username, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_migrates_and_pings() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.ping().await.unwrap();

        assert!(store.verify_admin_password("admin", "password").await.unwrap());
        assert!(!store.verify_admin_password("admin", "wrong").await.unwrap());
        assert_eq!(store.buscas().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn detalhar_attaches_owner_and_images() {
        use crate::entities::usuario;
        use sea_orm::{ActiveModelTrait, Set};

        // A single connection keeps every query on the same in-memory database
        let store = Store::with_pool_options("sqlite::memory:", 1, 1).await.unwrap();
        let now = chrono::Local::now().naive_local();

        let dono = usuario::ActiveModel {
            facebook_id: Set("1001".into()),
            nome: Set("Maria".into()),
            tipo: Set("Pessoa Fisica".into()),
            email: Set("maria@example.com".into()),
            cidade: Set("Recife".into()),
            estado: Set("PE".into()),
            telefone: Set(String::new()),
            views: Set(0),
            cadastrado_em: Set(now),
            ..Default::default()
        }
        .insert(&store.conn)
        .await
        .unwrap();

        let mut anuncios = Vec::new();
        for titulo in ["Gol", "Uno"] {
            let model = anuncio::ActiveModel {
                usuario_id: Set(dono.id),
                titulo: Set(titulo.into()),
                descricao: Set(String::new()),
                valor: Set(0),
                query_busca: Set(String::new()),
                aprovado: Set(false),
                views: Set(0),
                troca: Set(false),
                leilao: Set(false),
                criado_em: Set(now),
                cidade_veiculo: Set(String::new()),
                estado_veiculo: Set(String::new()),
                ..Default::default()
            }
            .insert(&store.conn)
            .await
            .unwrap();
            anuncios.push(model);
        }

        imagem::ActiveModel {
            anuncio_id: Set(anuncios[0].id),
            img_filename: Set(format!("{}/{}/imagem0.jpg", dono.id, anuncios[0].id)),
            ..Default::default()
        }
        .insert(&store.conn)
        .await
        .unwrap();

        let detalhados = store.detalhar(anuncios).await.unwrap();
        assert_eq!(detalhados.len(), 2);
        assert_eq!(detalhados[0].anuncio.titulo, "Gol");
        assert_eq!(detalhados[0].imagens.len(), 1);
        assert!(detalhados[1].imagens.is_empty());
        assert!(detalhados.iter().all(|d| d.usuario.as_ref().map(|u| u.id) == Some(dono.id)));
    }
}

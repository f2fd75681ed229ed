use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "anuncio")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub usuario_id: i32,
    pub titulo: String,
    pub descricao: String,
    pub valor: i64,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub ano: Option<i32>,
    pub cor: Option<String>,
    /// Derived from marca/modelo/ano/cor; mirrored into the `anuncio_busca` FTS table.
    pub query_busca: String,
    pub aprovado: bool,
    pub views: i32,
    pub troca: bool,
    pub leilao: bool,
    pub aprovado_em: Option<DateTime>,
    pub criado_em: DateTime,
    pub cidade_veiculo: String,
    pub estado_veiculo: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::usuario::Entity",
        from = "Column::UsuarioId",
        to = "super::usuario::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Usuario,
    #[sea_orm(has_many = "super::imagem::Entity")]
    Imagem,
}

impl Related<super::usuario::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usuario.def()
    }
}

impl Related<super::imagem::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Imagem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

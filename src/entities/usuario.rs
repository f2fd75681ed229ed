use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "usuario")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Social-login id the account signed up with.
    #[sea_orm(unique)]
    pub facebook_id: String,

    pub nome: String,

    /// "Pessoa Fisica" or "Garagem"
    pub tipo: String,

    pub cidade: String,

    pub estado: String,

    pub telefone: String,

    pub email: String,

    pub views: i32,

    pub cadastrado_em: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::anuncio::Entity")]
    Anuncio,
}

impl Related<super::anuncio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Anuncio.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "busca")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Submitting user. Never populated yet.
    pub usuario: Option<i32>,
    pub busca: String,
    pub buscado_em: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

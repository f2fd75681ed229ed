use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "imagem")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub anuncio_id: i32,
    pub titulo: Option<String>,
    /// Path relative to the image root, e.g. `5/12/imagem0.jpg`
    pub img_filename: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::anuncio::Entity",
        from = "Column::AnuncioId",
        to = "super::anuncio::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Anuncio,
}

impl Related<super::anuncio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Anuncio.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

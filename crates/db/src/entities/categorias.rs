//! `SeaORM` Entity for categorias table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "categorias")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_categoria: i32,
    pub categoria: String,
    pub uf: Option<String>,
    pub master: Option<String>,
    pub grupo: Option<String>,
    pub cod_class: Option<String>,
    pub classe_custo: Option<String>,
    pub criado_em: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::orcamentos::Entity")]
    Orcamentos,
}

impl Related<super::orcamentos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orcamentos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

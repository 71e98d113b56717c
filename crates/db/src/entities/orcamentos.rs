//! `SeaORM` Entity for orcamentos table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{BudgetStatus, MonthName};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "orcamentos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_orcamento: i32,
    pub id_categoria: i32,
    pub mes: MonthName,
    pub ano: i32,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub orcado: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub realizado: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub dif: Decimal,
    pub status: BudgetStatus,
    pub aprovado_por: Option<i32>,
    pub data_aprovacao: Option<DateTimeWithTimeZone>,
    pub criado_por: Option<i32>,
    pub atualizado_por: Option<i32>,
    pub criado_em: Option<DateTimeWithTimeZone>,
    pub atualizado_em: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categorias::Entity",
        from = "Column::IdCategoria",
        to = "super::categorias::Column::IdCategoria",
        on_delete = "Cascade"
    )]
    Categorias,
}

impl Related<super::categorias::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categorias.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

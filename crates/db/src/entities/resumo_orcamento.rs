//! `SeaORM` Entity for the resumo_orcamento view.
//!
//! Read-only. One row per category, year and month.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::MonthName;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "resumo_orcamento")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id_categoria: i32,
    pub categoria: String,
    pub uf: Option<String>,
    pub master: Option<String>,
    pub grupo: Option<String>,
    pub cod_class: Option<String>,
    pub classe_custo: Option<String>,
    #[sea_orm(primary_key, auto_increment = false)]
    pub ano: i32,
    pub mes: MonthName,
    pub total_orcado: Decimal,
    pub total_realizado: Decimal,
    pub total_dif: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! Read-only queries over the `resumo_orcamento` view.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use orcamento_core::budget::{BudgetStatus, Month};
use orcamento_core::dashboard::SummaryRow;

use crate::entities::sea_orm_active_enums::{BudgetStatus as DbStatus, MonthName};
use crate::entities::{categorias, orcamentos, resumo_orcamento};

use super::category::CategoryRepository;

/// Filters shared by the dashboard and the reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SummaryFilter {
    /// Year.
    pub ano: Option<i32>,
    /// Month.
    pub mes: Option<Month>,
    /// Category name.
    pub categoria: Option<String>,
    /// State.
    pub uf: Option<String>,
    /// Cost center.
    pub master: Option<String>,
    /// Group.
    pub grupo: Option<String>,
}

impl SummaryFilter {
    /// Same filter for another year.
    #[must_use]
    pub fn for_year(&self, ano: i32) -> Self {
        Self {
            ano: Some(ano),
            ..self.clone()
        }
    }
}

/// Distinct values for dashboard filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardFilterOptions {
    /// Years with entries, newest first.
    pub anos: Vec<i32>,
    /// Category names.
    pub categorias: Vec<String>,
    /// States.
    pub ufs: Vec<String>,
    /// Cost centers.
    pub centros_de_custo: Vec<String>,
}

/// Summary repository.
#[derive(Debug, Clone)]
pub struct SummaryRepository {
    db: DatabaseConnection,
}

impl SummaryRepository {
    /// Creates a new summary repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Rows of the view, newest year first, then by category, group and month.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn rows(&self, filter: &SummaryFilter) -> Result<Vec<SummaryRow>, DbErr> {
        let mut query = resumo_orcamento::Entity::find();
        if let Some(ano) = filter.ano {
            query = query.filter(resumo_orcamento::Column::Ano.eq(ano));
        }
        if let Some(mes) = filter.mes {
            query = query.filter(resumo_orcamento::Column::Mes.eq(MonthName::from(mes)));
        }
        if let Some(categoria) = non_blank(filter.categoria.as_deref()) {
            query = query.filter(resumo_orcamento::Column::Categoria.eq(categoria));
        }
        if let Some(uf) = non_blank(filter.uf.as_deref()) {
            query = query.filter(resumo_orcamento::Column::Uf.eq(uf));
        }
        if let Some(master) = non_blank(filter.master.as_deref()) {
            query = query.filter(resumo_orcamento::Column::Master.eq(master));
        }
        if let Some(grupo) = non_blank(filter.grupo.as_deref()) {
            query = query.filter(resumo_orcamento::Column::Grupo.eq(grupo));
        }

        let mut rows: Vec<SummaryRow> = query
            .all(&self.db)
            .await?
            .into_iter()
            .map(SummaryRow::from)
            .collect();

        rows.sort_by(|a, b| {
            (Reverse(a.ano), &a.categoria, &a.grupo, a.mes)
                .cmp(&(Reverse(b.ano), &b.categoria, &b.grupo, b.mes))
        });
        Ok(rows)
    }

    /// Distinct years and category attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn filter_options(&self) -> Result<DashboardFilterOptions, DbErr> {
        let anos: Vec<i32> = orcamentos::Entity::find()
            .select_only()
            .column(orcamentos::Column::Ano)
            .distinct()
            .order_by_desc(orcamentos::Column::Ano)
            .into_tuple()
            .all(&self.db)
            .await?;

        let categories = CategoryRepository::new(self.db.clone());
        Ok(DashboardFilterOptions {
            anos,
            categorias: categories.distinct(categorias::Column::Categoria).await?,
            ufs: categories.distinct(categorias::Column::Uf).await?,
            centros_de_custo: categories.distinct(categorias::Column::Master).await?,
        })
    }

    /// Number of categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn category_count(&self) -> Result<u64, DbErr> {
        CategoryRepository::new(self.db.clone()).count().await
    }

    /// Entry counts per status, optionally for one year.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn status_counts(&self, ano: Option<i32>) -> Result<Vec<(BudgetStatus, u64)>, DbErr> {
        let mut query = orcamentos::Entity::find()
            .select_only()
            .column(orcamentos::Column::Status)
            .column_as(Expr::col(orcamentos::Column::IdOrcamento).count(), "total")
            .group_by(orcamentos::Column::Status);
        if let Some(ano) = ano {
            query = query.filter(orcamentos::Column::Ano.eq(ano));
        }

        let counts: Vec<(DbStatus, i64)> = query.into_tuple().all(&self.db).await?;
        Ok(counts
            .into_iter()
            .map(|(status, total)| (status.into(), u64::try_from(total).unwrap_or_default()))
            .collect())
    }
}

impl From<resumo_orcamento::Model> for SummaryRow {
    fn from(row: resumo_orcamento::Model) -> Self {
        Self {
            categoria: row.categoria,
            uf: row.uf,
            master: row.master,
            grupo: row.grupo,
            cod_class: row.cod_class,
            classe_custo: row.classe_custo,
            ano: row.ano,
            mes: row.mes.into(),
            total_orcado: row.total_orcado,
            total_realizado: row.total_realizado,
            total_dif: row.total_dif,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_view_row_into_summary_row() {
        let row = resumo_orcamento::Model {
            id_categoria: 1,
            categoria: "Energia".to_string(),
            uf: Some("SP".to_string()),
            master: None,
            grupo: Some("Utilidades".to_string()),
            cod_class: None,
            classe_custo: None,
            ano: 2024,
            mes: MonthName::Dezembro,
            total_orcado: dec!(10),
            total_realizado: dec!(12),
            total_dif: dec!(2),
        };
        let summary = SummaryRow::from(row);
        assert_eq!(summary.mes, Month::Dezembro);
        assert_eq!(summary.total_dif, dec!(2));
    }

    #[test]
    fn test_filter_for_year_keeps_other_fields() {
        let filter = SummaryFilter {
            ano: Some(2024),
            uf: Some("RJ".to_string()),
            ..SummaryFilter::default()
        };
        let previous = filter.for_year(2023);
        assert_eq!(previous.ano, Some(2023));
        assert_eq!(previous.uf.as_deref(), Some("RJ"));
    }
}

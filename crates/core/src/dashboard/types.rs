//! Dashboard data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::budget::Month;

/// One row of the `resumo_orcamento` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Category name.
    pub categoria: String,
    /// State.
    pub uf: Option<String>,
    /// Cost center.
    pub master: Option<String>,
    /// Group.
    pub grupo: Option<String>,
    /// Classification code.
    pub cod_class: Option<String>,
    /// Cost class.
    pub classe_custo: Option<String>,
    /// Year.
    pub ano: i32,
    /// Month.
    pub mes: Month,
    /// Planned sum.
    pub total_orcado: Decimal,
    /// Actual sum.
    pub total_realizado: Decimal,
    /// Difference sum.
    pub total_dif: Decimal,
}

/// Overall totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardTotals {
    /// Planned total.
    pub total_orcado: Decimal,
    /// Actual total.
    pub total_realizado: Decimal,
    /// Difference total.
    pub total_dif: Decimal,
    /// `realizado / orcado * 100`, 0 when nothing was planned.
    pub percentual_execucao: Decimal,
}

/// One month of the yearly series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    /// Month.
    pub mes: Month,
    /// Planned.
    pub orcado: Decimal,
    /// Actual.
    pub realizado: Decimal,
    /// Difference.
    pub dif: Decimal,
}

/// Month with the largest absolute deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalMonth {
    /// Month.
    pub mes: Month,
    /// Deviation (signed).
    pub desvio: Decimal,
}

/// Group ranked by absolute deviation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalGroup {
    /// Group name.
    pub grupo: String,
    /// Deviation (signed).
    pub desvio: Decimal,
}

/// Sums for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    /// Category name.
    pub categoria: String,
    /// Planned.
    pub orcado: Decimal,
    /// Actual.
    pub realizado: Decimal,
    /// Difference.
    pub dif: Decimal,
}

/// Main dashboard payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardData {
    /// Totals.
    pub totais: DashboardTotals,
    /// Twelve months, January first.
    pub dados_mensais: Vec<MonthlyPoint>,
    /// Month with the largest deviation.
    pub mes_critico: Option<CriticalMonth>,
    /// Top groups by deviation.
    pub grupos_criticos: Vec<CriticalGroup>,
    /// Per-category sums.
    pub centros_custo: Vec<CategoryTotals>,
}

/// What a distribution is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    /// By category name.
    Categoria,
    /// By cost center (`master`).
    CentroCusto,
}

impl DistributionKind {
    /// Parses `categoria` or `centro_custo`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "categoria" => Some(Self::Categoria),
            "centro_custo" => Some(Self::CentroCusto),
            _ => None,
        }
    }
}

/// Share of the actual total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSlice {
    /// Category or cost center.
    pub nome: String,
    /// Actual amount.
    pub valor: Decimal,
    /// Percentage of the total.
    pub percentual: Decimal,
}

/// Totals of one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearTotals {
    /// Year.
    pub ano: i32,
    /// Planned.
    pub orcado: Decimal,
    /// Actual.
    pub realizado: Decimal,
    /// Difference.
    pub dif: Decimal,
}

/// Percent variation between two years.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    /// Planned variation.
    pub orcado: Decimal,
    /// Actual variation.
    pub realizado: Decimal,
    /// Difference variation.
    pub dif: Decimal,
}

/// A year against the one before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearComparison {
    /// Selected year.
    pub ano_atual: YearTotals,
    /// Previous year.
    pub ano_anterior: YearTotals,
    /// Percent variations.
    pub variacao: Variation,
}

/// Headline counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpis {
    /// Number of categories.
    pub total_categorias: u64,
    /// Number of entries.
    pub total_orcamentos: u64,
    /// Entries awaiting approval.
    pub aguardando_aprovacao: u64,
    /// Approved entries.
    pub aprovados: u64,
    /// Rejected entries.
    pub reprovados: u64,
    /// Draft entries.
    pub rascunhos: u64,
}

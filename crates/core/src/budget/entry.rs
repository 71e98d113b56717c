//! Budget entry amounts and the twelve-month grid of a category.

use std::ops::RangeInclusive;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::month::Month;
use super::status::BudgetStatus;

/// Years an entry may belong to.
pub const YEARS: RangeInclusive<i32> = 1900..=9999;

/// Returns true if `ano` is inside [`YEARS`].
#[must_use]
pub fn is_valid_year(ano: i32) -> bool {
    YEARS.contains(&ano)
}

/// Difference between actual and planned amounts.
///
/// Positive means the category spent more than planned.
#[must_use]
pub fn compute_dif(orcado: Decimal, realizado: Decimal) -> Decimal {
    realizado - orcado
}

/// Sums of planned, actual and difference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Planned total.
    pub orcado: Decimal,
    /// Actual total.
    pub realizado: Decimal,
    /// Difference total.
    pub dif: Decimal,
}

impl Totals {
    /// Adds one entry's amounts.
    pub fn add(&mut self, orcado: Decimal, realizado: Decimal, dif: Decimal) {
        self.orcado += orcado;
        self.realizado += realizado;
        self.dif += dif;
    }
}

/// One month of a category's year.
///
/// `id_orcamento` is `None` for months that have no stored entry yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyEntry {
    /// Stored entry ID.
    pub id_orcamento: Option<i32>,
    /// Category ID.
    pub id_categoria: i32,
    /// Month.
    pub mes: Month,
    /// Year.
    pub ano: i32,
    /// Planned amount.
    pub orcado: Decimal,
    /// Actual amount.
    pub realizado: Decimal,
    /// `realizado - orcado`.
    pub dif: Decimal,
    /// Workflow status.
    pub status: BudgetStatus,
}

impl MonthlyEntry {
    /// Zeroed draft placeholder for a month without a stored entry.
    #[must_use]
    pub fn placeholder(id_categoria: i32, mes: Month, ano: i32) -> Self {
        Self {
            id_orcamento: None,
            id_categoria,
            mes,
            ano,
            orcado: Decimal::ZERO,
            realizado: Decimal::ZERO,
            dif: Decimal::ZERO,
            status: BudgetStatus::Rascunho,
        }
    }
}

/// All twelve months of one category in one year.
#[derive(Debug, Clone, Serialize)]
pub struct YearGrid {
    /// Category ID.
    pub id_categoria: i32,
    /// Year.
    pub ano: i32,
    /// Exactly twelve entries, January first.
    pub meses: Vec<MonthlyEntry>,
    /// Sums over the twelve months.
    pub totais: Totals,
}

impl YearGrid {
    /// Builds the grid from whatever entries exist, filling the gaps.
    ///
    /// Entries for other categories or years are ignored.
    #[must_use]
    pub fn build(
        id_categoria: i32,
        ano: i32,
        entries: impl IntoIterator<Item = MonthlyEntry>,
    ) -> Self {
        let mut slots: [Option<MonthlyEntry>; 12] = Default::default();
        for entry in entries {
            if entry.id_categoria == id_categoria && entry.ano == ano {
                let index = (entry.mes.number() - 1) as usize;
                slots[index] = Some(entry);
            }
        }

        let meses: Vec<MonthlyEntry> = Month::ALL
            .into_iter()
            .zip(slots)
            .map(|(mes, slot)| {
                slot.unwrap_or_else(|| MonthlyEntry::placeholder(id_categoria, mes, ano))
            })
            .collect();

        let mut totais = Totals::default();
        for m in &meses {
            totais.add(m.orcado, m.realizado, m.dif);
        }

        Self {
            id_categoria,
            ano,
            meses,
            totais,
        }
    }
}

//! Property-based tests for budget module.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::entry::{MonthlyEntry, YearGrid, compute_dif, is_valid_year};
use super::month::Month;
use super::status::BudgetStatus;

/// Strategy for two-decimal money amounts, negative values included.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..1_000_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn month_strategy() -> impl Strategy<Value = Month> {
    (1u32..=12).prop_map(|n| Month::from_number(n).unwrap())
}

proptest! {
    /// dif is always realizado minus orcado.
    #[test]
    fn prop_dif_is_actual_minus_planned(
        orcado in amount_strategy(),
        realizado in amount_strategy(),
    ) {
        let dif = compute_dif(orcado, realizado);
        prop_assert_eq!(dif, realizado - orcado);
        prop_assert_eq!(orcado + dif, realizado);
    }

    /// Every number in 1..=12 maps to a month and back.
    #[test]
    fn prop_month_number_roundtrip(n in 1u32..=12) {
        let month = Month::from_number(n).unwrap();
        prop_assert_eq!(month.number(), n);
        prop_assert_eq!(Month::parse(month.name()), Some(month));
    }

    /// Numbers outside 1..=12 never map to a month.
    #[test]
    fn prop_month_number_out_of_range(n in 13u32..10_000) {
        prop_assert_eq!(Month::from_number(n), None);
    }

    /// The grid always has twelve ordered months and its totals match the cells.
    #[test]
    fn prop_year_grid_is_complete(
        cells in proptest::collection::vec((month_strategy(), amount_strategy(), amount_strategy()), 0..12),
    ) {
        let entries = cells.iter().enumerate().map(|(i, (mes, orcado, realizado))| MonthlyEntry {
            id_orcamento: Some(i32::try_from(i).unwrap() + 1),
            id_categoria: 1,
            mes: *mes,
            ano: 2024,
            orcado: *orcado,
            realizado: *realizado,
            dif: compute_dif(*orcado, *realizado),
            status: BudgetStatus::Rascunho,
        });

        let grid = YearGrid::build(1, 2024, entries);

        prop_assert_eq!(grid.meses.len(), 12);
        for (cell, month) in grid.meses.iter().zip(Month::ALL) {
            prop_assert_eq!(cell.mes, month);
        }
        let orcado: Decimal = grid.meses.iter().map(|m| m.orcado).sum();
        let dif: Decimal = grid.meses.iter().map(|m| m.dif).sum();
        prop_assert_eq!(grid.totais.orcado, orcado);
        prop_assert_eq!(grid.totais.dif, dif);
    }
}

mod unit_tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_year_bounds() {
        assert!(is_valid_year(1900));
        assert!(is_valid_year(2024));
        assert!(is_valid_year(9999));
        assert!(!is_valid_year(1899));
        assert!(!is_valid_year(10_000));
        assert!(!is_valid_year(i32::MAX));
        assert!(!is_valid_year(i32::MIN));
    }

    #[test]
    fn test_grid_fills_missing_months_with_drafts() {
        let stored = MonthlyEntry {
            id_orcamento: Some(10),
            id_categoria: 3,
            mes: Month::Marco,
            ano: 2025,
            orcado: dec!(1000.00),
            realizado: dec!(1250.50),
            dif: dec!(250.50),
            status: BudgetStatus::Aprovado,
        };

        let grid = YearGrid::build(3, 2025, vec![stored.clone()]);

        assert_eq!(grid.meses[2], stored);
        assert_eq!(grid.meses[0].id_orcamento, None);
        assert_eq!(grid.meses[0].status, BudgetStatus::Rascunho);
        assert_eq!(grid.meses[11].orcado, Decimal::ZERO);
        assert_eq!(grid.totais.realizado, dec!(1250.50));
    }

    #[test]
    fn test_grid_ignores_other_years() {
        let other = MonthlyEntry {
            ano: 2024,
            ..MonthlyEntry::placeholder(3, Month::Janeiro, 2024)
        };
        let grid = YearGrid::build(3, 2025, vec![other]);
        assert!(grid.meses.iter().all(|m| m.id_orcamento.is_none()));
    }
}

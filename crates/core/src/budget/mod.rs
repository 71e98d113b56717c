//! Budget entries: months, statuses and amounts.
//!
//! A budget entry is one (category, month, year) cell holding a planned
//! amount (`orcado`), an actual amount (`realizado`) and their difference.

pub mod entry;
pub mod month;
pub mod status;

#[cfg(test)]
mod tests;

pub use entry::{MonthlyEntry, Totals, YEARS, YearGrid, compute_dif, is_valid_year};
pub use month::{Month, MonthInput};
pub use status::BudgetStatus;

//! Dashboard metrics.
//!
//! Pure aggregations over rows of the `resumo_orcamento` view:
//! - totals and execution percentage
//! - monthly series and critical month/groups
//! - distribution by category or cost center
//! - year-over-year comparison and KPI counts

pub mod service;
pub mod types;


pub use service::{CRITICAL_GROUPS, DashboardService, percent, variation};
pub use types::*;

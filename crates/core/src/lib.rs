//! Core business logic for Orcamento.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `auth` - Roles, permissions and password hashing
//! - `budget` - Months, statuses, amounts and the yearly grid
//! - `workflow` - Entry state machine, edit policy and approval history
//! - `dashboard` - Aggregations for the dashboard
//! - `reports` - CSV export and import

pub mod auth;
pub mod budget;
pub mod dashboard;
pub mod reports;
pub mod workflow;

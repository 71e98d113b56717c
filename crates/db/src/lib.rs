//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    Actor, AuditRepository, BatchEditResult, BatchTransitionResult, BudgetEntryRepository,
    CategoryError, CategoryFilter, CategoryFilterOptions, CategoryInput, CategoryRepository,
    CreateUserInput, DashboardFilterOptions, EntryError, EntryFilter, EntryFilterOptions,
    EntryInput, EntryView, ImportResult, KeyCount, LogFilter, LogSearch, LogSummary, LogView,
    NewLog, SummaryFilter, SummaryRepository, TokenBlacklistRepository, UpdateUserInput,
    Upserted, UserActivity, UserError, UserRepository, tables,
};

use std::time::Duration;

use orcamento_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to database"
    );
    Database::connect(options).await
}

//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every mutation writes its audit row in the same transaction.

pub mod audit;
pub mod budget_entry;
pub mod category;
pub mod summary;
pub mod token_blacklist;
pub mod user;

pub use audit::{
    AuditRepository, KeyCount, LogFilter, LogSearch, LogSummary, LogView, NewLog, UserActivity,
    tables,
};
pub use budget_entry::{
    Actor, BatchEditResult, BatchTransitionResult, BudgetEntryRepository, EntryError,
    EntryFilter, EntryFilterOptions, EntryInput, EntryView, Upserted,
};
pub use category::{
    CategoryError, CategoryFilter, CategoryFilterOptions, CategoryInput, CategoryRepository,
    ImportResult,
};
pub use summary::{DashboardFilterOptions, SummaryFilter, SummaryRepository};
pub use token_blacklist::TokenBlacklistRepository;
pub use user::{CreateUserInput, UpdateUserInput, UserError, UserRepository};

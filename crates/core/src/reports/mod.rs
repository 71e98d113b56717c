//! Report file formats.
//!
//! - Audit log export as CSV
//! - Category import from CSV

pub mod codec;
pub mod error;

pub use codec::{
    CategoryImport, CategoryImportRow, LOG_EXPORT_HEADER, LogExportRow, UTF8_BOM, export_logs,
    parse_categories,
};
pub use error::CsvError;

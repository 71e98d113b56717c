//! CSV codec error types.

use orcamento_shared::AppError;
use thiserror::Error;

/// Errors raised while reading or writing CSV files.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Malformed CSV.
    #[error("CSV inválido: {0}")]
    Malformed(#[from] csv::Error),

    /// A required column is missing from the header.
    #[error("Coluna obrigatória ausente: {0}")]
    MissingColumn(&'static str),

    /// The file has no data rows.
    #[error("Arquivo CSV vazio")]
    Empty,

    /// The file is not UTF-8.
    #[error("Arquivo CSV deve estar em UTF-8")]
    Encoding,

    /// Writing the export failed.
    #[error("Falha ao gerar CSV: {0}")]
    Write(String),
}

impl From<CsvError> for AppError {
    fn from(err: CsvError) -> Self {
        match err {
            CsvError::Write(_) => Self::Internal(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}

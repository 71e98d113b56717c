//! Workflow error types for budget entry approval.

use chrono::NaiveDate;
use orcamento_shared::AppError;
use thiserror::Error;

use crate::auth::Role;
use crate::budget::BudgetStatus;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Attempted an invalid status transition.
    #[error("Transição de status inválida: {from} para {to}")]
    InvalidTransition {
        /// The current status.
        from: BudgetStatus,
        /// The attempted target status.
        to: BudgetStatus,
    },

    /// Approving an entry that is already approved.
    #[error("Orçamento já está aprovado")]
    AlreadyApproved,

    /// Role may not perform the requested action.
    #[error("Acesso negado para o papel {role}")]
    NotAuthorized {
        /// The user's role.
        role: Role,
    },

    /// Entry does not exist.
    #[error("Orçamento com ID {0} não encontrado.")]
    EntryNotFound(i32),

    /// Only admins create entries.
    #[error("Apenas administradores podem criar novos orçamentos.")]
    CreateNotAllowed,

    /// Only admins edit entries that are not approved.
    #[error("Apenas administradores podem editar orçamentos com status \"{0}\".")]
    EditNotAllowed(BudgetStatus),

    /// Status of an approved entry changed outside the workflow routes.
    #[error("Status de orçamento \"{0}\" só pode ser alterado pelo fluxo de aprovação")]
    StatusLocked(BudgetStatus),

    /// Planned amount of an approved entry cannot change.
    #[error("Orçamento aprovado não pode ter o valor orçado alterado")]
    PlannedAmountFrozen,

    /// Actual amount of an approved entry changed after the edit window.
    #[error("Prazo para alterar o realizado encerrou em {deadline}")]
    EditWindowClosed {
        /// Last day on which the change was allowed.
        deadline: NaiveDate,
    },
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. } | Self::AlreadyApproved => 400,
            Self::NotAuthorized { .. }
            | Self::CreateNotAllowed
            | Self::EditNotAllowed(_)
            | Self::StatusLocked(_)
            | Self::PlannedAmountFrozen
            | Self::EditWindowClosed { .. } => 403,
            Self::EntryNotFound(_) => 404,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::AlreadyApproved => "already_approved",
            Self::NotAuthorized { .. } => "forbidden",
            Self::EntryNotFound(_) => "not_found",
            Self::CreateNotAllowed => "create_not_allowed",
            Self::EditNotAllowed(_) => "edit_not_allowed",
            Self::StatusLocked(_) => "status_locked",
            Self::PlannedAmountFrozen => "planned_amount_frozen",
            Self::EditWindowClosed { .. } => "edit_window_closed",
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err.status_code() {
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::Validation(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_error() {
        let err = WorkflowError::InvalidTransition {
            from: BudgetStatus::Rascunho,
            to: BudgetStatus::Aprovado,
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "invalid_transition");
        assert!(err.to_string().contains("rascunho"));
        assert!(err.to_string().contains("aprovado"));
    }

    #[test]
    fn test_edit_not_allowed_message() {
        let err = WorkflowError::EditNotAllowed(BudgetStatus::AguardandoAprovacao);
        assert_eq!(err.status_code(), 403);
        assert_eq!(
            err.to_string(),
            "Apenas administradores podem editar orçamentos com status \"aguardando_aprovacao\"."
        );
    }

    #[test]
    fn test_status_locked_is_forbidden() {
        let err = WorkflowError::StatusLocked(BudgetStatus::Aprovado);
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "status_locked");
        assert_eq!(
            err.to_string(),
            "Status de orçamento \"aprovado\" só pode ser alterado pelo fluxo de aprovação"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = WorkflowError::EntryNotFound(42);
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "Orçamento com ID 42 não encontrado.");
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = WorkflowError::PlannedAmountFrozen.into();
        assert_eq!(app.status_code(), 403);

        let app: AppError = WorkflowError::AlreadyApproved.into();
        assert_eq!(app.status_code(), 400);
        assert_eq!(app.message(), "Orçamento já está aprovado");
    }
}

//! Workflow service for budget entry state transitions.

use chrono::Utc;

use crate::auth::Role;
use crate::budget::BudgetStatus;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{BatchOutcome, DEFAULT_REJECTION_REASON, Transition, WorkflowAction};

/// Stateless service for budget entry workflow transitions.
///
/// All methods are associated functions that validate a transition and
/// return the `WorkflowAction` to persist.
pub struct WorkflowService;

impl WorkflowService {
    /// Submit a draft or rejected entry for approval.
    ///
    /// # Errors
    /// `WorkflowError::InvalidTransition` unless the entry is `rascunho` or `reprovado`.
    pub fn submit(
        current_status: BudgetStatus,
        submitted_by: i32,
    ) -> Result<WorkflowAction, WorkflowError> {
        Self::guard(Transition::Submit, current_status)?;
        Ok(WorkflowAction::Submit {
            new_status: BudgetStatus::AguardandoAprovacao,
            submitted_by,
            submitted_at: Utc::now(),
        })
    }

    /// Approve a submitted entry.
    ///
    /// # Errors
    /// `WorkflowError::AlreadyApproved` for approved entries,
    /// `WorkflowError::InvalidTransition` for any other status but `aguardando_aprovacao`.
    pub fn approve(
        current_status: BudgetStatus,
        approved_by: i32,
    ) -> Result<WorkflowAction, WorkflowError> {
        if current_status == BudgetStatus::Aprovado {
            return Err(WorkflowError::AlreadyApproved);
        }
        Self::guard(Transition::Approve, current_status)?;
        Ok(WorkflowAction::Approve {
            new_status: BudgetStatus::Aprovado,
            approved_by,
            approved_at: Utc::now(),
        })
    }

    /// Reject a submitted or approved entry.
    ///
    /// A missing or blank reason is recorded as [`DEFAULT_REJECTION_REASON`].
    ///
    /// # Errors
    /// `WorkflowError::InvalidTransition` for `rascunho` and `reprovado` entries.
    pub fn reject(
        current_status: BudgetStatus,
        rejected_by: i32,
        reason: Option<&str>,
    ) -> Result<WorkflowAction, WorkflowError> {
        Self::guard(Transition::Reject, current_status)?;
        Ok(WorkflowAction::Reject {
            new_status: BudgetStatus::Reprovado,
            rejected_by,
            rejected_at: Utc::now(),
            reason: Self::rejection_reason(reason),
        })
    }

    /// Normalizes a rejection reason.
    #[must_use]
    pub fn rejection_reason(reason: Option<&str>) -> String {
        reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REJECTION_REASON)
            .to_string()
    }

    /// Checks that `role` may perform `transition`.
    ///
    /// # Errors
    /// `WorkflowError::NotAuthorized` otherwise.
    pub fn authorize(role: Role, transition: Transition) -> Result<(), WorkflowError> {
        if transition.permitted_for(role) {
            Ok(())
        } else {
            Err(WorkflowError::NotAuthorized { role })
        }
    }

    /// Decides what a batch operation does with one entry.
    ///
    /// - submit skips entries that are not `rascunho`/`reprovado`
    /// - approve skips entries that are already approved
    /// - everything else that cannot transition is reported
    #[must_use]
    pub fn plan_batch_item(
        transition: Transition,
        id: i32,
        current_status: Option<BudgetStatus>,
    ) -> BatchOutcome {
        let Some(status) = current_status else {
            return BatchOutcome::Error(WorkflowError::EntryNotFound(id).to_string());
        };

        if transition.allowed_from(status) {
            return BatchOutcome::Apply;
        }

        match (transition, status) {
            (Transition::Submit, _) | (Transition::Approve, BudgetStatus::Aprovado) => {
                BatchOutcome::Skip
            }
            _ => BatchOutcome::Error(format!(
                "Orçamento com ID {id} não pode ser {} com status \"{status}\".",
                transition.verb()
            )),
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Rascunho → AguardandoAprovacao
    /// - Reprovado → AguardandoAprovacao
    /// - AguardandoAprovacao → Aprovado
    /// - AguardandoAprovacao → Reprovado
    /// - Aprovado → Reprovado
    #[must_use]
    pub fn is_valid_transition(from: BudgetStatus, to: BudgetStatus) -> bool {
        Transition::ALL
            .into_iter()
            .any(|t| t.target() == to && t.allowed_from(from))
    }

    fn guard(transition: Transition, current_status: BudgetStatus) -> Result<(), WorkflowError> {
        if transition.allowed_from(current_status) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: transition.target(),
            })
        }
    }
}

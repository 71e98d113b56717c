//! Workflow domain types for budget entry approval.

use chrono::{DateTime, Utc};

use crate::auth::Role;
use crate::budget::BudgetStatus;

/// Reason recorded when a rejection carries none.
pub const DEFAULT_REJECTION_REASON: &str = "Sem motivo especificado";

/// A workflow transition that can be requested on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Send a draft or rejected entry for approval.
    Submit,
    /// Approve a submitted entry.
    Approve,
    /// Reject a submitted or approved entry.
    Reject,
}

impl Transition {
    /// All transitions.
    pub const ALL: [Self; 3] = [Self::Submit, Self::Approve, Self::Reject];

    /// Status an entry ends up in after this transition.
    #[must_use]
    pub const fn target(self) -> BudgetStatus {
        match self {
            Self::Submit => BudgetStatus::AguardandoAprovacao,
            Self::Approve => BudgetStatus::Aprovado,
            Self::Reject => BudgetStatus::Reprovado,
        }
    }

    /// Returns true if the transition may start from `status`.
    #[must_use]
    pub const fn allowed_from(self, status: BudgetStatus) -> bool {
        match self {
            Self::Submit => status.is_submittable(),
            Self::Approve => matches!(status, BudgetStatus::AguardandoAprovacao),
            Self::Reject => matches!(
                status,
                BudgetStatus::AguardandoAprovacao | BudgetStatus::Aprovado
            ),
        }
    }

    /// Returns true if `role` may perform this transition.
    #[must_use]
    pub const fn permitted_for(self, role: Role) -> bool {
        match self {
            Self::Submit => role.can_submit(),
            Self::Approve => role.can_approve(),
            Self::Reject => role.can_reject(),
        }
    }

    /// Verb used in messages.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Submit => "submetido",
            Self::Approve => "aprovado",
            Self::Reject => "reprovado",
        }
    }
}

/// Workflow action representing a state transition with audit data.
#[derive(Debug, Clone)]
pub enum WorkflowAction {
    /// Entry sent for approval.
    Submit {
        /// The new status after submission.
        new_status: BudgetStatus,
        /// The user who submitted the entry.
        submitted_by: i32,
        /// When the entry was submitted.
        submitted_at: DateTime<Utc>,
    },
    /// Entry approved.
    Approve {
        /// The new status after approval.
        new_status: BudgetStatus,
        /// The user who approved the entry.
        approved_by: i32,
        /// When the entry was approved.
        approved_at: DateTime<Utc>,
    },
    /// Entry rejected. Approval data is cleared.
    Reject {
        /// The new status after rejection.
        new_status: BudgetStatus,
        /// The user who rejected the entry.
        rejected_by: i32,
        /// When the entry was rejected.
        rejected_at: DateTime<Utc>,
        /// The reason for rejection.
        reason: String,
    },
}

impl WorkflowAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> BudgetStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. } => *new_status,
        }
    }

    /// Approver and approval time to store, cleared unless this is an approval.
    #[must_use]
    pub fn approval(&self) -> Option<(i32, DateTime<Utc>)> {
        match self {
            Self::Approve {
                approved_by,
                approved_at,
                ..
            } => Some((*approved_by, *approved_at)),
            _ => None,
        }
    }

    /// User who performed the action.
    #[must_use]
    pub fn actor(&self) -> i32 {
        match self {
            Self::Submit { submitted_by, .. } => *submitted_by,
            Self::Approve { approved_by, .. } => *approved_by,
            Self::Reject { rejected_by, .. } => *rejected_by,
        }
    }
}

/// What a batch operation should do with one requested entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Apply the transition.
    Apply,
    /// Leave the entry alone without reporting an error.
    Skip,
    /// Report this message and leave the entry alone.
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_targets() {
        assert_eq!(
            Transition::Submit.target(),
            BudgetStatus::AguardandoAprovacao
        );
        assert_eq!(Transition::Approve.target(), BudgetStatus::Aprovado);
        assert_eq!(Transition::Reject.target(), BudgetStatus::Reprovado);
    }

    #[test]
    fn test_transition_roles() {
        assert!(Transition::Submit.permitted_for(Role::Admin));
        assert!(!Transition::Submit.permitted_for(Role::Gestor));
        assert!(Transition::Approve.permitted_for(Role::Gestor));
        assert!(!Transition::Approve.permitted_for(Role::Admin));
        assert!(Transition::Reject.permitted_for(Role::Admin));
        assert!(Transition::Reject.permitted_for(Role::Gestor));
        for t in Transition::ALL {
            assert!(!t.permitted_for(Role::Visualizador));
        }
    }

    #[test]
    fn test_approval_data_only_on_approve() {
        let now = Utc::now();
        let approve = WorkflowAction::Approve {
            new_status: BudgetStatus::Aprovado,
            approved_by: 2,
            approved_at: now,
        };
        let reject = WorkflowAction::Reject {
            new_status: BudgetStatus::Reprovado,
            rejected_by: 2,
            rejected_at: now,
            reason: DEFAULT_REJECTION_REASON.to_string(),
        };
        assert_eq!(approve.approval(), Some((2, now)));
        assert_eq!(reject.approval(), None);
        assert_eq!(reject.actor(), 2);
    }
}

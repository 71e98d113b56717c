//! Approval status of a budget entry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a budget entry in the approval workflow.
///
/// The valid transitions are:
/// - Rascunho → AguardandoAprovacao (submit)
/// - Reprovado → AguardandoAprovacao (resubmit)
/// - AguardandoAprovacao → Aprovado (approve)
/// - AguardandoAprovacao → Reprovado (reject)
/// - Aprovado → Reprovado (reject)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Being drafted by an admin.
    Rascunho,
    /// Submitted and waiting for a gestor.
    AguardandoAprovacao,
    /// Approved by a gestor. Planned amount is frozen.
    Aprovado,
    /// Rejected. Can be edited and resubmitted.
    Reprovado,
}

impl BudgetStatus {
    /// All statuses.
    pub const ALL: [Self; 4] = [
        Self::Rascunho,
        Self::AguardandoAprovacao,
        Self::Aprovado,
        Self::Reprovado,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rascunho => "rascunho",
            Self::AguardandoAprovacao => "aguardando_aprovacao",
            Self::Aprovado => "aprovado",
            Self::Reprovado => "reprovado",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rascunho" => Some(Self::Rascunho),
            "aguardando_aprovacao" => Some(Self::AguardandoAprovacao),
            "aprovado" => Some(Self::Aprovado),
            "reprovado" => Some(Self::Reprovado),
            _ => None,
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rascunho => "Rascunho",
            Self::AguardandoAprovacao => "Aguardando aprovação",
            Self::Aprovado => "Aprovado",
            Self::Reprovado => "Reprovado",
        }
    }

    /// Returns true if the entry can be submitted from this status.
    #[must_use]
    pub const fn is_submittable(self) -> bool {
        matches!(self, Self::Rascunho | Self::Reprovado)
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in BudgetStatus::ALL {
            assert_eq!(BudgetStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BudgetStatus::parse("pendente"), None);
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&BudgetStatus::AguardandoAprovacao).unwrap(),
            "\"aguardando_aprovacao\""
        );
    }

    #[test]
    fn test_submittable() {
        assert!(BudgetStatus::Rascunho.is_submittable());
        assert!(BudgetStatus::Reprovado.is_submittable());
        assert!(!BudgetStatus::AguardandoAprovacao.is_submittable());
        assert!(!BudgetStatus::Aprovado.is_submittable());
    }
}

//! Edit policy for budget entry amounts.
//!
//! Status changes go through the workflow operations. The only status change
//! an upsert may carry is an admin submitting a draft or rejected entry.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::auth::Role;
use crate::budget::{BudgetStatus, Month, compute_dif};
use crate::workflow::error::WorkflowError;
use crate::workflow::window::EditWindow;

/// How a refused change to an approved entry is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// Single upsert: refusals are errors.
    Single,
    /// Batch edit: changes to frozen fields of approved entries are dropped.
    Batch,
}

/// Requested values. `None` keeps the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditRequest {
    /// New planned amount.
    pub orcado: Option<Decimal>,
    /// New actual amount.
    pub realizado: Option<Decimal>,
    /// Requested status.
    pub status: Option<BudgetStatus>,
}

/// Stored state of the entry being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySnapshot {
    /// Current status.
    pub status: BudgetStatus,
    /// Current planned amount.
    pub orcado: Decimal,
    /// Current actual amount.
    pub realizado: Decimal,
    /// Entry month.
    pub mes: Month,
    /// Entry year.
    pub ano: i32,
}

/// Values to store after an accepted edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDecision {
    /// Planned amount to store.
    pub orcado: Decimal,
    /// Actual amount to store.
    pub realizado: Decimal,
    /// `realizado - orcado`.
    pub dif: Decimal,
    /// Status to store.
    pub status: BudgetStatus,
    /// False when nothing differs from the stored entry.
    pub changed: bool,
}

impl EditDecision {
    fn new(orcado: Decimal, realizado: Decimal, status: BudgetStatus, changed: bool) -> Self {
        Self {
            orcado,
            realizado,
            dif: compute_dif(orcado, realizado),
            status,
            changed,
        }
    }

    fn unchanged(entry: &EntrySnapshot) -> Self {
        Self::new(entry.orcado, entry.realizado, entry.status, false)
    }
}

/// Decides whether a role may create or change an entry.
#[derive(Debug, Clone, Default)]
pub struct EditPolicy {
    window: EditWindow,
}

impl EditPolicy {
    /// Creates a policy using `window` for approved entries.
    #[must_use]
    pub const fn new(window: EditWindow) -> Self {
        Self { window }
    }

    /// The edit window used for approved entries.
    #[must_use]
    pub const fn window(&self) -> &EditWindow {
        &self.window
    }

    /// Checks the creation of a new entry.
    ///
    /// # Errors
    /// `CreateNotAllowed` unless `role` is admin, `InvalidTransition` when
    /// the requested status is neither `rascunho` nor `aguardando_aprovacao`.
    pub fn check_create(&self, role: Role, req: &EditRequest) -> Result<EditDecision, WorkflowError> {
        if !role.can_create_entries() {
            return Err(WorkflowError::CreateNotAllowed);
        }

        let status = Self::requested_status(role, BudgetStatus::Rascunho, req.status)?;
        Ok(EditDecision::new(
            req.orcado.unwrap_or_default(),
            req.realizado.unwrap_or_default(),
            status,
            true,
        ))
    }

    /// Checks a change to a stored entry.
    ///
    /// Edits that change nothing are always accepted.
    ///
    /// # Errors
    /// - `EditNotAllowed` when `role` may not edit an entry in this status
    /// - `PlannedAmountFrozen` when a single upsert changes `orcado` of an approved entry
    /// - `EditWindowClosed` when `realizado` of an approved entry changes after the deadline
    /// - `StatusLocked` when a single upsert changes the status of an approved entry
    /// - `InvalidTransition` for any other status change but an admin submit
    pub fn check_update(
        &self,
        role: Role,
        entry: &EntrySnapshot,
        req: &EditRequest,
        mode: EditMode,
        today: NaiveDate,
    ) -> Result<EditDecision, WorkflowError> {
        let new_orcado = req.orcado.filter(|v| *v != entry.orcado);
        let new_realizado = req.realizado.filter(|v| *v != entry.realizado);
        let new_status = req.status.filter(|s| *s != entry.status);

        if new_orcado.is_none() && new_realizado.is_none() && new_status.is_none() {
            return Ok(EditDecision::unchanged(entry));
        }

        if entry.status == BudgetStatus::Aprovado {
            return self.check_approved(role, entry, new_orcado, new_realizado, new_status, mode, today);
        }

        if !role.can_edit_planned() {
            return Err(WorkflowError::EditNotAllowed(entry.status));
        }

        let status = Self::requested_status(role, entry.status, req.status)?;
        Ok(EditDecision::new(
            new_orcado.unwrap_or(entry.orcado),
            new_realizado.unwrap_or(entry.realizado),
            status,
            true,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn check_approved(
        &self,
        role: Role,
        entry: &EntrySnapshot,
        new_orcado: Option<Decimal>,
        new_realizado: Option<Decimal>,
        new_status: Option<BudgetStatus>,
        mode: EditMode,
        today: NaiveDate,
    ) -> Result<EditDecision, WorkflowError> {
        if !role.can_batch_edit() {
            return Err(WorkflowError::EditNotAllowed(entry.status));
        }

        if mode == EditMode::Single {
            if new_status.is_some() {
                return Err(WorkflowError::StatusLocked(entry.status));
            }
            if new_orcado.is_some() {
                return Err(WorkflowError::PlannedAmountFrozen);
            }
        }

        let Some(realizado) = new_realizado else {
            return Ok(EditDecision::unchanged(entry));
        };

        if !self.window.allows(entry.mes, entry.ano, today) {
            let deadline = self
                .window
                .deadline(entry.mes, entry.ano)
                .unwrap_or(today);
            return Err(WorkflowError::EditWindowClosed { deadline });
        }

        Ok(EditDecision::new(entry.orcado, realizado, entry.status, true))
    }

    fn requested_status(
        role: Role,
        current: BudgetStatus,
        requested: Option<BudgetStatus>,
    ) -> Result<BudgetStatus, WorkflowError> {
        match requested {
            None => Ok(current),
            Some(to) if to == current => Ok(current),
            Some(BudgetStatus::AguardandoAprovacao) if current.is_submittable() && role.can_submit() => {
                Ok(BudgetStatus::AguardandoAprovacao)
            }
            Some(to) => Err(WorkflowError::InvalidTransition { from: current, to }),
        }
    }
}

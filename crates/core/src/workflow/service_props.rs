//! Property-based tests for WorkflowService.

use proptest::prelude::*;

use crate::budget::BudgetStatus;
use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{BatchOutcome, Transition, WorkflowAction};

fn arb_status() -> impl Strategy<Value = BudgetStatus> {
    prop_oneof![
        Just(BudgetStatus::Rascunho),
        Just(BudgetStatus::AguardandoAprovacao),
        Just(BudgetStatus::Aprovado),
        Just(BudgetStatus::Reprovado),
    ]
}

fn arb_transition() -> impl Strategy<Value = Transition> {
    prop_oneof![
        Just(Transition::Submit),
        Just(Transition::Approve),
        Just(Transition::Reject),
    ]
}

fn apply(
    transition: Transition,
    status: BudgetStatus,
    user_id: i32,
) -> Result<WorkflowAction, WorkflowError> {
    match transition {
        Transition::Submit => WorkflowService::submit(status, user_id),
        Transition::Approve => WorkflowService::approve(status, user_id),
        Transition::Reject => WorkflowService::reject(status, user_id, None),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A transition succeeds exactly when the table allows it, and lands on its target.
    #[test]
    fn prop_transitions_follow_table(
        status in arb_status(),
        transition in arb_transition(),
        user_id in 1i32..10_000,
    ) {
        let result = apply(transition, status, user_id);

        if transition.allowed_from(status) {
            let action = result.unwrap();
            prop_assert_eq!(action.new_status(), transition.target());
            prop_assert_eq!(action.actor(), user_id);
            prop_assert!(WorkflowService::is_valid_transition(status, action.new_status()));
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// Only approval stores approver data.
    #[test]
    fn prop_only_approve_sets_approval(
        status in arb_status(),
        transition in arb_transition(),
    ) {
        if let Ok(action) = apply(transition, status, 1) {
            prop_assert_eq!(action.approval().is_some(), transition == Transition::Approve);
        }
    }

    /// Batch planning never applies a transition the single operation would refuse.
    #[test]
    fn prop_batch_plan_agrees_with_single(
        status in proptest::option::of(arb_status()),
        transition in arb_transition(),
        id in 1i32..10_000,
    ) {
        let outcome = WorkflowService::plan_batch_item(transition, id, status);
        match status {
            None => prop_assert!(matches!(outcome, BatchOutcome::Error(_))),
            Some(s) => {
                let single_ok = apply(transition, s, 1).is_ok();
                prop_assert_eq!(outcome == BatchOutcome::Apply, single_ok);
            }
        }
    }

    /// Rejection reasons are never blank.
    #[test]
    fn prop_rejection_reason_never_blank(reason in proptest::option::of("[ a-z]{0,20}")) {
        let normalized = WorkflowService::rejection_reason(reason.as_deref());
        prop_assert!(!normalized.trim().is_empty());
    }
}

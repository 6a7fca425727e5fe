//! Property-based tests for the approval state machine.
//!
//! These tests validate the structural invariants of the request state
//! machine: quorum counting never double-counts, a single veto always
//! terminates, and terminal requests never change again.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use serde_json::json;

use sentra_shared::{AccountId, TransactionId, UserId, WorkflowId};

use crate::condition::{Condition, Operator};
use crate::workflow::error::WorkflowError;
use crate::workflow::machine::{ApprovalMachine, DecisionOutcome};
use crate::workflow::types::{
    ApprovalStep, RequestStatus, Trigger, Workflow, WorkflowStatus,
};

/// Build a single-trigger workflow from (quorum, timeout) step shapes.
fn workflow_with_steps(shapes: &[(u32, i64)]) -> Workflow {
    let now = Utc::now();
    let steps = shapes
        .iter()
        .enumerate()
        .map(|(idx, &(required_approvals, timeout_hours))| ApprovalStep {
            step_number: u32::try_from(idx).unwrap() + 1,
            approver_roles: vec!["approver".to_string()],
            approver_users: vec![],
            required_approvals,
            timeout_hours,
            escalate_on_timeout: false,
            escalate_to: None,
        })
        .collect();
    Workflow {
        id: WorkflowId::new(),
        account_id: AccountId::new(),
        name: "generated".to_string(),
        description: None,
        steps,
        trigger_conditions: vec![Trigger {
            kind: "amount".to_string(),
            conditions: vec![Condition::new("amount", Operator::GreaterThan, json!(0))],
        }],
        status: WorkflowStatus::Active,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Strategy for step shapes: 1-4 steps, quorum 1-3, timeout 1-48h.
fn arb_step_shapes() -> impl Strategy<Value = Vec<(u32, i64)>> {
    proptest::collection::vec((1u32..=3, 1i64..=48), 1..=4)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Approving with enough distinct approvers always terminates in
    /// `Approved`, with every intermediate state pending and the current
    /// step always an existing step.
    #[test]
    fn prop_distinct_quorum_reaches_approval(shapes in arb_step_shapes()) {
        let workflow = workflow_with_steps(&shapes);
        let now = Utc::now();
        let mut request = ApprovalMachine::create_request(
            &workflow,
            TransactionId::new(),
            UserId::new(),
            now,
        ).unwrap();

        let mut tick = now;
        while request.status == RequestStatus::Pending {
            prop_assert!(workflow.step(request.current_step).is_some());
            tick += Duration::minutes(1);
            let outcome = ApprovalMachine::approve(
                &mut request,
                &workflow,
                UserId::new(),
                "approver",
                None,
                None,
                tick,
            );
            prop_assert!(outcome.is_ok(), "unexpected failure: {:?}", outcome);
        }
        prop_assert_eq!(request.status, RequestStatus::Approved);
        prop_assert!(request.completed_at.is_some());

        let total_required: u32 = shapes.iter().map(|&(q, _)| q).sum();
        prop_assert_eq!(request.approvals.len(), total_required as usize);
    }

    /// The same approver never counts twice toward the same step's quorum.
    #[test]
    fn prop_duplicate_approver_never_double_counts(
        quorum in 2u32..=3,
        attempts in 2usize..6
    ) {
        let workflow = workflow_with_steps(&[(quorum, 24)]);
        let now = Utc::now();
        let mut request = ApprovalMachine::create_request(
            &workflow,
            TransactionId::new(),
            UserId::new(),
            now,
        ).unwrap();

        let approver = UserId::new();
        let mut recorded = 0u32;
        for _ in 0..attempts {
            match ApprovalMachine::approve(
                &mut request,
                &workflow,
                approver,
                "approver",
                None,
                None,
                now,
            ) {
                Ok(_) => recorded += 1,
                Err(WorkflowError::AlreadyDecided { .. }) => {}
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }
        prop_assert_eq!(recorded, 1);
        prop_assert_eq!(request.approvals_for_step(1), 1);
        prop_assert_eq!(request.status, RequestStatus::Pending);
    }

    /// A single authorized rejection terminates the request no matter how
    /// many approvals were recorded before it.
    #[test]
    fn prop_single_veto_terminates(
        shapes in arb_step_shapes(),
        approvals_before_veto in 0usize..6
    ) {
        let workflow = workflow_with_steps(&shapes);
        let now = Utc::now();
        let mut request = ApprovalMachine::create_request(
            &workflow,
            TransactionId::new(),
            UserId::new(),
            now,
        ).unwrap();

        for _ in 0..approvals_before_veto {
            if request.status != RequestStatus::Pending {
                break;
            }
            let _ = ApprovalMachine::approve(
                &mut request,
                &workflow,
                UserId::new(),
                "approver",
                None,
                None,
                now,
            );
        }

        if request.status == RequestStatus::Pending {
            ApprovalMachine::reject(
                &mut request,
                &workflow,
                UserId::new(),
                "approver",
                "vetoed".to_string(),
                now,
            ).unwrap();
            prop_assert_eq!(request.status, RequestStatus::Rejected);
        }

        // Whatever happened, the request is terminal and immutable now, or
        // still pending with a live deadline.
        if request.status.is_terminal() {
            let before = request.clone();
            let result = ApprovalMachine::approve(
                &mut request,
                &workflow,
                UserId::new(),
                "approver",
                None,
                None,
                now,
            );
            prop_assert!(
                matches!(result, Err(WorkflowError::RequestNotPending { .. })),
                "expected RequestNotPending, got {result:?}"
            );
            prop_assert_eq!(request.approvals.len(), before.approvals.len());
            prop_assert_eq!(request.status, before.status);
        }
    }

    /// Advancing to the next step always resets the deadline from the
    /// advancement time, using the next step's window.
    #[test]
    fn prop_advancement_resets_deadline(
        first_timeout in 1i64..=24,
        second_timeout in 1i64..=24,
        delay_minutes in 0i64..=59
    ) {
        let workflow = workflow_with_steps(&[(1, first_timeout), (1, second_timeout)]);
        let now = Utc::now();
        let mut request = ApprovalMachine::create_request(
            &workflow,
            TransactionId::new(),
            UserId::new(),
            now,
        ).unwrap();

        let decision_time = now + Duration::minutes(delay_minutes);
        let outcome = ApprovalMachine::approve(
            &mut request,
            &workflow,
            UserId::new(),
            "approver",
            None,
            None,
            decision_time,
        ).unwrap();

        prop_assert_eq!(outcome, DecisionOutcome::Advanced {
            completed_step: 1,
            next_step: 2,
            expires_at: decision_time + Duration::hours(second_timeout),
        });
        prop_assert_eq!(request.expires_at, decision_time + Duration::hours(second_timeout));
    }
}

//! Approval request state machine.
//!
//! This module implements the transition logic for one approval request:
//! step advancement on quorum, single-veto rejection, cancellation,
//! decision-time expiry, and the per-request escalation decision used by
//! the sweep.
//!
//! All functions are associated functions that validate and execute a
//! transition against a `(request, workflow, now)` snapshot, mutating the
//! request in place and returning an outcome value with audit data. The
//! caller owns persistence and must serialize concurrent transitions on
//! the same request.

use chrono::{DateTime, Utc};

use sentra_shared::{TransactionId, UserId};

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{
    ApprovalDecision, ApprovalRequest, Decision, RequestStatus, Workflow, WorkflowStatus,
};

/// Result of recording an approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Quorum not yet reached; the request stays on the same step.
    Recorded {
        /// The step the approval counts toward.
        step_number: u32,
        /// Approvals recorded for the step so far.
        approvals: u32,
        /// Approvals required to complete the step.
        required: u32,
    },
    /// Quorum reached on an intermediate step; the request advanced.
    Advanced {
        /// The step that just completed.
        completed_step: u32,
        /// The new current step.
        next_step: u32,
        /// Fresh deadline for the new step.
        expires_at: DateTime<Utc>,
    },
    /// Quorum reached on the final step; the request is approved.
    Completed {
        /// When the request completed.
        completed_at: DateTime<Utc>,
    },
}

/// Result of the per-request escalation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// The deadline passed and no escalation applies; the request expired.
    Expired,
    /// The deadline passed with escalation enabled and a next step exists;
    /// the request advanced with a fresh deadline window.
    Advanced {
        /// The step whose deadline was missed.
        from_step: u32,
        /// The new current step.
        to_step: u32,
        /// Fresh deadline computed from the sweep time.
        expires_at: DateTime<Utc>,
        /// Roles notified of the escalation (the new step's approvers).
        notified_roles: Vec<String>,
    },
    /// The final step timed out with an escalation target; the step does
    /// not change, the deadline restarts, and the target is notified.
    Renotified {
        /// The step that keeps collecting approvals.
        step_number: u32,
        /// The role notified of the overdue request.
        escalate_to: String,
        /// Restarted deadline.
        expires_at: DateTime<Utc>,
    },
}

/// Stateless service executing approval request transitions.
pub struct ApprovalMachine;

impl ApprovalMachine {
    /// Validate a workflow for activation.
    ///
    /// Activation requires at least one step and one trigger, strictly
    /// ascending unique step numbers, and per-step quorum/timeout sanity.
    pub fn validate_for_activation(workflow: &Workflow) -> Result<(), WorkflowError> {
        if workflow.status == WorkflowStatus::Archived {
            return Err(WorkflowError::WorkflowArchived(workflow.id));
        }
        if workflow.steps.is_empty() {
            return Err(WorkflowError::NoSteps(workflow.id));
        }
        if workflow.trigger_conditions.is_empty() {
            return Err(WorkflowError::NoTriggers(workflow.id));
        }
        for pair in workflow.steps.windows(2) {
            if pair[1].step_number <= pair[0].step_number {
                return Err(WorkflowError::DuplicateStepNumber {
                    workflow_id: workflow.id,
                    step_number: pair[1].step_number,
                });
            }
        }
        for step in &workflow.steps {
            if step.required_approvals < 1 {
                return Err(WorkflowError::InvalidQuorum {
                    step_number: step.step_number,
                });
            }
            if step.timeout_hours < 1 {
                return Err(WorkflowError::InvalidTimeout {
                    step_number: step.step_number,
                });
            }
        }
        Ok(())
    }

    /// Create a request against an active workflow.
    ///
    /// The request starts on the workflow's first step with a deadline of
    /// `now` plus that step's timeout window.
    pub fn create_request(
        workflow: &Workflow,
        transaction_id: TransactionId,
        requested_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRequest, WorkflowError> {
        if workflow.status != WorkflowStatus::Active {
            return Err(WorkflowError::WorkflowNotActive {
                workflow_id: workflow.id,
                status: workflow.status,
            });
        }
        let first = workflow.first_step().ok_or(WorkflowError::NoSteps(workflow.id))?;

        Ok(ApprovalRequest {
            id: sentra_shared::RequestId::new(),
            workflow_id: workflow.id,
            account_id: workflow.account_id,
            transaction_id,
            requested_by,
            current_step: first.step_number,
            status: RequestStatus::Pending,
            approvals: Vec::new(),
            expires_at: now + first.timeout(),
            completed_at: None,
            metadata: serde_json::Map::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Record an approval on the request's current step.
    ///
    /// On quorum the request advances to the next step (fresh deadline) or
    /// completes as approved if the current step is the last one.
    ///
    /// A decision attempted after the deadline transitions the request to
    /// `expired` in place and surfaces `RequestExpired`; the caller must
    /// persist the mutated request even on that error.
    pub fn approve(
        request: &mut ApprovalRequest,
        workflow: &Workflow,
        approver_id: UserId,
        approver_role: &str,
        comments: Option<String>,
        signature: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, WorkflowError> {
        let step_number = Self::guard_decision(request, workflow, approver_id, approver_role, now)?;
        let step = workflow
            .step(step_number)
            .ok_or(WorkflowError::StepNotFound {
                workflow_id: workflow.id,
                step_number,
            })?;

        request.approvals.push(ApprovalDecision {
            step_number,
            approver_id,
            approver_role: approver_role.to_string(),
            decision: Decision::Approved,
            timestamp: now,
            comments,
            signature,
        });
        request.updated_at = now;

        let approvals = request.approvals_for_step(step_number);
        if approvals < step.required_approvals {
            return Ok(DecisionOutcome::Recorded {
                step_number,
                approvals,
                required: step.required_approvals,
            });
        }

        if let Some(next) = workflow.next_step_after(step_number) {
            request.current_step = next.step_number;
            request.expires_at = now + next.timeout();
            Ok(DecisionOutcome::Advanced {
                completed_step: step_number,
                next_step: next.step_number,
                expires_at: request.expires_at,
            })
        } else {
            request.status = RequestStatus::Approved;
            request.completed_at = Some(now);
            Ok(DecisionOutcome::Completed { completed_at: now })
        }
    }

    /// Record a rejection.
    ///
    /// A single authorized rejection vetoes the entire request regardless
    /// of step or quorum; it does not merely fail the current step.
    pub fn reject(
        request: &mut ApprovalRequest,
        workflow: &Workflow,
        approver_id: UserId,
        approver_role: &str,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::RejectionReasonRequired);
        }
        let step_number = Self::guard_decision(request, workflow, approver_id, approver_role, now)?;

        request.approvals.push(ApprovalDecision {
            step_number,
            approver_id,
            approver_role: approver_role.to_string(),
            decision: Decision::Rejected,
            timestamp: now,
            comments: Some(reason),
            signature: None,
        });
        request.status = RequestStatus::Rejected;
        request.completed_at = Some(now);
        request.updated_at = now;
        Ok(())
    }

    /// Cancel a pending request.
    pub fn cancel(
        request: &mut ApprovalRequest,
        cancelled_by: UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        Self::guard_pending(request)?;

        request.status = RequestStatus::Cancelled;
        request.completed_at = Some(now);
        request.updated_at = now;
        request.metadata.insert(
            "cancelledBy".to_string(),
            serde_json::Value::String(cancelled_by.to_string()),
        );
        if let Some(reason) = reason {
            request
                .metadata
                .insert("cancellationReason".to_string(), serde_json::Value::String(reason));
        }
        Ok(())
    }

    /// Decide what the escalation sweep should do with a request.
    ///
    /// Returns `None` when no action is due (not pending, or deadline not
    /// yet passed), which is what makes the sweep idempotent. Otherwise
    /// the request is mutated per the outcome:
    /// - no escalation on the timed-out step: the request expires;
    /// - a next step exists: advance with a fresh deadline computed from
    ///   `now` (the missed window is not inherited);
    /// - final step with an `escalate_to` target: keep the step, restart
    ///   the deadline window, and report the notification target;
    /// - otherwise: expire.
    pub fn escalate(
        request: &mut ApprovalRequest,
        workflow: &Workflow,
        now: DateTime<Utc>,
    ) -> Option<EscalationOutcome> {
        if request.status != RequestStatus::Pending || now <= request.expires_at {
            return None;
        }

        let Some(step) = workflow.step(request.current_step) else {
            // Dangling step reference; nothing left to escalate into.
            Self::expire(request, now);
            return Some(EscalationOutcome::Expired);
        };

        if !step.escalate_on_timeout {
            Self::expire(request, now);
            return Some(EscalationOutcome::Expired);
        }

        if let Some(next) = workflow.next_step_after(request.current_step) {
            let from_step = request.current_step;
            request.current_step = next.step_number;
            request.expires_at = now + next.timeout();
            request.updated_at = now;
            return Some(EscalationOutcome::Advanced {
                from_step,
                to_step: next.step_number,
                expires_at: request.expires_at,
                notified_roles: next.approver_roles.clone(),
            });
        }

        if let Some(target) = &step.escalate_to {
            request.expires_at = now + step.timeout();
            request.updated_at = now;
            return Some(EscalationOutcome::Renotified {
                step_number: request.current_step,
                escalate_to: target.clone(),
                expires_at: request.expires_at,
            });
        }

        Self::expire(request, now);
        Some(EscalationOutcome::Expired)
    }

    /// Common guards for approve/reject: pending status, live deadline,
    /// step authorization, no duplicate decision. Returns the current step
    /// number on success. Expiry mutates the request (see [`Self::approve`]).
    fn guard_decision(
        request: &mut ApprovalRequest,
        workflow: &Workflow,
        approver_id: UserId,
        approver_role: &str,
        now: DateTime<Utc>,
    ) -> Result<u32, WorkflowError> {
        debug_assert_eq!(request.workflow_id, workflow.id);
        Self::guard_pending(request)?;

        if now > request.expires_at {
            Self::expire(request, now);
            return Err(WorkflowError::RequestExpired(request.id));
        }

        let step_number = request.current_step;
        let step = workflow
            .step(step_number)
            .ok_or(WorkflowError::StepNotFound {
                workflow_id: workflow.id,
                step_number,
            })?;

        if !step.authorizes(approver_id, approver_role) {
            return Err(WorkflowError::Unauthorized {
                approver_id,
                approver_role: approver_role.to_string(),
                step_number,
            });
        }
        if request.has_decision_from(step_number, approver_id) {
            return Err(WorkflowError::AlreadyDecided {
                approver_id,
                step_number,
            });
        }
        Ok(step_number)
    }

    fn guard_pending(request: &ApprovalRequest) -> Result<(), WorkflowError> {
        if request.status != RequestStatus::Pending {
            return Err(WorkflowError::RequestNotPending {
                request_id: request.id,
                status: request.status,
            });
        }
        Ok(())
    }

    fn expire(request: &mut ApprovalRequest, now: DateTime<Utc>) {
        request.status = RequestStatus::Expired;
        request.completed_at = Some(now);
        request.updated_at = now;
    }
}

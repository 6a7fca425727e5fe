//! Workflow domain types for approval policy management.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use sentra_shared::{AccountId, RequestId, TransactionId, UserId, WorkflowId};

use crate::condition::Condition;

/// Workflow lifecycle status.
///
/// Workflows are created as drafts and only gate transactions while
/// active. Archiving is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    /// Workflow is being authored and can be freely edited.
    Draft,
    /// Workflow matches triggers and accepts new requests.
    Active,
    /// Workflow is temporarily out of service; no matching, no new requests.
    Paused,
    /// Workflow is retired (immutable).
    Archived,
}

impl WorkflowStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Archived => "archived",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Approval request lifecycle status.
///
/// `Pending` is the only live state; every other status is terminal
/// and the request becomes immutable on entering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting decisions on the current step.
    Pending,
    /// Quorum reached on the final step.
    Approved,
    /// Vetoed by a single authorized rejection.
    Rejected,
    /// Deadline passed without escalation.
    Expired,
    /// Withdrawn by the requester or an operator.
    Cancelled,
}

impl RequestStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "expired" => Some(Self::Expired),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the status is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single recorded decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// The approver signed off on the step.
    Approved,
    /// The approver vetoed the request.
    Rejected,
}

/// A trigger: a named group of conjunctive conditions.
///
/// A workflow matches a transaction if any one of its triggers matches;
/// a trigger matches if all of its conditions pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger classification (free-form, e.g. `amount`, `destination`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Conjunctive condition group.
    pub conditions: Vec<Condition>,
}

/// One step of a multi-step approval chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// Position in the chain; steps are sorted ascending and unique.
    pub step_number: u32,
    /// Roles whose members may decide this step.
    pub approver_roles: Vec<String>,
    /// Individually named approvers, in addition to the roles.
    #[serde(default)]
    pub approver_users: Vec<UserId>,
    /// Distinct approvals required before the step completes.
    pub required_approvals: u32,
    /// Deadline window for this step, applied when the step becomes current.
    pub timeout_hours: i64,
    /// Whether a missed deadline escalates instead of expiring the request.
    pub escalate_on_timeout: bool,
    /// Role notified when the final step times out with escalation enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalate_to: Option<String>,
}

impl ApprovalStep {
    /// Returns true if the given approver may decide this step.
    #[must_use]
    pub fn authorizes(&self, approver_id: UserId, approver_role: &str) -> bool {
        self.approver_roles.iter().any(|role| role == approver_role)
            || self.approver_users.contains(&approver_id)
    }

    /// The step's deadline window as a duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::hours(self.timeout_hours)
    }
}

/// A named approval policy: ordered steps plus trigger conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique identifier.
    pub id: WorkflowId,
    /// Owning account.
    pub account_id: AccountId,
    /// Human-readable name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Approval chain, sorted ascending by `step_number`.
    pub steps: Vec<ApprovalStep>,
    /// Triggers; the workflow matches if any one trigger matches.
    pub trigger_conditions: Vec<Trigger>,
    /// Lifecycle status.
    pub status: WorkflowStatus,
    /// Optimistic-concurrency version, bumped on every store update.
    pub version: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Total condition count across all triggers; used to rank competing
    /// workflows (higher = more specific).
    #[must_use]
    pub fn specificity(&self) -> usize {
        self.trigger_conditions
            .iter()
            .map(|t| t.conditions.len())
            .sum()
    }

    /// Looks up a step by number.
    #[must_use]
    pub fn step(&self, step_number: u32) -> Option<&ApprovalStep> {
        self.steps.iter().find(|s| s.step_number == step_number)
    }

    /// The first step of the chain.
    #[must_use]
    pub fn first_step(&self) -> Option<&ApprovalStep> {
        self.steps.first()
    }

    /// The step that follows `step_number`, if any.
    #[must_use]
    pub fn next_step_after(&self, step_number: u32) -> Option<&ApprovalStep> {
        self.steps.iter().find(|s| s.step_number > step_number)
    }

    /// Sorts steps ascending by step number. Called on create/update so the
    /// sorted-steps invariant holds before activation validates uniqueness.
    pub fn normalize_steps(&mut self) {
        self.steps.sort_by_key(|s| s.step_number);
    }
}

/// A single recorded approval decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalDecision {
    /// The step the decision was made on.
    pub step_number: u32,
    /// Who decided.
    pub approver_id: UserId,
    /// The role the approver acted under.
    pub approver_role: String,
    /// Approve or reject.
    pub decision: Decision,
    /// When the decision was recorded.
    pub timestamp: DateTime<Utc>,
    /// Optional free-form comments (the rejection reason for vetoes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    /// Optional detached signature supplied by the approver's client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// One in-flight (or settled) instance of a workflow applied to a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Unique identifier.
    pub id: RequestId,
    /// The workflow this request instantiates.
    pub workflow_id: WorkflowId,
    /// Owning account.
    pub account_id: AccountId,
    /// The gated transaction.
    pub transaction_id: TransactionId,
    /// Who opened the request.
    pub requested_by: UserId,
    /// The step currently collecting approvals (meaningful while pending).
    pub current_step: u32,
    /// Lifecycle status.
    pub status: RequestStatus,
    /// All recorded decisions, across all steps.
    pub approvals: Vec<ApprovalDecision>,
    /// Absolute deadline of the current step.
    pub expires_at: DateTime<Utc>,
    /// When the request reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Free-form annotations (cancellation reason, escalation notes).
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Optimistic-concurrency version, bumped on every store update.
    pub version: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// Count of approvals recorded for the given step.
    #[must_use]
    pub fn approvals_for_step(&self, step_number: u32) -> u32 {
        let count = self
            .approvals
            .iter()
            .filter(|d| d.step_number == step_number && d.decision == Decision::Approved)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Returns true if the approver already decided the given step.
    #[must_use]
    pub fn has_decision_from(&self, step_number: u32, approver_id: UserId) -> bool {
        self.approvals
            .iter()
            .any(|d| d.step_number == step_number && d.approver_id == approver_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(step_number: u32) -> ApprovalStep {
        ApprovalStep {
            step_number,
            approver_roles: vec!["risk_manager".to_string()],
            approver_users: vec![],
            required_approvals: 1,
            timeout_hours: 4,
            escalate_on_timeout: false,
            escalate_to: None,
        }
    }

    fn workflow(steps: Vec<ApprovalStep>) -> Workflow {
        let now = Utc::now();
        Workflow {
            id: WorkflowId::new(),
            account_id: AccountId::new(),
            name: "High value transfers".to_string(),
            description: None,
            steps,
            trigger_conditions: vec![],
            status: WorkflowStatus::Draft,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_workflow_status_round_trip() {
        for status in [
            WorkflowStatus::Draft,
            WorkflowStatus::Active,
            WorkflowStatus::Paused,
            WorkflowStatus::Archived,
        ] {
            assert_eq!(WorkflowStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(WorkflowStatus::parse("invalid"), None);
    }

    #[test]
    fn test_request_status_terminal() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(RequestStatus::Expired.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_step_authorizes_by_role_or_user() {
        let user = UserId::new();
        let mut s = step(1);
        assert!(s.authorizes(user, "risk_manager"));
        assert!(!s.authorizes(user, "viewer"));

        s.approver_users.push(user);
        assert!(s.authorizes(user, "viewer"));
    }

    #[test]
    fn test_workflow_specificity_counts_all_triggers() {
        let mut wf = workflow(vec![step(1)]);
        wf.trigger_conditions = vec![
            Trigger {
                kind: "amount".to_string(),
                conditions: vec![crate::condition::Condition::new(
                    "amount",
                    crate::condition::Operator::GreaterThan,
                    json!(1000),
                )],
            },
            Trigger {
                kind: "destination".to_string(),
                conditions: vec![
                    crate::condition::Condition::new(
                        "destinationType",
                        crate::condition::Operator::Equals,
                        json!("external"),
                    ),
                    crate::condition::Condition::new(
                        "currency",
                        crate::condition::Operator::Equals,
                        json!("USD"),
                    ),
                ],
            },
        ];
        assert_eq!(wf.specificity(), 3);
    }

    #[test]
    fn test_workflow_step_navigation() {
        let wf = workflow(vec![step(1), step(3), step(5)]);
        assert_eq!(wf.first_step().map(|s| s.step_number), Some(1));
        assert_eq!(wf.next_step_after(1).map(|s| s.step_number), Some(3));
        assert_eq!(wf.next_step_after(3).map(|s| s.step_number), Some(5));
        assert!(wf.next_step_after(5).is_none());
        assert!(wf.step(2).is_none());
    }

    #[test]
    fn test_normalize_steps_sorts_ascending() {
        let mut wf = workflow(vec![step(3), step(1), step(2)]);
        wf.normalize_steps();
        let numbers: Vec<u32> = wf.steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }
}

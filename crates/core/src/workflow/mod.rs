//! Approval workflow management for Sentra.
//!
//! This module implements the approval-policy domain model, the trigger
//! matcher that selects which workflow gates a transaction, and the
//! multi-step approval request state machine.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (Workflow, ApprovalStep, ApprovalRequest)
//! - `error` - Workflow-specific error types
//! - `trigger` - Trigger matching and specificity resolution
//! - `machine` - Approval request state transitions and escalation decisions

pub mod error;
pub mod machine;
pub mod trigger;
pub mod types;

#[cfg(test)]
mod machine_props;

pub use error::WorkflowError;
pub use machine::{ApprovalMachine, DecisionOutcome, EscalationOutcome};
pub use trigger::{TriggerMatch, TriggerMatcher};
pub use types::{
    ApprovalDecision, ApprovalRequest, ApprovalStep, Decision, RequestStatus, Trigger, Workflow,
    WorkflowStatus,
};

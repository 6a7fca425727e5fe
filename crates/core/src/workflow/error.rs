//! Workflow error types for approval lifecycle management.
//!
//! This module defines all error types that can occur during workflow
//! operations such as activation, request creation, decisions, and
//! escalation sweeps.

use thiserror::Error;

use sentra_shared::{RequestId, UserId, WorkflowId};

use crate::workflow::types::{RequestStatus, WorkflowStatus};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Workflow not found.
    #[error("Workflow {0} not found")]
    WorkflowNotFound(WorkflowId),

    /// Approval request not found.
    #[error("Approval request {0} not found")]
    RequestNotFound(RequestId),

    /// The request's current step does not exist on its workflow.
    #[error("Step {step_number} not found on workflow {workflow_id}")]
    StepNotFound {
        /// The workflow that was expected to define the step.
        workflow_id: WorkflowId,
        /// The missing step number.
        step_number: u32,
    },

    /// Operation requires an active workflow.
    #[error("Workflow {workflow_id} is {status}, not active")]
    WorkflowNotActive {
        /// The workflow.
        workflow_id: WorkflowId,
        /// Its current status.
        status: WorkflowStatus,
    },

    /// Archived workflows are immutable.
    #[error("Workflow {0} is archived and cannot be modified")]
    WorkflowArchived(WorkflowId),

    /// Operation requires a pending request.
    #[error("Request {request_id} is {status}, not pending")]
    RequestNotPending {
        /// The request.
        request_id: RequestId,
        /// Its terminal status.
        status: RequestStatus,
    },

    /// The request's deadline passed before the decision was attempted.
    #[error("Request {0} has expired")]
    RequestExpired(RequestId),

    /// Approver is not permitted to decide the current step.
    #[error("Approver {approver_id} (role {approver_role}) is not authorized for step {step_number}")]
    Unauthorized {
        /// The approver.
        approver_id: UserId,
        /// The role the approver acted under.
        approver_role: String,
        /// The step being decided.
        step_number: u32,
    },

    /// Duplicate decision by the same approver on the same step.
    #[error("Approver {approver_id} already decided step {step_number}")]
    AlreadyDecided {
        /// The approver.
        approver_id: UserId,
        /// The step.
        step_number: u32,
    },

    /// A rejection requires a non-empty reason.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Activation requires at least one step.
    #[error("Workflow {0} cannot be activated without steps")]
    NoSteps(WorkflowId),

    /// Activation requires at least one trigger.
    #[error("Workflow {0} cannot be activated without trigger conditions")]
    NoTriggers(WorkflowId),

    /// Step numbers must be unique within a workflow.
    #[error("Workflow {workflow_id} has duplicate step number {step_number}")]
    DuplicateStepNumber {
        /// The workflow.
        workflow_id: WorkflowId,
        /// The duplicated step number.
        step_number: u32,
    },

    /// A step's quorum must be at least one.
    #[error("Step {step_number} requires an approval quorum of at least 1")]
    InvalidQuorum {
        /// The offending step.
        step_number: u32,
    },

    /// A step's timeout must be positive.
    #[error("Step {step_number} requires a positive timeout")]
    InvalidTimeout {
        /// The offending step.
        step_number: u32,
    },

    /// Archival is blocked while the workflow has pending requests.
    #[error("Workflow {workflow_id} has {count} pending request(s) and cannot be archived")]
    PendingRequestsExist {
        /// The workflow.
        workflow_id: WorkflowId,
        /// Number of requests still pending.
        count: usize,
    },

    /// Concurrent modification detected by the optimistic version check.
    #[error("Concurrent modification of {0}")]
    Conflict(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::WorkflowNotActive { .. }
            | Self::WorkflowArchived(_)
            | Self::RequestNotPending { .. }
            | Self::RequestExpired(_)
            | Self::RejectionReasonRequired
            | Self::NoSteps(_)
            | Self::NoTriggers(_)
            | Self::DuplicateStepNumber { .. }
            | Self::InvalidQuorum { .. }
            | Self::InvalidTimeout { .. }
            | Self::PendingRequestsExist { .. } => 422,

            Self::Unauthorized { .. } => 403,

            Self::WorkflowNotFound(_) | Self::RequestNotFound(_) | Self::StepNotFound { .. } => 404,

            Self::AlreadyDecided { .. } | Self::Conflict(_) => 409,

            Self::Storage(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::WorkflowNotFound(_) => "WORKFLOW_NOT_FOUND",
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::StepNotFound { .. } => "STEP_NOT_FOUND",
            Self::WorkflowNotActive { .. } => "WORKFLOW_NOT_ACTIVE",
            Self::WorkflowArchived(_) => "WORKFLOW_ARCHIVED",
            Self::RequestNotPending { .. } => "REQUEST_NOT_PENDING",
            Self::RequestExpired(_) => "REQUEST_EXPIRED",
            Self::Unauthorized { .. } => "NOT_AUTHORIZED_TO_DECIDE",
            Self::AlreadyDecided { .. } => "ALREADY_DECIDED",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::NoSteps(_) => "NO_STEPS",
            Self::NoTriggers(_) => "NO_TRIGGERS",
            Self::DuplicateStepNumber { .. } => "DUPLICATE_STEP_NUMBER",
            Self::InvalidQuorum { .. } => "INVALID_QUORUM",
            Self::InvalidTimeout { .. } => "INVALID_TIMEOUT",
            Self::PendingRequestsExist { .. } => "PENDING_REQUESTS_EXIST",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

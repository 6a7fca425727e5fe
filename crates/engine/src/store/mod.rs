//! Repository ports for engine state.
//!
//! The engines only ever touch state through these traits, so the
//! in-memory store can be swapped for a durable backend without touching
//! state-machine logic. Updates carry an optimistic version check: the
//! incoming record's `version` must equal the stored one, and the store
//! bumps it on success, so lost updates surface as conflicts instead of
//! silently overwriting.

use async_trait::async_trait;
use thiserror::Error;

use sentra_core::monitoring::{AlertSeverity, AlertStatus, MonitoringRule, TransactionAlert};
use sentra_core::workflow::{ApprovalRequest, RequestStatus, Workflow, WorkflowStatus};
use sentra_shared::{AccountId, AlertId, RequestId, RuleId, TransactionId, WorkflowId};

pub mod memory;

pub use memory::{InMemoryAlertStore, InMemoryRequestStore, InMemoryRuleStore, InMemoryWorkflowStore};

/// Errors surfaced by repositories.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record does not exist.
    #[error("record not found")]
    NotFound,

    /// The record changed since it was read.
    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict {
        /// The version the caller read.
        expected: u64,
        /// The version currently stored.
        actual: u64,
    },

    /// Backend failure (I/O, connection, serialization).
    #[error("backend error: {0}")]
    Backend(String),
}

/// Query filter for approval request listings.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    /// Restrict to one status.
    pub status: Option<RequestStatus>,
    /// Restrict to one workflow.
    pub workflow_id: Option<WorkflowId>,
    /// Restrict to one transaction.
    pub transaction_id: Option<TransactionId>,
    /// Only requests created at or after this instant.
    pub created_after: Option<chrono::DateTime<chrono::Utc>>,
    /// Only requests created at or before this instant.
    pub created_before: Option<chrono::DateTime<chrono::Utc>>,
}

impl RequestFilter {
    /// Returns true if the request passes the filter.
    #[must_use]
    pub fn matches(&self, request: &ApprovalRequest) -> bool {
        self.status.is_none_or(|s| request.status == s)
            && self.workflow_id.is_none_or(|id| request.workflow_id == id)
            && self
                .transaction_id
                .is_none_or(|id| request.transaction_id == id)
            && self.created_after.is_none_or(|t| request.created_at >= t)
            && self.created_before.is_none_or(|t| request.created_at <= t)
    }
}

/// Query filter for alert listings.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    /// Restrict to one status.
    pub status: Option<AlertStatus>,
    /// Only alerts at or above this severity.
    pub min_severity: Option<AlertSeverity>,
    /// Restrict to one rule.
    pub rule_id: Option<RuleId>,
    /// Restrict to one transaction.
    pub transaction_id: Option<TransactionId>,
    /// Only alerts created at or after this instant.
    pub created_after: Option<chrono::DateTime<chrono::Utc>>,
    /// Only alerts created at or before this instant.
    pub created_before: Option<chrono::DateTime<chrono::Utc>>,
}

impl AlertFilter {
    /// Returns true if the alert passes the filter.
    #[must_use]
    pub fn matches(&self, alert: &TransactionAlert) -> bool {
        self.status.is_none_or(|s| alert.status == s)
            && self.min_severity.is_none_or(|s| alert.severity >= s)
            && self.rule_id.is_none_or(|id| alert.rule_id == id)
            && self
                .transaction_id
                .is_none_or(|id| alert.transaction_id == id)
            && self.created_after.is_none_or(|t| alert.created_at >= t)
            && self.created_before.is_none_or(|t| alert.created_at <= t)
    }
}

/// Store for approval workflows.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Inserts a new workflow.
    async fn insert(&self, workflow: Workflow) -> Result<(), StoreError>;

    /// Fetches a workflow by id.
    async fn get(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError>;

    /// Replaces a workflow after an optimistic version check; returns the
    /// stored record with its version bumped.
    async fn update(&self, workflow: Workflow) -> Result<Workflow, StoreError>;

    /// Lists an account's workflows in creation order, optionally
    /// restricted to one status.
    async fn list_for_account(
        &self,
        account_id: AccountId,
        status: Option<WorkflowStatus>,
    ) -> Result<Vec<Workflow>, StoreError>;
}

/// Store for approval requests.
#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// Inserts a new request.
    async fn insert(&self, request: ApprovalRequest) -> Result<(), StoreError>;

    /// Fetches a request by id.
    async fn get(&self, id: RequestId) -> Result<Option<ApprovalRequest>, StoreError>;

    /// Replaces a request after an optimistic version check; returns the
    /// stored record with its version bumped.
    async fn update(&self, request: ApprovalRequest) -> Result<ApprovalRequest, StoreError>;

    /// Lists an account's requests in creation order, filtered.
    async fn list_for_account(
        &self,
        account_id: AccountId,
        filter: &RequestFilter,
    ) -> Result<Vec<ApprovalRequest>, StoreError>;

    /// Lists every pending request across accounts (the sweep's input).
    async fn list_pending(&self) -> Result<Vec<ApprovalRequest>, StoreError>;

    /// Counts pending requests referencing a workflow (archival guard).
    async fn count_pending_for_workflow(&self, workflow_id: WorkflowId)
    -> Result<usize, StoreError>;
}

/// Store for monitoring rules.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Inserts a new rule.
    async fn insert(&self, rule: MonitoringRule) -> Result<(), StoreError>;

    /// Removes a rule; `NotFound` if absent.
    async fn remove(&self, id: RuleId) -> Result<MonitoringRule, StoreError>;

    /// Fetches a rule by id.
    async fn get(&self, id: RuleId) -> Result<Option<MonitoringRule>, StoreError>;

    /// Lists an account's rules in creation order.
    async fn list_for_account(&self, account_id: AccountId)
    -> Result<Vec<MonitoringRule>, StoreError>;
}

/// Store for transaction alerts.
#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Inserts a new alert.
    async fn insert(&self, alert: TransactionAlert) -> Result<(), StoreError>;

    /// Fetches an alert by id.
    async fn get(&self, id: AlertId) -> Result<Option<TransactionAlert>, StoreError>;

    /// Replaces an alert unconditionally (alert review is engine-serialized).
    async fn update(&self, alert: TransactionAlert) -> Result<(), StoreError>;

    /// Lists an account's alerts in creation order, filtered.
    async fn list_for_account(
        &self,
        account_id: AccountId,
        filter: &AlertFilter,
    ) -> Result<Vec<TransactionAlert>, StoreError>;
}

//! `DashMap`-backed repositories for tests and embedded use.
//!
//! Listings sort by `(created_at, id)`. Ids are UUIDv7, so the sort is
//! creation order even when two records share a millisecond timestamp.

use async_trait::async_trait;
use dashmap::DashMap;

use sentra_core::monitoring::{MonitoringRule, TransactionAlert};
use sentra_core::workflow::{ApprovalRequest, RequestStatus, Workflow, WorkflowStatus};
use sentra_shared::{AccountId, AlertId, RequestId, RuleId, WorkflowId};

use super::{
    AlertFilter, AlertRepository, RequestFilter, RequestRepository, RuleRepository, StoreError,
    WorkflowRepository,
};

/// In-memory workflow store.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    records: DashMap<WorkflowId, Workflow>,
}

impl InMemoryWorkflowStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowStore {
    async fn insert(&self, workflow: Workflow) -> Result<(), StoreError> {
        self.records.insert(workflow.id, workflow);
        Ok(())
    }

    async fn get(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError> {
        Ok(self.records.get(&id).map(|r| r.clone()))
    }

    async fn update(&self, mut workflow: Workflow) -> Result<Workflow, StoreError> {
        let mut entry = self
            .records
            .get_mut(&workflow.id)
            .ok_or(StoreError::NotFound)?;
        if entry.version != workflow.version {
            return Err(StoreError::VersionConflict {
                expected: workflow.version,
                actual: entry.version,
            });
        }
        workflow.version += 1;
        *entry = workflow.clone();
        Ok(workflow)
    }

    async fn list_for_account(
        &self,
        account_id: AccountId,
        status: Option<WorkflowStatus>,
    ) -> Result<Vec<Workflow>, StoreError> {
        let mut out: Vec<Workflow> = self
            .records
            .iter()
            .filter(|r| r.account_id == account_id && status.is_none_or(|s| r.status == s))
            .map(|r| r.clone())
            .collect();
        out.sort_by_key(|w| (w.created_at, w.id));
        Ok(out)
    }
}

/// In-memory approval request store.
#[derive(Debug, Default)]
pub struct InMemoryRequestStore {
    records: DashMap<RequestId, ApprovalRequest>,
}

impl InMemoryRequestStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a stored request without a version check. Test hook for
    /// backdating deadlines.
    pub fn overwrite(&self, request: ApprovalRequest) {
        self.records.insert(request.id, request);
    }
}

#[async_trait]
impl RequestRepository for InMemoryRequestStore {
    async fn insert(&self, request: ApprovalRequest) -> Result<(), StoreError> {
        self.records.insert(request.id, request);
        Ok(())
    }

    async fn get(&self, id: RequestId) -> Result<Option<ApprovalRequest>, StoreError> {
        Ok(self.records.get(&id).map(|r| r.clone()))
    }

    async fn update(&self, mut request: ApprovalRequest) -> Result<ApprovalRequest, StoreError> {
        let mut entry = self
            .records
            .get_mut(&request.id)
            .ok_or(StoreError::NotFound)?;
        if entry.version != request.version {
            return Err(StoreError::VersionConflict {
                expected: request.version,
                actual: entry.version,
            });
        }
        request.version += 1;
        *entry = request.clone();
        Ok(request)
    }

    async fn list_for_account(
        &self,
        account_id: AccountId,
        filter: &RequestFilter,
    ) -> Result<Vec<ApprovalRequest>, StoreError> {
        let mut out: Vec<ApprovalRequest> = self
            .records
            .iter()
            .filter(|r| r.account_id == account_id && filter.matches(r))
            .map(|r| r.clone())
            .collect();
        out.sort_by_key(|r| (r.created_at, r.id));
        Ok(out)
    }

    async fn list_pending(&self) -> Result<Vec<ApprovalRequest>, StoreError> {
        let mut out: Vec<ApprovalRequest> = self
            .records
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .map(|r| r.clone())
            .collect();
        out.sort_by_key(|r| (r.created_at, r.id));
        Ok(out)
    }

    async fn count_pending_for_workflow(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<usize, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.workflow_id == workflow_id && r.status == RequestStatus::Pending)
            .count())
    }
}

/// In-memory monitoring rule store.
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    records: DashMap<RuleId, MonitoringRule>,
}

impl InMemoryRuleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleRepository for InMemoryRuleStore {
    async fn insert(&self, rule: MonitoringRule) -> Result<(), StoreError> {
        self.records.insert(rule.id, rule);
        Ok(())
    }

    async fn remove(&self, id: RuleId) -> Result<MonitoringRule, StoreError> {
        self.records
            .remove(&id)
            .map(|(_, rule)| rule)
            .ok_or(StoreError::NotFound)
    }

    async fn get(&self, id: RuleId) -> Result<Option<MonitoringRule>, StoreError> {
        Ok(self.records.get(&id).map(|r| r.clone()))
    }

    async fn list_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<MonitoringRule>, StoreError> {
        let mut out: Vec<MonitoringRule> = self
            .records
            .iter()
            .filter(|r| r.account_id == account_id)
            .map(|r| r.clone())
            .collect();
        out.sort_by_key(|r| (r.created_at, r.id));
        Ok(out)
    }
}

/// In-memory alert store.
#[derive(Debug, Default)]
pub struct InMemoryAlertStore {
    records: DashMap<AlertId, TransactionAlert>,
}

impl InMemoryAlertStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertRepository for InMemoryAlertStore {
    async fn insert(&self, alert: TransactionAlert) -> Result<(), StoreError> {
        self.records.insert(alert.id, alert);
        Ok(())
    }

    async fn get(&self, id: AlertId) -> Result<Option<TransactionAlert>, StoreError> {
        Ok(self.records.get(&id).map(|r| r.clone()))
    }

    async fn update(&self, alert: TransactionAlert) -> Result<(), StoreError> {
        if !self.records.contains_key(&alert.id) {
            return Err(StoreError::NotFound);
        }
        self.records.insert(alert.id, alert);
        Ok(())
    }

    async fn list_for_account(
        &self,
        account_id: AccountId,
        filter: &AlertFilter,
    ) -> Result<Vec<TransactionAlert>, StoreError> {
        let mut out: Vec<TransactionAlert> = self
            .records
            .iter()
            .filter(|r| r.account_id == account_id && filter.matches(r))
            .map(|r| r.clone())
            .collect();
        out.sort_by_key(|a| (a.created_at, a.id));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use sentra_core::workflow::{ApprovalStep, RequestStatus, Trigger, Workflow, WorkflowStatus};
    use sentra_shared::{AccountId, TransactionId, UserId, WorkflowId};

    use super::*;

    fn sample_workflow(account_id: AccountId) -> Workflow {
        let now = Utc::now();
        Workflow {
            id: WorkflowId::new(),
            account_id,
            name: "wire review".into(),
            description: None,
            steps: vec![ApprovalStep {
                step_number: 1,
                approver_roles: vec!["manager".into()],
                approver_users: vec![],
                required_approvals: 1,
                timeout_hours: 24,
                escalate_on_timeout: false,
                escalate_to: None,
            }],
            trigger_conditions: vec![Trigger {
                kind: "amount".into(),
                conditions: vec![],
            }],
            status: WorkflowStatus::Draft,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_request(account_id: AccountId, workflow_id: WorkflowId) -> ApprovalRequest {
        let now = Utc::now();
        ApprovalRequest {
            id: sentra_shared::RequestId::new(),
            workflow_id,
            account_id,
            transaction_id: TransactionId::new(),
            requested_by: UserId::new(),
            current_step: 1,
            status: RequestStatus::Pending,
            approvals: vec![],
            expires_at: now + chrono::Duration::hours(24),
            completed_at: None,
            metadata: serde_json::Map::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn update_bumps_version() {
        let store = InMemoryWorkflowStore::new();
        let workflow = sample_workflow(AccountId::new());
        store.insert(workflow.clone()).await.unwrap();

        let updated = store.update(workflow).await.unwrap();
        assert_eq!(updated.version, 1);
    }

    #[tokio::test]
    async fn stale_update_is_a_conflict() {
        let store = InMemoryWorkflowStore::new();
        let workflow = sample_workflow(AccountId::new());
        store.insert(workflow.clone()).await.unwrap();

        // First writer wins, the stale copy is rejected.
        store.update(workflow.clone()).await.unwrap();
        let err = store.update(workflow).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict {
                expected: 0,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let store = InMemoryWorkflowStore::new();
        let err = store
            .update(sample_workflow(AccountId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn listings_are_in_creation_order() {
        let store = InMemoryWorkflowStore::new();
        let account_id = AccountId::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let workflow = sample_workflow(account_id);
            ids.push(workflow.id);
            store.insert(workflow).await.unwrap();
        }

        let listed = store.list_for_account(account_id, None).await.unwrap();
        let listed_ids: Vec<_> = listed.iter().map(|w| w.id).collect();
        assert_eq!(listed_ids, ids);
    }

    #[tokio::test]
    async fn status_filter_narrows_listing() {
        let store = InMemoryWorkflowStore::new();
        let account_id = AccountId::new();
        let mut active = sample_workflow(account_id);
        active.status = WorkflowStatus::Active;
        store.insert(active.clone()).await.unwrap();
        store.insert(sample_workflow(account_id)).await.unwrap();

        let listed = store
            .list_for_account(account_id, Some(WorkflowStatus::Active))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, active.id);
    }

    #[tokio::test]
    async fn request_filter_on_status_and_workflow() {
        let store = InMemoryRequestStore::new();
        let account_id = AccountId::new();
        let workflow_id = WorkflowId::new();
        let mut approved = sample_request(account_id, workflow_id);
        approved.status = RequestStatus::Approved;
        store.insert(approved).await.unwrap();
        let pending = sample_request(account_id, workflow_id);
        store.insert(pending.clone()).await.unwrap();
        store
            .insert(sample_request(account_id, WorkflowId::new()))
            .await
            .unwrap();

        let filter = RequestFilter {
            status: Some(RequestStatus::Pending),
            workflow_id: Some(workflow_id),
            ..RequestFilter::default()
        };
        let listed = store.list_for_account(account_id, &filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, pending.id);
    }

    #[tokio::test]
    async fn pending_count_ignores_terminal_requests() {
        let store = InMemoryRequestStore::new();
        let account_id = AccountId::new();
        let workflow_id = WorkflowId::new();
        store
            .insert(sample_request(account_id, workflow_id))
            .await
            .unwrap();
        let mut done = sample_request(account_id, workflow_id);
        done.status = RequestStatus::Approved;
        store.insert(done).await.unwrap();

        assert_eq!(store.count_pending_for_workflow(workflow_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn alert_min_severity_filter() {
        use sentra_core::monitoring::{AlertKind, AlertSeverity, AlertStatus};

        let store = InMemoryAlertStore::new();
        let account_id = AccountId::new();
        let now = Utc::now();
        for severity in [AlertSeverity::Low, AlertSeverity::High] {
            store
                .insert(TransactionAlert {
                    id: sentra_shared::AlertId::new(),
                    account_id,
                    transaction_id: TransactionId::new(),
                    rule_id: sentra_shared::RuleId::new(),
                    kind: AlertKind::ThresholdBreach,
                    severity,
                    status: AlertStatus::Open,
                    description: format!("amount over limit ({})", dec!(10_000)),
                    reviewed_by: None,
                    resolution: None,
                    created_at: now,
                    updated_at: now,
                })
                .await
                .unwrap();
        }

        let filter = AlertFilter {
            min_severity: Some(AlertSeverity::Medium),
            ..AlertFilter::default()
        };
        let listed = store.list_for_account(account_id, &filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].severity, AlertSeverity::High);
    }
}

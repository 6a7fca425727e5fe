//! Workflow and approval request orchestration.
//!
//! [`WorkflowEngine`] owns the stateful side of the approval domain:
//! workflow lifecycle, request creation, decision recording, and the
//! escalation sweep. All transitions delegate to the pure state machine
//! in `sentra_core`; this layer adds persistence, audit events, and the
//! per-record serialization the machine requires.
//!
//! Concurrency model: decisions on the same request take a per-request
//! async mutex, and request creation plus workflow lifecycle changes
//! take a per-account mutex. Cross-record consistency beyond that is
//! the optimistic version check in the stores.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};

use sentra_core::condition::TransactionContext;
use sentra_core::workflow::{
    ApprovalMachine, ApprovalRequest, ApprovalStep, DecisionOutcome, EscalationOutcome, Trigger,
    TriggerMatcher, Workflow, WorkflowError, WorkflowStatus,
};
use sentra_shared::{AccountId, EngineConfig, RequestId, TransactionId, UserId, WorkflowId};

use crate::event::{AuditEvent, EventBus, actions};
use crate::store::{
    InMemoryRequestStore, InMemoryWorkflowStore, RequestFilter, RequestRepository, StoreError,
    WorkflowRepository,
};

/// Input for creating a workflow. The workflow starts in `draft`.
#[derive(Debug, Clone)]
pub struct WorkflowDraft {
    /// Owning account.
    pub account_id: AccountId,
    /// Human-readable name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Approval steps, in any order; normalized on creation.
    pub steps: Vec<ApprovalStep>,
    /// Trigger conditions.
    pub trigger_conditions: Vec<Trigger>,
}

/// Partial update of a workflow's definition. `None` fields are kept.
#[derive(Debug, Clone, Default)]
pub struct WorkflowUpdate {
    /// New name.
    pub name: Option<String>,
    /// New description (`Some(None)` clears it).
    pub description: Option<Option<String>>,
    /// Replacement steps.
    pub steps: Option<Vec<ApprovalStep>>,
    /// Replacement triggers.
    pub trigger_conditions: Option<Vec<Trigger>>,
}

/// Answer to "does this transaction need approval".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequirement {
    /// The workflow that gates the transaction.
    pub workflow_id: WorkflowId,
    /// Its name, for display and audit.
    pub workflow_name: String,
    /// Indexes of the triggers that matched.
    pub matched_triggers: Vec<usize>,
    /// Worst-case approval time (sum of step windows), in minutes.
    pub estimated_minutes: i64,
}

/// One request handled by an escalation sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationRecord {
    /// The overdue request.
    pub request_id: RequestId,
    /// Its workflow.
    pub workflow_id: WorkflowId,
    /// Its account.
    pub account_id: AccountId,
    /// What the sweep did with it.
    pub outcome: EscalationOutcome,
}

/// Stateful engine for workflows and approval requests.
pub struct WorkflowEngine {
    workflows: Arc<dyn WorkflowRepository>,
    requests: Arc<dyn RequestRepository>,
    events: Arc<EventBus>,
    config: EngineConfig,
    request_locks: DashMap<RequestId, Arc<Mutex<()>>>,
    account_locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl WorkflowEngine {
    /// Creates an engine over the given stores.
    #[must_use]
    pub fn new(
        workflows: Arc<dyn WorkflowRepository>,
        requests: Arc<dyn RequestRepository>,
        events: Arc<EventBus>,
        config: EngineConfig,
    ) -> Self {
        Self {
            workflows,
            requests,
            events,
            config,
            request_locks: DashMap::new(),
            account_locks: DashMap::new(),
        }
    }

    /// Creates an engine over fresh in-memory stores.
    #[must_use]
    pub fn in_memory(events: Arc<EventBus>, config: EngineConfig) -> Self {
        Self::new(
            Arc::new(InMemoryWorkflowStore::new()),
            Arc::new(InMemoryRequestStore::new()),
            events,
            config,
        )
    }

    // ------------------------------------------------------------------
    // Workflow lifecycle
    // ------------------------------------------------------------------

    /// Creates a workflow in `draft` status.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn create_workflow(&self, draft: WorkflowDraft) -> Result<Workflow, WorkflowError> {
        let now = Utc::now();
        let mut workflow = Workflow {
            id: WorkflowId::new(),
            account_id: draft.account_id,
            name: draft.name,
            description: draft.description,
            steps: draft.steps,
            trigger_conditions: draft.trigger_conditions,
            status: WorkflowStatus::Draft,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        workflow.normalize_steps();

        self.workflows
            .insert(workflow.clone())
            .await
            .map_err(map_store)?;
        info!(workflow_id = %workflow.id, account_id = %workflow.account_id, "workflow created");
        Ok(workflow)
    }

    /// Fetches a workflow.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowNotFound` if absent.
    pub async fn get_workflow(&self, id: WorkflowId) -> Result<Workflow, WorkflowError> {
        self.workflows
            .get(id)
            .await
            .map_err(map_store)?
            .ok_or(WorkflowError::WorkflowNotFound(id))
    }

    /// Lists an account's workflows in creation order, capped at the
    /// configured page size.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn list_workflows(
        &self,
        account_id: AccountId,
        status: Option<WorkflowStatus>,
    ) -> Result<Vec<Workflow>, WorkflowError> {
        let mut workflows = self
            .workflows
            .list_for_account(account_id, status)
            .await
            .map_err(map_store)?;
        workflows.truncate(self.config.listing.max_page_size);
        Ok(workflows)
    }

    /// Updates a workflow's definition. Archived workflows are immutable.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowArchived` for archived workflows and `Conflict`
    /// when the record changed concurrently.
    pub async fn update_workflow(
        &self,
        id: WorkflowId,
        update: WorkflowUpdate,
    ) -> Result<Workflow, WorkflowError> {
        let mut workflow = self.get_workflow(id).await?;
        let _guard = self.account_lock(workflow.account_id).lock_owned().await;

        if workflow.status == WorkflowStatus::Archived {
            return Err(WorkflowError::WorkflowArchived(id));
        }

        if let Some(name) = update.name {
            workflow.name = name;
        }
        if let Some(description) = update.description {
            workflow.description = description;
        }
        if let Some(steps) = update.steps {
            workflow.steps = steps;
            workflow.normalize_steps();
        }
        if let Some(triggers) = update.trigger_conditions {
            workflow.trigger_conditions = triggers;
        }
        workflow.updated_at = Utc::now();

        self.workflows.update(workflow).await.map_err(map_store)
    }

    /// Activates a workflow after structural validation. Both `draft` and
    /// `paused` workflows can be activated.
    ///
    /// # Errors
    ///
    /// Returns the validation error that blocked activation.
    pub async fn activate_workflow(&self, id: WorkflowId) -> Result<Workflow, WorkflowError> {
        let mut workflow = self.get_workflow(id).await?;
        let _guard = self.account_lock(workflow.account_id).lock_owned().await;

        ApprovalMachine::validate_for_activation(&workflow)?;
        workflow.status = WorkflowStatus::Active;
        workflow.updated_at = Utc::now();
        let workflow = self.workflows.update(workflow).await.map_err(map_store)?;
        info!(workflow_id = %workflow.id, "workflow activated");
        Ok(workflow)
    }

    /// Pauses an active workflow. Paused workflows stop matching new
    /// transactions; requests already opened keep running.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowNotActive` unless the workflow is active.
    pub async fn pause_workflow(&self, id: WorkflowId) -> Result<Workflow, WorkflowError> {
        let mut workflow = self.get_workflow(id).await?;
        let _guard = self.account_lock(workflow.account_id).lock_owned().await;

        if workflow.status != WorkflowStatus::Active {
            return Err(WorkflowError::WorkflowNotActive {
                workflow_id: id,
                status: workflow.status,
            });
        }
        workflow.status = WorkflowStatus::Paused;
        workflow.updated_at = Utc::now();
        self.workflows.update(workflow).await.map_err(map_store)
    }

    /// Archives a workflow. Archival is terminal and refused while the
    /// workflow still has pending requests.
    ///
    /// # Errors
    ///
    /// Returns `PendingRequestsExist` when open requests block archival.
    pub async fn archive_workflow(&self, id: WorkflowId) -> Result<Workflow, WorkflowError> {
        let mut workflow = self.get_workflow(id).await?;
        let _guard = self.account_lock(workflow.account_id).lock_owned().await;

        let pending = self
            .requests
            .count_pending_for_workflow(id)
            .await
            .map_err(map_store)?;
        if pending > 0 {
            return Err(WorkflowError::PendingRequestsExist {
                workflow_id: id,
                count: pending,
            });
        }
        workflow.status = WorkflowStatus::Archived;
        workflow.updated_at = Utc::now();
        let workflow = self.workflows.update(workflow).await.map_err(map_store)?;
        info!(workflow_id = %workflow.id, "workflow archived");
        Ok(workflow)
    }

    // ------------------------------------------------------------------
    // Trigger evaluation
    // ------------------------------------------------------------------

    /// Decides whether a transaction needs approval, and by which
    /// workflow. Returns `None` when no active workflow matches.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn should_trigger_approval(
        &self,
        account_id: AccountId,
        ctx: &TransactionContext,
    ) -> Result<Option<ApprovalRequirement>, WorkflowError> {
        let workflows = self
            .workflows
            .list_for_account(account_id, Some(WorkflowStatus::Active))
            .await
            .map_err(map_store)?;

        Ok(TriggerMatcher::find_matching(&workflows, ctx).map(|m| ApprovalRequirement {
            workflow_id: m.workflow.id,
            workflow_name: m.workflow.name.clone(),
            matched_triggers: m.matched_triggers,
            estimated_minutes: TriggerMatcher::estimated_minutes(m.workflow),
        }))
    }

    /// Like [`Self::should_trigger_approval`], but returns the full
    /// matched workflow.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn find_matching_workflow(
        &self,
        account_id: AccountId,
        ctx: &TransactionContext,
    ) -> Result<Option<Workflow>, WorkflowError> {
        let workflows = self
            .workflows
            .list_for_account(account_id, Some(WorkflowStatus::Active))
            .await
            .map_err(map_store)?;

        Ok(TriggerMatcher::find_matching(&workflows, ctx).map(|m| m.workflow.clone()))
    }

    // ------------------------------------------------------------------
    // Approval requests
    // ------------------------------------------------------------------

    /// Opens an approval request against an active workflow.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowNotActive` unless the workflow is active.
    pub async fn create_request(
        &self,
        workflow_id: WorkflowId,
        transaction_id: TransactionId,
        requested_by: UserId,
    ) -> Result<ApprovalRequest, WorkflowError> {
        let workflow = self.get_workflow(workflow_id).await?;
        let _guard = self.account_lock(workflow.account_id).lock_owned().await;
        // Re-read under the lock: archival or pausing may have completed
        // between the first read and lock acquisition. The insert below has
        // no version check, so the status must be decided on a fresh read.
        let workflow = self.get_workflow(workflow_id).await?;

        let request =
            ApprovalMachine::create_request(&workflow, transaction_id, requested_by, Utc::now())?;
        self.requests
            .insert(request.clone())
            .await
            .map_err(map_store)?;

        info!(request_id = %request.id, workflow_id = %workflow_id, "approval request opened");
        self.events.emit(
            &AuditEvent::new(
                request.account_id,
                actions::APPROVAL_REQUESTED,
                "approval_request",
                request.id.to_string(),
                json!({
                    "workflowId": workflow_id.to_string(),
                    "transactionId": transaction_id.to_string(),
                    "expiresAt": request.expires_at,
                }),
            )
            .with_actor(requested_by, "requester"),
        );
        Ok(request)
    }

    /// Fetches an approval request.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotFound` if absent.
    pub async fn get_request(&self, id: RequestId) -> Result<ApprovalRequest, WorkflowError> {
        self.requests
            .get(id)
            .await
            .map_err(map_store)?
            .ok_or(WorkflowError::RequestNotFound(id))
    }

    /// Lists an account's requests in creation order, capped at the
    /// configured page size.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn list_requests(
        &self,
        account_id: AccountId,
        filter: &RequestFilter,
    ) -> Result<Vec<ApprovalRequest>, WorkflowError> {
        let mut requests = self
            .requests
            .list_for_account(account_id, filter)
            .await
            .map_err(map_store)?;
        requests.truncate(self.config.listing.max_page_size);
        Ok(requests)
    }

    /// Lists the account's pending requests whose current step the given
    /// approver is authorized to decide.
    ///
    /// The listing is account-scoped: every query operation on this
    /// engine takes an `account_id`, and an approver's work queue across
    /// accounts is assembled by the caller, one account at a time.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn get_pending_requests(
        &self,
        account_id: AccountId,
        approver_id: UserId,
        approver_role: &str,
    ) -> Result<Vec<ApprovalRequest>, WorkflowError> {
        let filter = RequestFilter {
            status: Some(sentra_core::workflow::RequestStatus::Pending),
            ..RequestFilter::default()
        };
        let pending = self
            .requests
            .list_for_account(account_id, &filter)
            .await
            .map_err(map_store)?;

        let mut out = Vec::new();
        for request in pending {
            let Some(workflow) = self.workflows.get(request.workflow_id).await.map_err(map_store)?
            else {
                warn!(request_id = %request.id, workflow_id = %request.workflow_id,
                    "pending request references a missing workflow");
                continue;
            };
            let authorized = workflow
                .step(request.current_step)
                .is_some_and(|step| step.authorizes(approver_id, approver_role));
            if authorized {
                out.push(request);
            }
        }
        out.truncate(self.config.listing.max_page_size);
        Ok(out)
    }

    /// Records an approval on a request's current step.
    ///
    /// A decision attempted after the deadline persists the request as
    /// `expired` and still surfaces `RequestExpired`.
    ///
    /// # Errors
    ///
    /// Returns the state machine's validation error.
    pub async fn approve(
        &self,
        request_id: RequestId,
        approver_id: UserId,
        approver_role: &str,
        comments: Option<String>,
        signature: Option<String>,
    ) -> Result<DecisionOutcome, WorkflowError> {
        let _guard = self.request_lock(request_id).lock_owned().await;
        let mut request = self.get_request(request_id).await?;
        let workflow = self.get_workflow(request.workflow_id).await?;
        let decided_step = request.current_step;
        let now = Utc::now();

        let outcome = match ApprovalMachine::approve(
            &mut request,
            &workflow,
            approver_id,
            approver_role,
            comments,
            signature,
            now,
        ) {
            Ok(outcome) => outcome,
            Err(err) => return self.persist_failed_decision(request, err).await,
        };
        let request = self.requests.update(request).await.map_err(map_store)?;

        self.events.emit(
            &AuditEvent::new(
                request.account_id,
                actions::APPROVE,
                "approval_request",
                request.id.to_string(),
                json!({ "step": decided_step }),
            )
            .with_actor(approver_id, approver_role),
        );
        match &outcome {
            DecisionOutcome::Recorded { .. } => {}
            DecisionOutcome::Advanced {
                completed_step,
                next_step,
                expires_at,
            } => {
                self.events.emit(&AuditEvent::new(
                    request.account_id,
                    actions::STEP_COMPLETED,
                    "approval_request",
                    request.id.to_string(),
                    json!({
                        "completedStep": completed_step,
                        "nextStep": next_step,
                        "expiresAt": expires_at,
                    }),
                ));
            }
            DecisionOutcome::Completed { completed_at } => {
                info!(request_id = %request.id, "approval request approved");
                self.events.emit(&AuditEvent::new(
                    request.account_id,
                    actions::REQUEST_APPROVED,
                    "approval_request",
                    request.id.to_string(),
                    json!({ "completedAt": completed_at }),
                ));
                self.release_request_lock(request_id);
            }
        }
        Ok(outcome)
    }

    /// Records a rejection. One authorized rejection vetoes the request.
    ///
    /// # Errors
    ///
    /// Returns the state machine's validation error.
    pub async fn reject(
        &self,
        request_id: RequestId,
        approver_id: UserId,
        approver_role: &str,
        reason: String,
    ) -> Result<ApprovalRequest, WorkflowError> {
        let _guard = self.request_lock(request_id).lock_owned().await;
        let mut request = self.get_request(request_id).await?;
        let workflow = self.get_workflow(request.workflow_id).await?;
        let now = Utc::now();

        if let Err(err) = ApprovalMachine::reject(
            &mut request,
            &workflow,
            approver_id,
            approver_role,
            reason.clone(),
            now,
        ) {
            return self.persist_failed_decision(request, err).await;
        }
        let request = self.requests.update(request).await.map_err(map_store)?;

        info!(request_id = %request.id, "approval request rejected");
        self.events.emit(
            &AuditEvent::new(
                request.account_id,
                actions::REJECT,
                "approval_request",
                request.id.to_string(),
                json!({ "reason": reason }),
            )
            .with_actor(approver_id, approver_role),
        );
        self.release_request_lock(request_id);
        Ok(request)
    }

    /// Cancels a pending request.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotPending` for terminal requests.
    pub async fn cancel(
        &self,
        request_id: RequestId,
        cancelled_by: UserId,
        reason: Option<String>,
    ) -> Result<ApprovalRequest, WorkflowError> {
        let _guard = self.request_lock(request_id).lock_owned().await;
        let mut request = self.get_request(request_id).await?;
        let now = Utc::now();

        ApprovalMachine::cancel(&mut request, cancelled_by, reason.clone(), now)?;
        let request = self.requests.update(request).await.map_err(map_store)?;

        self.events.emit(
            &AuditEvent::new(
                request.account_id,
                actions::CANCEL,
                "approval_request",
                request.id.to_string(),
                json!({ "reason": reason }),
            )
            .with_actor(cancelled_by, "requester"),
        );
        self.release_request_lock(request_id);
        Ok(request)
    }

    // ------------------------------------------------------------------
    // Escalation sweep
    // ------------------------------------------------------------------

    /// Runs one escalation sweep over pending requests, as of `now`.
    ///
    /// The sweep is idempotent: requests whose deadline has not passed
    /// are untouched, and an escalated request gets a fresh deadline so
    /// an immediate re-sweep does nothing further. At most the configured
    /// batch limit of overdue requests is handled per call; the external
    /// scheduler is expected to invoke the sweep periodically.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn process_escalations(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<EscalationRecord>, WorkflowError> {
        let pending = self.requests.list_pending().await.map_err(map_store)?;

        let mut records = Vec::new();
        for candidate in pending {
            if records.len() >= self.config.sweep.batch_limit {
                break;
            }
            let _guard = self.request_lock(candidate.id).lock_owned().await;
            // Re-read under the lock; a decision may have landed since listing.
            let Some(mut request) = self.requests.get(candidate.id).await.map_err(map_store)?
            else {
                continue;
            };
            let Some(workflow) =
                self.workflows.get(request.workflow_id).await.map_err(map_store)?
            else {
                warn!(request_id = %request.id, workflow_id = %request.workflow_id,
                    "pending request references a missing workflow, skipping");
                continue;
            };

            let Some(outcome) = ApprovalMachine::escalate(&mut request, &workflow, now) else {
                continue;
            };
            let request = self.requests.update(request).await.map_err(map_store)?;

            info!(request_id = %request.id, ?outcome, "escalation sweep handled request");
            self.events.emit(&AuditEvent::new(
                request.account_id,
                actions::ESCALATE,
                "approval_request",
                request.id.to_string(),
                escalation_details(&outcome),
            ));
            if request.status.is_terminal() {
                self.release_request_lock(request.id);
            }
            records.push(EscalationRecord {
                request_id: request.id,
                workflow_id: request.workflow_id,
                account_id: request.account_id,
                outcome,
            });
        }
        Ok(records)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Persists a request mutated by a failed transition (deadline expiry
    /// flips the status in place) and re-raises the original error.
    async fn persist_failed_decision<T>(
        &self,
        request: ApprovalRequest,
        err: WorkflowError,
    ) -> Result<T, WorkflowError> {
        if matches!(err, WorkflowError::RequestExpired(_)) {
            let request = self.requests.update(request).await.map_err(map_store)?;
            warn!(request_id = %request.id, "decision attempted on expired request");
            self.release_request_lock(request.id);
        }
        Err(err)
    }

    fn request_lock(&self, id: RequestId) -> Arc<Mutex<()>> {
        self.request_locks.entry(id).or_default().clone()
    }

    fn account_lock(&self, id: AccountId) -> Arc<Mutex<()>> {
        self.account_locks.entry(id).or_default().clone()
    }

    /// Terminal requests never transition again, so their lock entry can
    /// be dropped. Holders of an already-cloned Arc just fail the pending
    /// guard afterwards.
    fn release_request_lock(&self, id: RequestId) {
        self.request_locks.remove(&id);
    }
}

fn map_store(err: StoreError) -> WorkflowError {
    match err {
        StoreError::NotFound => WorkflowError::Storage("record vanished during update".to_string()),
        StoreError::VersionConflict { expected, actual } => WorkflowError::Conflict(format!(
            "version check failed (expected {expected}, found {actual})"
        )),
        StoreError::Backend(msg) => WorkflowError::Storage(msg),
    }
}

fn escalation_details(outcome: &EscalationOutcome) -> serde_json::Value {
    match outcome {
        EscalationOutcome::Expired => json!({ "result": "expired" }),
        EscalationOutcome::Advanced {
            from_step,
            to_step,
            expires_at,
            notified_roles,
        } => json!({
            "result": "advanced",
            "fromStep": from_step,
            "toStep": to_step,
            "expiresAt": expires_at,
            "notifiedRoles": notified_roles,
        }),
        EscalationOutcome::Renotified {
            step_number,
            escalate_to,
            expires_at,
        } => json!({
            "result": "renotified",
            "step": step_number,
            "escalateTo": escalate_to,
            "expiresAt": expires_at,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentra_core::condition::{Condition, Operator};
    use sentra_core::workflow::RequestStatus;
    use serde_json::json;

    fn draft(account_id: AccountId) -> WorkflowDraft {
        WorkflowDraft {
            account_id,
            name: "large transfers".to_string(),
            description: None,
            steps: vec![
                ApprovalStep {
                    step_number: 2,
                    approver_roles: vec!["compliance_officer".to_string()],
                    approver_users: vec![],
                    required_approvals: 1,
                    timeout_hours: 8,
                    escalate_on_timeout: false,
                    escalate_to: None,
                },
                ApprovalStep {
                    step_number: 1,
                    approver_roles: vec!["risk_manager".to_string()],
                    approver_users: vec![],
                    required_approvals: 1,
                    timeout_hours: 4,
                    escalate_on_timeout: true,
                    escalate_to: None,
                },
            ],
            trigger_conditions: vec![Trigger {
                kind: "amount".to_string(),
                conditions: vec![Condition::new("amount", Operator::GreaterThan, json!(1000))],
            }],
        }
    }

    fn engine() -> WorkflowEngine {
        WorkflowEngine::in_memory(Arc::new(EventBus::new()), EngineConfig::default())
    }

    #[tokio::test]
    async fn create_normalizes_step_order() {
        let engine = engine();
        let workflow = engine.create_workflow(draft(AccountId::new())).await.unwrap();
        let numbers: Vec<u32> = workflow.steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(workflow.status, WorkflowStatus::Draft);
    }

    #[tokio::test]
    async fn draft_workflow_does_not_gate_transactions() {
        let engine = engine();
        let account_id = AccountId::new();
        engine.create_workflow(draft(account_id)).await.unwrap();

        let ctx = TransactionContext::new(
            TransactionId::new(),
            rust_decimal_macros::dec!(5000),
            "transfer",
            "USD",
        );
        assert!(engine
            .should_trigger_approval(account_id, &ctx)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn activation_validates_structure() {
        let engine = engine();
        let mut bad = draft(AccountId::new());
        bad.trigger_conditions.clear();
        let workflow = engine.create_workflow(bad).await.unwrap();

        let err = engine.activate_workflow(workflow.id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NoTriggers(_)));
    }

    #[tokio::test]
    async fn activated_workflow_answers_trigger_queries() {
        let engine = engine();
        let account_id = AccountId::new();
        let workflow = engine.create_workflow(draft(account_id)).await.unwrap();
        engine.activate_workflow(workflow.id).await.unwrap();

        let ctx = TransactionContext::new(
            TransactionId::new(),
            rust_decimal_macros::dec!(5000),
            "transfer",
            "USD",
        );
        let requirement = engine
            .should_trigger_approval(account_id, &ctx)
            .await
            .unwrap()
            .expect("active workflow should match");
        assert_eq!(requirement.workflow_id, workflow.id);
        assert_eq!(requirement.estimated_minutes, 12 * 60);
    }

    #[tokio::test]
    async fn archive_refused_while_requests_pending() {
        let engine = engine();
        let account_id = AccountId::new();
        let workflow = engine.create_workflow(draft(account_id)).await.unwrap();
        engine.activate_workflow(workflow.id).await.unwrap();
        engine
            .create_request(workflow.id, TransactionId::new(), UserId::new())
            .await
            .unwrap();

        let err = engine.archive_workflow(workflow.id).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::PendingRequestsExist { count: 1, .. }
        ));
    }

    #[tokio::test]
    async fn update_refused_on_archived_workflow() {
        let engine = engine();
        let workflow = engine.create_workflow(draft(AccountId::new())).await.unwrap();
        engine.archive_workflow(workflow.id).await.unwrap();

        let err = engine
            .update_workflow(workflow.id, WorkflowUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::WorkflowArchived(_)));
    }

    #[tokio::test]
    async fn pending_listing_filters_by_authorization() {
        let engine = engine();
        let account_id = AccountId::new();
        let workflow = engine.create_workflow(draft(account_id)).await.unwrap();
        engine.activate_workflow(workflow.id).await.unwrap();
        let request = engine
            .create_request(workflow.id, TransactionId::new(), UserId::new())
            .await
            .unwrap();

        let visible = engine
            .get_pending_requests(account_id, UserId::new(), "risk_manager")
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, request.id);

        // Step 1 is gated on risk_manager; compliance sees nothing yet.
        let hidden = engine
            .get_pending_requests(account_id, UserId::new(), "compliance_officer")
            .await
            .unwrap();
        assert!(hidden.is_empty());
    }

    #[tokio::test]
    async fn reject_vetoes_and_concurrent_cancel_fails() {
        let engine = engine();
        let workflow = engine.create_workflow(draft(AccountId::new())).await.unwrap();
        engine.activate_workflow(workflow.id).await.unwrap();
        let request = engine
            .create_request(workflow.id, TransactionId::new(), UserId::new())
            .await
            .unwrap();

        engine
            .reject(
                request.id,
                UserId::new(),
                "risk_manager",
                "counterparty on watchlist".to_string(),
            )
            .await
            .unwrap();

        let stored = engine.get_request(request.id).await.unwrap();
        assert_eq!(stored.status, RequestStatus::Rejected);

        let err = engine.cancel(request.id, UserId::new(), None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::RequestNotPending { .. }));
    }
}

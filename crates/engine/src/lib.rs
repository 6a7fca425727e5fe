//! Stateful policy orchestration for Sentra.
//!
//! This crate wires the pure policy logic of `sentra-core` to swappable
//! repositories and an audit event bus:
//!
//! - `store` - Repository ports with optimistic versioning, plus the
//!   in-memory implementations
//! - `event` - Audit event envelope and isolated listener dispatch
//! - `workflow` - The workflow/approval-request engine and escalation sweep
//! - `monitoring` - The transaction monitoring engine
//!
//! Every public operation is async so a durable store can block on I/O
//! without changing call signatures. The engines own the per-record
//! serialization described in the module docs; callers own scheduling
//! (the escalation sweep is designed to be driven by an external timer).

pub mod event;
pub mod monitoring;
pub mod store;
pub mod workflow;

pub use event::{AuditEvent, EventBus, EventListener};
pub use monitoring::{MonitoringEngine, ReviewDisposition, RuleDraft, TransactionCheck};
pub use store::{AlertFilter, RequestFilter, StoreError};
pub use workflow::{
    ApprovalRequirement, EscalationRecord, WorkflowDraft, WorkflowEngine, WorkflowUpdate,
};

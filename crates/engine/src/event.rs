//! Audit event envelope and listener dispatch.
//!
//! Every state transition in the engines emits an [`AuditEvent`] to every
//! subscribed listener. Listener invocations are isolated from each other
//! and from the emitting operation: a panicking listener is caught and
//! logged, never propagated. Policy correctness must not depend on any
//! observer behaving.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use sentra_shared::{AccountId, EventId, UserId};

/// Event action names emitted by the engines.
///
/// Actions are flat strings rather than nested kind/sub-action pairs.
/// The decision family (everything that moves an approval request after
/// it was opened) is enumerated by [`actions::DECISION_ACTIONS`] so
/// consumers can filter it as a group.
pub mod actions {
    /// A new approval request was opened.
    pub const APPROVAL_REQUESTED: &str = "approval_requested";
    /// An approval was recorded.
    pub const APPROVE: &str = "approve";
    /// A rejection was recorded (request vetoed).
    pub const REJECT: &str = "reject";
    /// A request was cancelled.
    pub const CANCEL: &str = "cancel";
    /// Quorum completed on a step.
    pub const STEP_COMPLETED: &str = "step_completed";
    /// Quorum completed on the final step.
    pub const REQUEST_APPROVED: &str = "request_approved";
    /// The sweep escalated or expired a request.
    pub const ESCALATE: &str = "escalate";
    /// A monitoring rule raised an alert.
    pub const ALERT_GENERATED: &str = "alert_generated";
    /// An alert was reviewed, escalated, or settled.
    pub const ALERT_RESOLVED: &str = "alert_resolved";

    /// The approval-decision family: every action that moves an approval
    /// request after it was opened.
    pub const DECISION_ACTIONS: &[&str] = &[
        APPROVE,
        REJECT,
        CANCEL,
        STEP_COMPLETED,
        REQUEST_APPROVED,
        ESCALATE,
    ];
}

/// One audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier.
    pub id: EventId,
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
    /// The account the resource belongs to.
    pub account_id: AccountId,
    /// The acting user, when one is known (sweeps have none).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<UserId>,
    /// The role the actor acted under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_role: Option<String>,
    /// What happened (see [`actions`]).
    pub action: String,
    /// Resource type (`workflow`, `approval_request`, `alert`).
    pub resource: String,
    /// Resource identifier, stringified.
    pub resource_id: String,
    /// Action-specific payload.
    pub details: Value,
}

impl AuditEvent {
    /// Creates an event stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        action: &str,
        resource: &str,
        resource_id: String,
        details: Value,
    ) -> Self {
        Self {
            id: EventId::new(),
            timestamp: Utc::now(),
            account_id,
            actor_id: None,
            actor_role: None,
            action: action.to_string(),
            resource: resource.to_string(),
            resource_id,
            details,
        }
    }

    /// Attaches the acting user and role.
    #[must_use]
    pub fn with_actor(mut self, actor_id: UserId, actor_role: &str) -> Self {
        self.actor_id = Some(actor_id);
        self.actor_role = Some(actor_role.to_string());
        self
    }
}

/// A subscriber to engine audit events.
pub trait EventListener: Send + Sync {
    /// Called once per emitted event.
    fn on_event(&self, event: &AuditEvent);
}

impl<F> EventListener for F
where
    F: Fn(&AuditEvent) + Send + Sync,
{
    fn on_event(&self, event: &AuditEvent) {
        self(event);
    }
}

/// Listener registry with isolated dispatch.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener; it receives every subsequently emitted event.
    pub fn subscribe(&self, listener: Arc<dyn EventListener>) {
        match self.listeners.write() {
            Ok(mut listeners) => listeners.push(listener),
            Err(poisoned) => poisoned.into_inner().push(listener),
        }
    }

    /// Emits an event to all listeners.
    ///
    /// Each invocation is wrapped individually; a panicking listener is
    /// logged and skipped so it cannot block delivery to the others or
    /// abort the emitting operation.
    pub fn emit(&self, event: &AuditEvent) {
        let listeners = match self.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for listener in listeners {
            let result = catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
            if result.is_err() {
                warn!(
                    event_id = %event.id,
                    action = %event.action,
                    "audit event listener panicked; skipping"
                );
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.listeners.read().map(|l| l.len()).unwrap_or(0);
        f.debug_struct("EventBus").field("listeners", &count).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_event() -> AuditEvent {
        AuditEvent::new(
            AccountId::new(),
            actions::APPROVAL_REQUESTED,
            "approval_request",
            "req-1".to_string(),
            serde_json::json!({}),
        )
    }

    #[test]
    fn test_all_listeners_receive_event() {
        let bus = EventBus::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&first);
        bus.subscribe(Arc::new(move |_: &AuditEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let counter = Arc::clone(&second);
        bus.subscribe(Arc::new(move |_: &AuditEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        bus.emit(&sample_event());
        bus.emit(&sample_event());
        assert_eq!(first.load(Ordering::SeqCst), 2);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let bus = EventBus::new();
        bus.subscribe(Arc::new(|_: &AuditEvent| {
            panic!("misbehaving observer");
        }));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(Arc::new(move |event: &AuditEvent| {
            sink.lock().unwrap().push(event.action.clone());
        }));

        bus.emit(&sample_event());
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            [actions::APPROVAL_REQUESTED.to_string()]
        );
    }

    #[test]
    fn test_with_actor_stamps_identity() {
        let actor = UserId::new();
        let event = sample_event().with_actor(actor, "risk_manager");
        assert_eq!(event.actor_id, Some(actor));
        assert_eq!(event.actor_role.as_deref(), Some("risk_manager"));
    }

    #[test]
    fn test_decision_family_covers_request_transitions_only() {
        for action in [
            actions::APPROVE,
            actions::REJECT,
            actions::CANCEL,
            actions::STEP_COMPLETED,
            actions::REQUEST_APPROVED,
            actions::ESCALATE,
        ] {
            assert!(actions::DECISION_ACTIONS.contains(&action));
        }
        // Opening a request and alert traffic are outside the family.
        for action in [
            actions::APPROVAL_REQUESTED,
            actions::ALERT_GENERATED,
            actions::ALERT_RESOLVED,
        ] {
            assert!(!actions::DECISION_ACTIONS.contains(&action));
        }
    }
}

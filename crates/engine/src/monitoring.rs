//! Transaction monitoring orchestration.
//!
//! [`MonitoringEngine`] evaluates transactions against an account's rule
//! set, synthesizes alerts for matches, and runs the alert review
//! lifecycle. Scoring and rule matching are pure (`sentra_core`); this
//! layer owns persistence, per-account statistics, and audit events.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::info;

use sentra_core::condition::{Condition, TransactionContext};
use sentra_core::monitoring::{
    AlertClassifier, AlertSeverity, AlertStatus, MonitorStats, MonitoringError, MonitoringRule,
    RuleAction, RuleKind, RuleScanner, TransactionAlert,
};
use sentra_shared::{AccountId, AlertId, EngineConfig, RuleId, UserId};

use crate::event::{AuditEvent, EventBus, actions};
use crate::store::{
    AlertFilter, AlertRepository, InMemoryAlertStore, InMemoryRuleStore, RuleRepository,
    StoreError,
};

/// Input for creating a monitoring rule.
#[derive(Debug, Clone)]
pub struct RuleDraft {
    /// Owning account.
    pub account_id: AccountId,
    /// Human-readable name, used in alert descriptions.
    pub name: String,
    /// What the rule watches for.
    pub kind: RuleKind,
    /// Conditions, all of which must match.
    pub conditions: Vec<Condition>,
    /// Action taken on match; drives alert severity.
    pub action: RuleAction,
    /// Risk weight; `priority / 10` is the score contribution.
    pub priority: u32,
    /// Disabled rules never match.
    pub enabled: bool,
}

/// Result of checking one transaction.
///
/// A check passes when it raised no critical alert and left no alert
/// open. Log-only rules contribute to the risk score without raising an
/// alert, so they never fail a check.
#[derive(Debug, Clone)]
pub struct TransactionCheck {
    /// Whether the transaction cleared monitoring.
    pub passed: bool,
    /// Accumulated risk score, capped at the configured bound.
    pub risk_score: Decimal,
    /// Alerts raised by this check.
    pub alerts: Vec<TransactionAlert>,
    /// Every rule that matched, including log-only ones.
    pub matched_rules: Vec<RuleId>,
}

/// Reviewer's verdict on an open or in-review alert.
#[derive(Debug, Clone)]
pub enum ReviewDisposition {
    /// Take the alert into review without settling it.
    Acknowledge,
    /// Settle the alert with a resolution note.
    Resolve {
        /// Non-empty explanation of the outcome.
        resolution: String,
    },
}

/// Stateful engine for monitoring rules and alerts.
pub struct MonitoringEngine {
    rules: Arc<dyn RuleRepository>,
    alerts: Arc<dyn AlertRepository>,
    events: Arc<EventBus>,
    config: EngineConfig,
    stats: DashMap<AccountId, MonitorStats>,
    alert_locks: DashMap<AlertId, Arc<Mutex<()>>>,
}

impl MonitoringEngine {
    /// Creates an engine over the given stores.
    #[must_use]
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        alerts: Arc<dyn AlertRepository>,
        events: Arc<EventBus>,
        config: EngineConfig,
    ) -> Self {
        Self {
            rules,
            alerts,
            events,
            config,
            stats: DashMap::new(),
            alert_locks: DashMap::new(),
        }
    }

    /// Creates an engine over fresh in-memory stores.
    #[must_use]
    pub fn in_memory(events: Arc<EventBus>, config: EngineConfig) -> Self {
        Self::new(
            Arc::new(InMemoryRuleStore::new()),
            Arc::new(InMemoryAlertStore::new()),
            events,
            config,
        )
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    /// Registers a monitoring rule.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn add_monitoring_rule(
        &self,
        draft: RuleDraft,
    ) -> Result<MonitoringRule, MonitoringError> {
        let rule = MonitoringRule {
            id: RuleId::new(),
            account_id: draft.account_id,
            name: draft.name,
            kind: draft.kind,
            conditions: draft.conditions,
            action: draft.action,
            priority: draft.priority,
            enabled: draft.enabled,
            created_at: Utc::now(),
        };
        self.rules.insert(rule.clone()).await.map_err(map_store)?;
        info!(rule_id = %rule.id, account_id = %rule.account_id, "monitoring rule added");
        Ok(rule)
    }

    /// Removes a monitoring rule.
    ///
    /// # Errors
    ///
    /// Returns `RuleNotFound` if absent.
    pub async fn remove_monitoring_rule(
        &self,
        id: RuleId,
    ) -> Result<MonitoringRule, MonitoringError> {
        match self.rules.remove(id).await {
            Ok(rule) => {
                info!(rule_id = %id, "monitoring rule removed");
                Ok(rule)
            }
            Err(StoreError::NotFound) => Err(MonitoringError::RuleNotFound(id)),
            Err(err) => Err(map_store(err)),
        }
    }

    /// Lists an account's rules in creation order.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn list_rules(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<MonitoringRule>, MonitoringError> {
        self.rules
            .list_for_account(account_id)
            .await
            .map_err(map_store)
    }

    // ------------------------------------------------------------------
    // Transaction checks
    // ------------------------------------------------------------------

    /// Checks one transaction against the account's rule set.
    ///
    /// Every matching rule contributes to the risk score; matching rules
    /// whose action is anything but log-only additionally raise an open
    /// alert, classified from the rule's kind and action.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn check_transaction(
        &self,
        account_id: AccountId,
        ctx: &TransactionContext,
    ) -> Result<TransactionCheck, MonitoringError> {
        let rules = self
            .rules
            .list_for_account(account_id)
            .await
            .map_err(map_store)?;
        let scan = RuleScanner::scan(&rules, ctx, self.config.monitoring.risk_score_cap);

        let now = Utc::now();
        let mut alerts = Vec::new();
        for matched in &scan.matches {
            if matched.rule.action == RuleAction::LogOnly {
                continue;
            }
            let alert = TransactionAlert {
                id: AlertId::new(),
                account_id,
                transaction_id: ctx.transaction_id,
                rule_id: matched.rule.id,
                kind: AlertClassifier::alert_kind(matched.rule.kind),
                severity: AlertClassifier::severity(matched.rule.action),
                status: AlertStatus::Open,
                description: format!(
                    "Rule '{}' matched transaction {}",
                    matched.rule.name, ctx.transaction_id
                ),
                reviewed_by: None,
                resolution: None,
                created_at: now,
                updated_at: now,
            };
            self.alerts.insert(alert.clone()).await.map_err(map_store)?;
            self.events.emit(&AuditEvent::new(
                account_id,
                actions::ALERT_GENERATED,
                "alert",
                alert.id.to_string(),
                json!({
                    "ruleId": matched.rule.id.to_string(),
                    "transactionId": ctx.transaction_id.to_string(),
                    "severity": alert.severity,
                    "type": alert.kind,
                }),
            ));
            alerts.push(alert);
        }

        let has_critical = alerts.iter().any(|a| a.severity == AlertSeverity::Critical);
        let has_open = alerts.iter().any(|a| a.status == AlertStatus::Open);
        let passed = !has_critical && !has_open;

        let mut stats = self.stats.entry(account_id).or_default();
        stats.total_transactions += 1;
        if !scan.matches.is_empty() {
            stats.flagged_transactions += 1;
        }
        stats.alerts_generated += alerts.len() as u64;
        drop(stats);

        if !passed {
            info!(
                account_id = %account_id,
                transaction_id = %ctx.transaction_id,
                risk_score = %scan.risk_score,
                alerts = alerts.len(),
                "transaction flagged by monitoring"
            );
        }
        Ok(TransactionCheck {
            passed,
            risk_score: scan.risk_score,
            matched_rules: scan.matches.iter().map(|m| m.rule.id).collect(),
            alerts,
        })
    }

    // ------------------------------------------------------------------
    // Alert review lifecycle
    // ------------------------------------------------------------------

    /// Lists an account's alerts in creation order, capped at the
    /// configured page size.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn get_alerts(
        &self,
        account_id: AccountId,
        filter: &AlertFilter,
    ) -> Result<Vec<TransactionAlert>, MonitoringError> {
        let mut alerts = self
            .alerts
            .list_for_account(account_id, filter)
            .await
            .map_err(map_store)?;
        alerts.truncate(self.config.listing.max_page_size);
        Ok(alerts)
    }

    /// Reviews an alert: acknowledge takes it into review, resolve
    /// settles it with a note.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAlertTransition` when the lifecycle forbids the
    /// move and `ResolutionRequired` for an empty resolution note.
    pub async fn review_alert(
        &self,
        alert_id: AlertId,
        reviewer: UserId,
        disposition: ReviewDisposition,
    ) -> Result<TransactionAlert, MonitoringError> {
        match disposition {
            ReviewDisposition::Acknowledge => {
                self.transition_alert(alert_id, reviewer, AlertStatus::InReview, None)
                    .await
            }
            ReviewDisposition::Resolve { resolution } => {
                if resolution.trim().is_empty() {
                    return Err(MonitoringError::ResolutionRequired);
                }
                self.transition_alert(alert_id, reviewer, AlertStatus::Resolved, Some(resolution))
                    .await
            }
        }
    }

    /// Escalates an alert for deeper investigation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAlertTransition` when the lifecycle forbids it.
    pub async fn escalate_alert(
        &self,
        alert_id: AlertId,
        reviewer: UserId,
    ) -> Result<TransactionAlert, MonitoringError> {
        self.transition_alert(alert_id, reviewer, AlertStatus::Escalated, None)
            .await
    }

    /// Marks an escalated alert as having a suspicious activity report
    /// filed. Terminal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAlertTransition` unless the alert is escalated.
    pub async fn file_sar(
        &self,
        alert_id: AlertId,
        reviewer: UserId,
    ) -> Result<TransactionAlert, MonitoringError> {
        self.transition_alert(alert_id, reviewer, AlertStatus::SarFiled, None)
            .await
    }

    /// Per-account monitoring statistics since engine start.
    #[must_use]
    pub fn stats(&self, account_id: AccountId) -> MonitorStats {
        self.stats
            .get(&account_id)
            .map(|s| *s)
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn transition_alert(
        &self,
        alert_id: AlertId,
        reviewer: UserId,
        to: AlertStatus,
        resolution: Option<String>,
    ) -> Result<TransactionAlert, MonitoringError> {
        let _guard = self.alert_lock(alert_id).lock_owned().await;
        let mut alert = self
            .alerts
            .get(alert_id)
            .await
            .map_err(map_store)?
            .ok_or(MonitoringError::AlertNotFound(alert_id))?;

        if !alert.status.can_transition_to(to) {
            return Err(MonitoringError::InvalidAlertTransition {
                from: alert.status,
                to,
            });
        }
        let from = alert.status;
        alert.status = to;
        alert.reviewed_by = Some(reviewer);
        if resolution.is_some() {
            alert.resolution = resolution;
        }
        alert.updated_at = Utc::now();
        self.alerts.update(alert.clone()).await.map_err(map_store)?;

        self.events.emit(
            &AuditEvent::new(
                alert.account_id,
                actions::ALERT_RESOLVED,
                "alert",
                alert.id.to_string(),
                json!({ "from": from, "to": to }),
            )
            .with_actor(reviewer, "reviewer"),
        );
        if to.is_terminal() {
            self.alert_locks.remove(&alert_id);
        }
        Ok(alert)
    }

    fn alert_lock(&self, id: AlertId) -> Arc<Mutex<()>> {
        self.alert_locks.entry(id).or_default().clone()
    }
}

fn map_store(err: StoreError) -> MonitoringError {
    match err {
        StoreError::NotFound => {
            MonitoringError::Storage("record vanished during update".to_string())
        }
        StoreError::VersionConflict { expected, actual } => MonitoringError::Conflict(format!(
            "version check failed (expected {expected}, found {actual})"
        )),
        StoreError::Backend(msg) => MonitoringError::Storage(msg),
    }
}

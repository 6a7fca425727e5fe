//! Rule-to-alert classification.
//!
//! Deterministic lookup tables mapping a rule's declared kind to the
//! alert type it raises, and its action to the alert's severity.

use crate::monitoring::types::{AlertKind, AlertSeverity, RuleAction, RuleKind};

/// Stateless classifier for alerts raised by matching rules.
pub struct AlertClassifier;

impl AlertClassifier {
    /// Alert classification for a rule kind.
    #[must_use]
    pub fn alert_kind(kind: RuleKind) -> AlertKind {
        match kind {
            RuleKind::AmountThreshold => AlertKind::ThresholdBreach,
            RuleKind::Velocity => AlertKind::VelocityAnomaly,
            RuleKind::PatternDetection => AlertKind::PatternMatch,
            RuleKind::GeographicRisk | RuleKind::CounterpartyRisk => {
                AlertKind::SuspiciousActivity
            }
        }
    }

    /// Alert severity for a rule action.
    #[must_use]
    pub fn severity(action: RuleAction) -> AlertSeverity {
        match action {
            RuleAction::Flag | RuleAction::LogOnly => AlertSeverity::Low,
            RuleAction::Alert => AlertSeverity::Medium,
            RuleAction::RequireApproval | RuleAction::Escalate => AlertSeverity::High,
            RuleAction::Block => AlertSeverity::Critical,
        }
    }
}

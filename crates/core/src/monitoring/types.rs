//! Monitoring domain types: rules, alerts, and running statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use sentra_shared::{AccountId, AlertId, RuleId, TransactionId, UserId};

use crate::condition::Condition;

/// Classification of what a monitoring rule detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Single-transaction amount threshold.
    AmountThreshold,
    /// Transaction velocity over a window.
    Velocity,
    /// Structural pattern detection (structuring, layering, round-trips).
    PatternDetection,
    /// High-risk jurisdiction or corridor.
    GeographicRisk,
    /// Counterparty-based risk (lists, new counterparties).
    CounterpartyRisk,
}

impl RuleKind {
    /// Returns the string representation of the rule kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AmountThreshold => "amount_threshold",
            Self::Velocity => "velocity",
            Self::PatternDetection => "pattern_detection",
            Self::GeographicRisk => "geographic_risk",
            Self::CounterpartyRisk => "counterparty_risk",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happens when a monitoring rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Flag the transaction for later review.
    Flag,
    /// Raise an alert to the monitoring queue.
    Alert,
    /// Block the transaction.
    Block,
    /// Require the approval workflow to gate the transaction.
    RequireApproval,
    /// Escalate directly to a compliance officer.
    Escalate,
    /// Record the match without raising an alert.
    LogOnly,
}

impl RuleAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Alert => "alert",
            Self::Block => "block",
            Self::RequireApproval => "require_approval",
            Self::Escalate => "escalate",
            Self::LogOnly => "log_only",
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alert classification derived from the matching rule's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// An amount threshold was breached.
    ThresholdBreach,
    /// Transaction velocity was anomalous.
    VelocityAnomaly,
    /// A structural pattern matched.
    PatternMatch,
    /// Catch-all suspicious activity.
    SuspiciousActivity,
}

impl AlertKind {
    /// Returns the string representation of the alert kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThresholdBreach => "threshold_breach",
            Self::VelocityAnomaly => "velocity_anomaly",
            Self::PatternMatch => "pattern_match",
            Self::SuspiciousActivity => "suspicious_activity",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alert severity, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Informational; review at leisure.
    Low = 0,
    /// Should be reviewed soon.
    Medium = 1,
    /// Requires prompt attention.
    High = 2,
    /// Requires immediate action; fails the transaction check.
    Critical = 3,
}

impl AlertSeverity {
    /// Returns the string representation of the severity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alert review lifecycle.
///
/// `Resolved` and `SarFiled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// Newly generated, not yet looked at.
    Open,
    /// Picked up by a reviewer.
    InReview,
    /// Closed without further action.
    Resolved,
    /// Escalated to compliance.
    Escalated,
    /// A suspicious activity report was filed.
    SarFiled,
}

impl AlertStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InReview => "in_review",
            Self::Resolved => "resolved",
            Self::Escalated => "escalated",
            Self::SarFiled => "sar_filed",
        }
    }

    /// Returns true if the status allows the given transition.
    #[must_use]
    pub fn can_transition_to(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Open, Self::InReview | Self::Resolved | Self::Escalated)
                | (Self::InReview, Self::Resolved | Self::Escalated)
                | (Self::Escalated, Self::Resolved | Self::SarFiled)
        )
    }

    /// Returns true if the status is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::SarFiled)
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An independent, always-conjunctive monitoring rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringRule {
    /// Unique identifier.
    pub id: RuleId,
    /// Owning account.
    pub account_id: AccountId,
    /// Human-readable name.
    pub name: String,
    /// What the rule detects; drives alert classification.
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// Conjunctive condition group; all must pass for a match.
    pub conditions: Vec<Condition>,
    /// What happens on a match; drives alert severity.
    pub action: RuleAction,
    /// Rule weight; contributes `priority / 10` to the risk score.
    pub priority: u32,
    /// Disabled rules never match.
    pub enabled: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// An alert raised by a matching monitoring rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionAlert {
    /// Unique identifier.
    pub id: AlertId,
    /// Owning account.
    pub account_id: AccountId,
    /// The transaction that matched.
    pub transaction_id: TransactionId,
    /// The rule that raised the alert.
    pub rule_id: RuleId,
    /// Alert classification.
    pub kind: AlertKind,
    /// Alert severity.
    pub severity: AlertSeverity,
    /// Review lifecycle status.
    pub status: AlertStatus,
    /// Human-readable description (rule name plus match context).
    pub description: String,
    /// Reviewer who picked up or settled the alert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<UserId>,
    /// Disposition note recorded at resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Running statistics for one account's monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStats {
    /// Transactions checked, matching or not.
    pub total_transactions: u64,
    /// Transactions with at least one matching rule.
    pub flagged_transactions: u64,
    /// Alerts generated across all checks.
    pub alerts_generated: u64,
}

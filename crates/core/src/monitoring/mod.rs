//! Rule-based transaction monitoring for Sentra.
//!
//! Monitoring runs in parallel with the approval workflow: every
//! transaction is scored against an account's independent, always
//! conjunctive rules, and matching rules raise alerts outside of the
//! approval chain.
//!
//! # Modules
//!
//! - `types` - Monitoring domain types (MonitoringRule, TransactionAlert)
//! - `error` - Monitoring-specific error types
//! - `classify` - Rule-to-alert type/severity classification
//! - `scan` - Pure rule matching and risk-score accumulation

pub mod classify;
pub mod error;
pub mod scan;
pub mod types;

pub use classify::AlertClassifier;
pub use error::MonitoringError;
pub use scan::{RuleMatch, RuleScanner, TransactionScan};
pub use types::{
    AlertKind, AlertSeverity, AlertStatus, MonitorStats, MonitoringRule, RuleAction, RuleKind,
    TransactionAlert,
};

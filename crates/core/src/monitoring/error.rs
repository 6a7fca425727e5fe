//! Monitoring error types.

use thiserror::Error;

use sentra_shared::{AlertId, RuleId};

use crate::monitoring::types::AlertStatus;

/// Errors that can occur during monitoring operations.
#[derive(Debug, Error)]
pub enum MonitoringError {
    /// Monitoring rule not found.
    #[error("Monitoring rule {0} not found")]
    RuleNotFound(RuleId),

    /// Alert not found.
    #[error("Alert {0} not found")]
    AlertNotFound(AlertId),

    /// Attempted an invalid alert status transition.
    #[error("Invalid alert transition from {from} to {to}")]
    InvalidAlertTransition {
        /// The alert's current status.
        from: AlertStatus,
        /// The attempted target status.
        to: AlertStatus,
    },

    /// A resolution note is required when resolving an alert.
    #[error("Resolution note is required")]
    ResolutionRequired,

    /// Concurrent modification detected by the optimistic version check.
    #[error("Concurrent modification of {0}")]
    Conflict(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl MonitoringError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RuleNotFound(_) | Self::AlertNotFound(_) => 404,
            Self::InvalidAlertTransition { .. } | Self::ResolutionRequired => 422,
            Self::Conflict(_) => 409,
            Self::Storage(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::AlertNotFound(_) => "ALERT_NOT_FOUND",
            Self::InvalidAlertTransition { .. } => "INVALID_ALERT_TRANSITION",
            Self::ResolutionRequired => "RESOLUTION_REQUIRED",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

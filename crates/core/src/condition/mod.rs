//! Declarative condition evaluation for Sentra.
//!
//! This module implements the condition-evaluation contract shared by the
//! workflow trigger matcher and the monitoring rule engine: a condition
//! names a field, an operator, and a target value, and is evaluated against
//! a transaction-shaped context.
//!
//! # Modules
//!
//! - `types` - Condition domain types (Operator, Condition, TransactionContext)
//! - `evaluator` - Total, never-failing operator evaluation
//! - `resolver` - Field name resolution against a transaction context

pub mod evaluator;
pub mod resolver;
pub mod types;

#[cfg(test)]
mod evaluator_props;

pub use evaluator::ConditionEvaluator;
pub use resolver::FieldResolver;
pub use types::{Condition, ConditionLogic, Operator, TransactionContext};

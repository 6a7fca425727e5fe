//! Total, never-failing condition evaluation.
//!
//! The evaluator is a pure function from (resolved value, operator, target)
//! to a boolean. It never panics and never returns an error: operands that
//! cannot be coerced to the shape an operator needs simply fail the
//! comparison. Policy matching must degrade to "no match", not to a fault.

use rust_decimal::Decimal;
use serde_json::Value;

use super::resolver::FieldResolver;
use super::types::{Condition, Operator, TransactionContext};

/// Stateless evaluator for declarative conditions.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluate one operator against a resolved field value.
    ///
    /// `actual` is `None` when the field did not resolve. An absent field
    /// fails every operator except `NotEquals` (absent is not equal to
    /// any present value).
    #[must_use]
    pub fn evaluate(actual: Option<&Value>, operator: Operator, target: &Value) -> bool {
        let Some(actual) = actual else {
            return operator == Operator::NotEquals;
        };

        match operator {
            Operator::Equals => Self::loose_eq(actual, target),
            Operator::NotEquals => !Self::loose_eq(actual, target),
            Operator::GreaterThan => Self::compare(actual, target).is_some_and(|o| o.is_gt()),
            Operator::LessThan => Self::compare(actual, target).is_some_and(|o| o.is_lt()),
            Operator::GreaterOrEqual => Self::compare(actual, target).is_some_and(|o| o.is_ge()),
            Operator::LessOrEqual => Self::compare(actual, target).is_some_and(|o| o.is_le()),
            Operator::Contains => Self::contains(actual, target),
            Operator::In => Self::is_member(actual, target),
        }
    }

    /// Evaluate one condition against a transaction context.
    #[must_use]
    pub fn evaluate_condition(condition: &Condition, ctx: &TransactionContext) -> bool {
        let actual = FieldResolver::resolve(ctx, &condition.field);
        Self::evaluate(actual.as_ref(), condition.operator, &condition.value)
    }

    /// Evaluate a condition group conjunctively.
    ///
    /// Sibling conditions are always combined with AND; a declared `logic`
    /// discriminator is ignored. An empty group matches vacuously.
    #[must_use]
    pub fn all_match(conditions: &[Condition], ctx: &TransactionContext) -> bool {
        conditions.iter().all(|c| Self::evaluate_condition(c, ctx))
    }

    /// Coerce a JSON value to a decimal, if it has a numeric reading.
    ///
    /// Numbers go through their decimal string form so no float arithmetic
    /// is involved; numeric strings parse directly.
    #[must_use]
    pub fn as_decimal(value: &Value) -> Option<Decimal> {
        match value {
            Value::Number(n) => n.to_string().parse().ok(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Coerce a scalar JSON value to its text form.
    fn as_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Numeric comparison; `None` when either side has no numeric reading.
    fn compare(actual: &Value, target: &Value) -> Option<std::cmp::Ordering> {
        let lhs = Self::as_decimal(actual)?;
        let rhs = Self::as_decimal(target)?;
        Some(lhs.cmp(&rhs))
    }

    /// Loose equality: numeric when both sides coerce, then textual for
    /// scalars, then exact JSON equality for everything else.
    fn loose_eq(actual: &Value, target: &Value) -> bool {
        if let (Some(lhs), Some(rhs)) = (Self::as_decimal(actual), Self::as_decimal(target)) {
            return lhs == rhs;
        }
        if let (Some(lhs), Some(rhs)) = (Self::as_text(actual), Self::as_text(target)) {
            return lhs == rhs;
        }
        actual == target
    }

    /// `Contains`: membership when the field value is an array, substring
    /// match when both sides have a text form.
    fn contains(actual: &Value, target: &Value) -> bool {
        if let Value::Array(items) = actual {
            return items.iter().any(|item| Self::loose_eq(item, target));
        }
        match (Self::as_text(actual), Self::as_text(target)) {
            (Some(haystack), Some(needle)) => haystack.contains(&needle),
            _ => false,
        }
    }

    /// `In`: the target must be an array; membership uses loose equality.
    fn is_member(actual: &Value, target: &Value) -> bool {
        match target {
            Value::Array(items) => items.iter().any(|item| Self::loose_eq(actual, item)),
            _ => false,
        }
    }
}

//! Condition domain types shared by triggers and monitoring rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use sentra_shared::TransactionId;

/// Comparison operator used by a declarative condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Loose equality (numeric when both sides coerce, string otherwise).
    Equals,
    /// Negation of `Equals`. An absent field is not equal to any value.
    NotEquals,
    /// Numeric strictly-greater comparison.
    GreaterThan,
    /// Numeric strictly-less comparison.
    LessThan,
    /// Numeric greater-or-equal comparison.
    GreaterOrEqual,
    /// Numeric less-or-equal comparison.
    LessOrEqual,
    /// Substring match, or membership when the field value is an array.
    Contains,
    /// Membership of the field value in the target array.
    In,
}

impl Operator {
    /// Returns the string representation of the operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::GreaterOrEqual => "greater_or_equal",
            Self::LessOrEqual => "less_or_equal",
            Self::Contains => "contains",
            Self::In => "in",
        }
    }

    /// Parses an operator from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "equals" => Some(Self::Equals),
            "not_equals" => Some(Self::NotEquals),
            "greater_than" => Some(Self::GreaterThan),
            "less_than" => Some(Self::LessThan),
            "greater_or_equal" => Some(Self::GreaterOrEqual),
            "less_or_equal" => Some(Self::LessOrEqual),
            "contains" => Some(Self::Contains),
            "in" => Some(Self::In),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared combinator between sibling conditions.
///
/// Carried for wire fidelity only: the evaluator never reads it, and
/// sibling conditions are always combined conjunctively. Callers that
/// need disjunction express it as multiple triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionLogic {
    /// Conjunctive (the only honored semantics).
    And,
    /// Declared but inert; treated as `And`.
    Or,
}

/// A single declarative condition: field, operator, target value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// The field name, resolved by [`crate::condition::FieldResolver`].
    pub field: String,
    /// The comparison operator.
    pub operator: Operator,
    /// The target value to compare against.
    pub value: Value,
    /// Declared combinator; inert (see [`ConditionLogic`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<ConditionLogic>,
}

impl Condition {
    /// Creates a condition with no declared combinator.
    #[must_use]
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            logic: None,
        }
    }
}

/// Transaction-shaped input evaluated by triggers and monitoring rules.
///
/// Well-known fields are typed; anything else rides in the free-form
/// `metadata` bag and is resolvable by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionContext {
    /// The transaction under evaluation.
    pub transaction_id: TransactionId,
    /// Transaction amount.
    pub amount: Decimal,
    /// Transaction type (e.g. `transfer`, `withdrawal`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Currency code.
    pub currency: String,
    /// Source account or address.
    pub source: String,
    /// Destination account or address.
    pub destination: String,
    /// Destination classification (e.g. `internal`, `external`).
    pub destination_type: String,
    /// Upstream risk score, if one was computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<Decimal>,
    /// Free-form metadata, resolvable by field name.
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
}

impl TransactionContext {
    /// Creates a context with the required well-known fields and empty metadata.
    #[must_use]
    pub fn new(
        transaction_id: TransactionId,
        amount: Decimal,
        kind: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id,
            amount,
            kind: kind.into(),
            currency: currency.into(),
            source: String::new(),
            destination: String::new(),
            destination_type: String::new(),
            risk_score: None,
            metadata: serde_json::Map::new(),
        }
    }
}

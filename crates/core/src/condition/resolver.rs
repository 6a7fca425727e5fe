//! Field name resolution against a transaction context.

use serde_json::Value;

use super::types::TransactionContext;

/// Well-known field names recognized by the resolver.
pub const WELL_KNOWN_FIELDS: &[&str] = &[
    "amount",
    "type",
    "currency",
    "source",
    "destination",
    "destinationType",
    "riskScore",
];

/// Maps a named field to a value drawn from a transaction context.
///
/// Well-known fields resolve from the typed context; any other name is
/// looked up in the free-form metadata bag. An unrecognized, absent field
/// resolves to `None` (the evaluator then fails the comparison).
pub struct FieldResolver;

impl FieldResolver {
    /// Resolve a field name to a JSON value.
    ///
    /// Decimal fields resolve to their string form; the evaluator's
    /// numeric coercion reads them back without float round-trips.
    #[must_use]
    pub fn resolve(ctx: &TransactionContext, field: &str) -> Option<Value> {
        match field {
            "amount" => Some(Value::String(ctx.amount.to_string())),
            "type" => Some(Value::String(ctx.kind.clone())),
            "currency" => Some(Value::String(ctx.currency.clone())),
            "source" => Some(Value::String(ctx.source.clone())),
            "destination" => Some(Value::String(ctx.destination.clone())),
            "destinationType" => Some(Value::String(ctx.destination_type.clone())),
            "riskScore" => ctx.risk_score.map(|score| Value::String(score.to_string())),
            _ => ctx.metadata.get(field).cloned(),
        }
    }
}

//! Property-based tests for the condition evaluator.
//!
//! These tests validate the totality and coherence properties of the
//! evaluator: it never panics, equality operators are duals, and numeric
//! ordering operators agree with decimal ordering.

use proptest::prelude::*;
use serde_json::{Value, json};

use crate::condition::evaluator::ConditionEvaluator;
use crate::condition::types::Operator;

/// Strategy for generating arbitrary scalar JSON values.
fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9_-]{0,12}".prop_map(|s| json!(s)),
        any::<bool>().prop_map(|b| json!(b)),
        Just(Value::Null),
    ]
}

/// Strategy for generating every operator.
fn arb_operator() -> impl Strategy<Value = Operator> {
    prop_oneof![
        Just(Operator::Equals),
        Just(Operator::NotEquals),
        Just(Operator::GreaterThan),
        Just(Operator::LessThan),
        Just(Operator::GreaterOrEqual),
        Just(Operator::LessOrEqual),
        Just(Operator::Contains),
        Just(Operator::In),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The evaluator is total: any operand shapes produce a boolean, never a panic.
    #[test]
    fn prop_evaluator_is_total(
        actual in proptest::option::of(arb_scalar()),
        operator in arb_operator(),
        target in arb_scalar()
    ) {
        let _ = ConditionEvaluator::evaluate(actual.as_ref(), operator, &target);
    }

    /// Equals and NotEquals are exact duals for present values.
    #[test]
    fn prop_equals_not_equals_duality(
        actual in arb_scalar(),
        target in arb_scalar()
    ) {
        let eq = ConditionEvaluator::evaluate(Some(&actual), Operator::Equals, &target);
        let ne = ConditionEvaluator::evaluate(Some(&actual), Operator::NotEquals, &target);
        prop_assert_ne!(eq, ne);
    }

    /// Numeric ordering operators agree with integer ordering.
    #[test]
    fn prop_ordering_coherence(lhs in any::<i32>(), rhs in any::<i32>()) {
        let actual = json!(lhs);
        let target = json!(rhs);

        let gt = ConditionEvaluator::evaluate(Some(&actual), Operator::GreaterThan, &target);
        let lt = ConditionEvaluator::evaluate(Some(&actual), Operator::LessThan, &target);
        let ge = ConditionEvaluator::evaluate(Some(&actual), Operator::GreaterOrEqual, &target);
        let le = ConditionEvaluator::evaluate(Some(&actual), Operator::LessOrEqual, &target);

        prop_assert_eq!(gt, lhs > rhs);
        prop_assert_eq!(lt, lhs < rhs);
        prop_assert_eq!(ge, lhs >= rhs);
        prop_assert_eq!(le, lhs <= rhs);
    }

    /// A numeric string and the number it denotes evaluate identically.
    #[test]
    fn prop_numeric_string_coercion(n in any::<i32>(), target in any::<i32>()) {
        let as_number = json!(n);
        let as_string = json!(n.to_string());
        let target = json!(target);

        for op in [
            Operator::Equals,
            Operator::GreaterThan,
            Operator::LessThan,
            Operator::GreaterOrEqual,
            Operator::LessOrEqual,
        ] {
            prop_assert_eq!(
                ConditionEvaluator::evaluate(Some(&as_number), op, &target),
                ConditionEvaluator::evaluate(Some(&as_string), op, &target),
                "operator {}", op
            );
        }
    }

    /// `In` against an array containing the actual value always matches.
    #[test]
    fn prop_in_finds_inserted_member(
        actual in arb_scalar(),
        mut others in proptest::collection::vec(arb_scalar(), 0..5)
    ) {
        others.push(actual.clone());
        let target = Value::Array(others);
        prop_assert!(ConditionEvaluator::evaluate(Some(&actual), Operator::In, &target));
    }
}

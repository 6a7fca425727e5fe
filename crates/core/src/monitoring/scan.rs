//! Pure rule matching and risk-score accumulation.
//!
//! Scanning a transaction against an account's rule set is stateless:
//! the scan evaluates every enabled rule conjunctively and accumulates
//! `priority / 10` per match into a capped risk score. Alert synthesis
//! and statistics live in the stateful engine layer.

use rust_decimal::Decimal;

use crate::condition::{ConditionEvaluator, TransactionContext};
use crate::monitoring::types::MonitoringRule;

/// One matched rule with its risk-score contribution.
#[derive(Debug, Clone)]
pub struct RuleMatch<'a> {
    /// The matching rule.
    pub rule: &'a MonitoringRule,
    /// `priority / 10`, before the total cap.
    pub contribution: Decimal,
}

/// Result of scanning one transaction against a rule set.
#[derive(Debug, Clone)]
pub struct TransactionScan<'a> {
    /// Matched rules in evaluation order.
    pub matches: Vec<RuleMatch<'a>>,
    /// Accumulated risk score, capped.
    pub risk_score: Decimal,
}

/// Stateless scanner for monitoring rules.
pub struct RuleScanner;

impl RuleScanner {
    /// Scan a transaction against a rule set.
    ///
    /// Rules evaluate in priority-descending order (rule id as the tie
    /// key) so match reporting is deterministic. Disabled rules never
    /// match. The accumulated score is capped at `cap` after the scan,
    /// not per contribution.
    #[must_use]
    pub fn scan<'a>(
        rules: &'a [MonitoringRule],
        ctx: &TransactionContext,
        cap: Decimal,
    ) -> TransactionScan<'a> {
        let mut ordered: Vec<&MonitoringRule> = rules.iter().filter(|r| r.enabled).collect();
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));

        let mut matches = Vec::new();
        let mut risk_score = Decimal::ZERO;
        for rule in ordered {
            if ConditionEvaluator::all_match(&rule.conditions, ctx) {
                let contribution = Decimal::from(rule.priority) / Decimal::TEN;
                risk_score += contribution;
                matches.push(RuleMatch { rule, contribution });
            }
        }

        TransactionScan {
            matches,
            risk_score: risk_score.min(cap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, Operator};
    use crate::monitoring::types::{RuleAction, RuleKind};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use sentra_shared::{AccountId, RuleId, TransactionId};
    use serde_json::json;

    fn rule(name: &str, priority: u32, conditions: Vec<Condition>) -> MonitoringRule {
        MonitoringRule {
            id: RuleId::new(),
            account_id: AccountId::new(),
            name: name.to_string(),
            kind: RuleKind::AmountThreshold,
            conditions,
            action: RuleAction::Flag,
            priority,
            enabled: true,
            created_at: Utc::now(),
        }
    }

    fn ctx(amount: Decimal) -> TransactionContext {
        TransactionContext::new(TransactionId::new(), amount, "transfer", "USD")
    }

    #[test]
    fn test_matching_rule_contributes_priority_over_ten() {
        let rules = vec![rule(
            "large amount",
            100,
            vec![Condition::new("amount", Operator::GreaterThan, json!(100_000))],
        )];
        let scan = RuleScanner::scan(&rules, &ctx(dec!(150_000)), dec!(100));
        assert_eq!(scan.matches.len(), 1);
        assert_eq!(scan.matches[0].contribution, dec!(10));
        assert_eq!(scan.risk_score, dec!(10));
    }

    #[test]
    fn test_non_matching_rule_contributes_nothing() {
        let rules = vec![rule(
            "large amount",
            100,
            vec![Condition::new("amount", Operator::GreaterThan, json!(100_000))],
        )];
        let scan = RuleScanner::scan(&rules, &ctx(dec!(50_000)), dec!(100));
        assert!(scan.matches.is_empty());
        assert_eq!(scan.risk_score, Decimal::ZERO);
    }

    #[test]
    fn test_disabled_rule_never_matches() {
        let mut r = rule(
            "disabled",
            100,
            vec![Condition::new("amount", Operator::GreaterThan, json!(0))],
        );
        r.enabled = false;
        let rules = [r];
        let scan = RuleScanner::scan(&rules, &ctx(dec!(100)), dec!(100));
        assert!(scan.matches.is_empty());
    }

    #[test]
    fn test_score_capped_after_accumulation() {
        let always = |name: &str| {
            rule(
                name,
                600,
                vec![Condition::new("amount", Operator::GreaterThan, json!(0))],
            )
        };
        let rules = vec![always("a"), always("b")];
        let scan = RuleScanner::scan(&rules, &ctx(dec!(100)), dec!(100));
        // 60 + 60 = 120, capped to 100.
        assert_eq!(scan.risk_score, dec!(100));
        assert_eq!(scan.matches.len(), 2);
    }

    #[test]
    fn test_priority_descending_evaluation_order() {
        let low = rule(
            "low",
            10,
            vec![Condition::new("amount", Operator::GreaterThan, json!(0))],
        );
        let high = rule(
            "high",
            200,
            vec![Condition::new("amount", Operator::GreaterThan, json!(0))],
        );
        let rules = [low, high];
        let scan = RuleScanner::scan(&rules, &ctx(dec!(100)), dec!(100));
        assert_eq!(scan.matches[0].rule.name, "high");
        assert_eq!(scan.matches[1].rule.name, "low");
    }

    #[test]
    fn test_conditions_are_conjunctive() {
        let rules = vec![rule(
            "usd over 1000",
            50,
            vec![
                Condition::new("amount", Operator::GreaterThan, json!(1000)),
                Condition::new("currency", Operator::Equals, json!("EUR")),
            ],
        )];
        // Amount matches, currency does not.
        let scan = RuleScanner::scan(&rules, &ctx(dec!(5000)), dec!(100));
        assert!(scan.matches.is_empty());
    }
}

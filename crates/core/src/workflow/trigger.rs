//! Workflow trigger matching and specificity resolution.
//!
//! Given an account's active workflows and a transaction context, the
//! matcher selects the single workflow that gates the transaction:
//! candidates are ranked descending by specificity (total condition count
//! across all triggers) and the first one with any fully-matching trigger
//! wins.

use crate::condition::{ConditionEvaluator, TransactionContext};
use crate::workflow::types::{Workflow, WorkflowStatus};

/// Result of a successful trigger match.
#[derive(Debug, Clone)]
pub struct TriggerMatch<'a> {
    /// The selected workflow.
    pub workflow: &'a Workflow,
    /// Indexes (into `workflow.trigger_conditions`) of the triggers that matched.
    pub matched_triggers: Vec<usize>,
}

/// Stateless matcher for workflow trigger conditions.
pub struct TriggerMatcher;

impl TriggerMatcher {
    /// Indexes of the triggers on `workflow` that match the context.
    #[must_use]
    pub fn matching_triggers(workflow: &Workflow, ctx: &TransactionContext) -> Vec<usize> {
        workflow
            .trigger_conditions
            .iter()
            .enumerate()
            .filter(|(_, trigger)| ConditionEvaluator::all_match(&trigger.conditions, ctx))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Select the workflow that gates the given transaction, if any.
    ///
    /// Only `active` workflows participate. Candidates are ranked by a
    /// stable sort descending on specificity, so workflows of equal
    /// specificity keep their input (creation) order — the tie-break is a
    /// documented contract, not an accident. The first candidate with at
    /// least one fully-matching trigger is returned.
    #[must_use]
    pub fn find_matching<'a>(
        workflows: &'a [Workflow],
        ctx: &TransactionContext,
    ) -> Option<TriggerMatch<'a>> {
        let mut candidates: Vec<&Workflow> = workflows
            .iter()
            .filter(|w| w.status == WorkflowStatus::Active)
            .collect();
        candidates.sort_by(|a, b| b.specificity().cmp(&a.specificity()));

        for workflow in candidates {
            let matched = Self::matching_triggers(workflow, ctx);
            if !matched.is_empty() {
                return Some(TriggerMatch {
                    workflow,
                    matched_triggers: matched,
                });
            }
        }
        None
    }

    /// Crude approval-time estimate for a workflow: the sum of all step
    /// timeout windows, expressed in minutes.
    #[must_use]
    pub fn estimated_minutes(workflow: &Workflow) -> i64 {
        workflow
            .steps
            .iter()
            .map(|s| s.timeout_hours.saturating_mul(60))
            .sum()
    }
}

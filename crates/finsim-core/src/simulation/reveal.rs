use serde::{Deserialize, Serialize};

use super::delta::StatementDelta;
use super::engine::EventResult;
use super::model::StatementKind;

/// One line of a staged reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealStep {
    pub statement: StatementKind,
    pub delta: StatementDelta,
}

/// Walks an event's changed lines income statement first, then balance
/// sheet, then cash flow. The caller decides the pacing: pull one step at a
/// time, reveal everything, or rewind.
#[derive(Debug, Clone)]
pub struct RevealSequence {
    steps: Vec<RevealStep>,
    cursor: usize,
}

impl RevealSequence {
    pub fn new(result: &EventResult) -> Self {
        let tagged = |statement: StatementKind, deltas: &[StatementDelta]| {
            deltas
                .iter()
                .cloned()
                .map(move |delta| RevealStep { statement, delta })
                .collect::<Vec<_>>()
        };

        let mut steps = tagged(StatementKind::IncomeStatement, &result.income_statement_deltas);
        steps.extend(tagged(StatementKind::BalanceSheet, &result.balance_sheet_deltas));
        steps.extend(tagged(StatementKind::CashFlowStatement, &result.cash_flow_deltas));

        Self { steps, cursor: 0 }
    }

    pub fn reveal_next(&mut self) -> Option<&RevealStep> {
        let step = self.steps.get(self.cursor)?;
        self.cursor += 1;
        Some(step)
    }

    /// Reveal every remaining step at once.
    pub fn reveal_all(&mut self) -> &[RevealStep] {
        self.cursor = self.steps.len();
        &self.steps
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn revealed(&self) -> &[RevealStep] {
        &self.steps[..self.cursor]
    }

    pub fn remaining(&self) -> usize {
        self.steps.len() - self.cursor
    }

    pub fn total(&self) -> usize {
        self.steps.len()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.steps.len()
    }
}

impl Iterator for RevealSequence {
    type Item = RevealStep;

    fn next(&mut self) -> Option<Self::Item> {
        self.reveal_next().cloned()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for RevealSequence {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::engine::process_event;
    use crate::simulation::events::{EventAssumptions, EventType};
    use crate::simulation::model::create_baseline;
    use rust_decimal_macros::dec;

    fn revenue_result() -> EventResult {
        let a = EventAssumptions::new(dec!(200), dec!(0.25));
        process_event(&create_baseline(), EventType::RevenueCash, &a).unwrap()
    }

    #[test]
    fn test_statement_order_is_is_bs_cfs() {
        let result = revenue_result();
        let kinds: Vec<StatementKind> = RevealSequence::new(&result).map(|s| s.statement).collect();
        let first_bs = kinds.iter().position(|k| *k == StatementKind::BalanceSheet).unwrap();
        let first_cfs = kinds
            .iter()
            .position(|k| *k == StatementKind::CashFlowStatement)
            .unwrap();
        assert_eq!(kinds[0], StatementKind::IncomeStatement);
        assert!(first_bs < first_cfs);
        assert!(kinds[first_bs..first_cfs]
            .iter()
            .all(|k| *k == StatementKind::BalanceSheet));
    }

    #[test]
    fn test_total_matches_delta_count() {
        let result = revenue_result();
        let expected = result.income_statement_deltas.len()
            + result.balance_sheet_deltas.len()
            + result.cash_flow_deltas.len();
        let seq = RevealSequence::new(&result);
        assert_eq!(seq.total(), expected);
        assert_eq!(seq.len(), expected);
    }

    #[test]
    fn test_step_by_step_then_reset() {
        let result = revenue_result();
        let mut seq = RevealSequence::new(&result);
        let first = seq.reveal_next().cloned().unwrap();
        assert_eq!(first.delta.field, "revenue");
        assert_eq!(seq.revealed().len(), 1);
        assert_eq!(seq.remaining(), seq.total() - 1);

        seq.reset();
        assert!(seq.revealed().is_empty());
        assert!(!seq.is_complete());
    }

    #[test]
    fn test_reveal_all_completes() {
        let result = revenue_result();
        let mut seq = RevealSequence::new(&result);
        let all = seq.reveal_all().len();
        assert_eq!(all, seq.total());
        assert!(seq.is_complete());
        assert!(seq.reveal_next().is_none());
    }
}

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Money;

use super::model::{FinancialModel, LineItem};
use super::recalc::round2;

/// Changes at or below this magnitude are treated as rounding noise.
pub const DELTA_EPSILON: Money = dec!(0.001);

/// Before/after comparison of one statement line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementDelta {
    pub field: String,
    pub label: String,
    pub before: Money,
    pub after: Money,
    /// `after - before`, rounded to cents
    pub delta: Money,
}

/// Per-statement delta lists, each in the statement's canonical line order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementDeltas {
    pub income_statement: Vec<StatementDelta>,
    pub balance_sheet: Vec<StatementDelta>,
    pub cash_flow: Vec<StatementDelta>,
}

impl StatementDeltas {
    pub fn is_empty(&self) -> bool {
        self.income_statement.is_empty() && self.balance_sheet.is_empty() && self.cash_flow.is_empty()
    }

    pub fn len(&self) -> usize {
        self.income_statement.len() + self.balance_sheet.len() + self.cash_flow.len()
    }
}

/// Lines whose value moved by more than [`DELTA_EPSILON`] between the two snapshots.
pub fn compute_deltas(before: &FinancialModel, after: &FinancialModel) -> StatementDeltas {
    diff(before, after, true)
}

/// Every line of every statement, changed or not. Unchanged lines carry a
/// zero delta.
pub fn full_deltas(before: &FinancialModel, after: &FinancialModel) -> StatementDeltas {
    diff(before, after, false)
}

fn diff(before: &FinancialModel, after: &FinancialModel, changed_only: bool) -> StatementDeltas {
    StatementDeltas {
        income_statement: diff_lines(
            &before.income_statement.line_items(),
            &after.income_statement.line_items(),
            changed_only,
        ),
        balance_sheet: diff_lines(
            &before.balance_sheet.line_items(),
            &after.balance_sheet.line_items(),
            changed_only,
        ),
        cash_flow: diff_lines(
            &before.cash_flow_statement.line_items(),
            &after.cash_flow_statement.line_items(),
            changed_only,
        ),
    }
}

fn diff_lines(before: &[LineItem], after: &[LineItem], changed_only: bool) -> Vec<StatementDelta> {
    before
        .iter()
        .zip(after)
        .filter_map(|(b, a)| {
            let delta = round2(a.value - b.value);
            if changed_only && delta.abs() <= DELTA_EPSILON {
                return None;
            }
            Some(StatementDelta {
                field: b.field.to_string(),
                label: b.label.to_string(),
                before: b.value,
                after: a.value,
                delta,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FinSimError;
use crate::types::{Money, Rate};
use crate::FinSimResult;

use super::delta::{compute_deltas, StatementDelta};
use super::events::{EventAssumptions, EventType, MAX_AMOUNT};
use super::explanation::{generate_explanation, generate_mental_model};
use super::model::FinancialModel;
use super::recalc::{balance_difference, cash_reconciles, is_balanced, recalculate, recalculated};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Everything a caller needs after applying one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResult {
    pub event_type: EventType,
    pub assumptions: EventAssumptions,
    pub before: FinancialModel,
    pub after: FinancialModel,
    pub figures: EventFigures,
    pub income_statement_deltas: Vec<StatementDelta>,
    pub balance_sheet_deltas: Vec<StatementDelta>,
    pub cash_flow_deltas: Vec<StatementDelta>,
    pub explanation: Vec<String>,
    pub mental_model: Vec<String>,
    pub is_balanced: bool,
    pub cash_reconciles: bool,
}

/// What an event actually moved, read back from the closed-out snapshot.
///
/// The narrative is built from these, so it always agrees with the deltas,
/// including when a loss caps the tax movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFigures {
    /// Assumption amount as entered
    pub amount: Money,
    /// Pre-tax charge or income recognised (depreciation for the year, or the amount)
    pub charge: Money,
    /// Signed change in income tax expense
    pub tax_change: Money,
    /// Signed change in net income, and so in retained earnings
    pub net_income_change: Money,
}

impl EventFigures {
    /// Tax owed on new income or saved by a deductible charge.
    pub fn tax_effect(&self) -> Money {
        self.tax_change.abs()
    }

    /// Size of the net income movement.
    pub fn after_tax(&self) -> Money {
        self.net_income_change.abs()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Apply one event to a copy of `model` and close out the copy.
///
/// The input snapshot is never touched. Only primitive lines are mutated;
/// every subtotal comes from the recalculation pass that follows.
pub fn apply_event(
    model: &FinancialModel,
    event: EventType,
    assumptions: &EventAssumptions,
) -> FinSimResult<FinancialModel> {
    settle_event(model, event, assumptions).map(|(next, _)| next)
}

/// Apply an event and assemble the before/after bundle with deltas and
/// narrative.
pub fn process_event(
    model: &FinancialModel,
    event: EventType,
    assumptions: &EventAssumptions,
) -> FinSimResult<EventResult> {
    let before = model.clone();
    let (after, figures) = settle_event(model, event, assumptions)?;
    let deltas = compute_deltas(&before, &after);

    let balanced = is_balanced(&after);
    let reconciles = cash_reconciles(&after);
    debug!(
        event = %event,
        amount = %assumptions.amount,
        tax_change = %figures.tax_change,
        changed_lines = deltas.len(),
        "event applied"
    );
    if !balanced {
        warn!(
            event = %event,
            difference = %balance_difference(&after),
            "balance sheet does not balance after event"
        );
    }
    if !reconciles {
        warn!(event = %event, "ending cash does not reconcile to balance sheet cash");
    }

    Ok(EventResult {
        event_type: event,
        assumptions: assumptions.clone(),
        before,
        after,
        figures,
        income_statement_deltas: deltas.income_statement,
        balance_sheet_deltas: deltas.balance_sheet,
        cash_flow_deltas: deltas.cash_flow,
        explanation: generate_explanation(event, assumptions, &figures),
        mental_model: generate_mental_model(event, &figures),
        is_balanced: balanced,
        cash_reconciles: reconciles,
    })
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// Two passes. The pre-tax legs and the nominal tax go in first and the
/// income statement is closed out; whatever taxes and net income actually
/// moved is then carried to retained earnings, CFS net income and cash.
fn settle_event(
    model: &FinancialModel,
    event: EventType,
    assumptions: &EventAssumptions,
) -> FinSimResult<(FinancialModel, EventFigures)> {
    assumptions.validate()?;
    model.check_bounds()?;
    check_feasibility(model, event, assumptions)?;

    if assumptions.useful_life.is_some() && !event.uses_useful_life() {
        debug!(event = %event, "useful_life ignored for this event");
    }

    let charge = pre_tax_charge(event, assumptions)?;
    let mut next = recalculated(model.clone());
    let opening_ebt = next.income_statement.ebt;
    let opening_taxes = next.income_statement.taxes;
    let opening_income = next.income_statement.net_income;

    post_pre_tax_legs(&mut next, event, assumptions.amount, charge);
    next.income_statement.taxes += nominal_tax_change(event, charge, assumptions.tax_rate, opening_ebt);
    recalculate(&mut next);

    let figures = EventFigures {
        amount: assumptions.amount,
        charge,
        tax_change: next.income_statement.taxes - opening_taxes,
        net_income_change: next.income_statement.net_income - opening_income,
    };
    if figures.tax_change.abs() < (charge * assumptions.tax_rate).abs() - dec!(0.01) {
        debug!(
            event = %event,
            tax_change = %figures.tax_change,
            "tax movement limited by non-positive pre-tax income"
        );
    }

    post_income(&mut next, &figures);
    recalculate(&mut next);
    Ok((next, figures))
}

/// Depreciation for the year when a useful life is given, else the amount.
fn pre_tax_charge(event: EventType, assumptions: &EventAssumptions) -> FinSimResult<Money> {
    let amount = assumptions.amount;
    let charge = match (event, assumptions.useful_life) {
        (EventType::Depreciation, Some(life)) => amount.checked_div(life),
        _ => Some(amount),
    };
    charge
        .filter(|c| *c <= MAX_AMOUNT)
        .ok_or_else(|| FinSimError::ArithmeticOverflow {
            context: format!("{event} charge on {amount}"),
        })
}

/// Tax on the part of EBT that is above zero before or after the event.
/// Income below zero EBT is untaxed and a deduction cannot push taxes
/// negative.
fn nominal_tax_change(event: EventType, charge: Money, rate: Rate, opening_ebt: Money) -> Money {
    let closing_ebt = match event {
        EventType::RevenueCredit | EventType::RevenueCash => opening_ebt + charge,
        EventType::Depreciation | EventType::AccruedExpense | EventType::WriteDown => {
            opening_ebt - charge
        }
        _ => return Decimal::ZERO,
    };
    (closing_ebt.max(Decimal::ZERO) - opening_ebt.max(Decimal::ZERO)) * rate
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn check_feasibility(
    model: &FinancialModel,
    event: EventType,
    assumptions: &EventAssumptions,
) -> FinSimResult<()> {
    let bs = &model.balance_sheet;
    match event {
        EventType::PayDownDebt if assumptions.amount > bs.long_term_debt => {
            Err(FinSimError::FinancialImpossibility(format!(
                "Repayment of {} exceeds long-term debt of {}",
                assumptions.amount, bs.long_term_debt
            )))
        }
        EventType::WriteDown => {
            let half = assumptions.amount / dec!(2);
            if half > bs.goodwill || half > bs.intangibles {
                Err(FinSimError::FinancialImpossibility(format!(
                    "Write-down of {} needs {} each of goodwill ({}) and intangibles ({})",
                    assumptions.amount, half, bs.goodwill, bs.intangibles
                )))
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Mutation rules
// ---------------------------------------------------------------------------

/// Every leg of an event except the ones that follow net income.
fn post_pre_tax_legs(model: &mut FinancialModel, event: EventType, a: Money, charge: Money) {
    let is = &mut model.income_statement;
    let bs = &mut model.balance_sheet;
    let cfs = &mut model.cash_flow_statement;

    match event {
        EventType::BuyPpeCash => {
            bs.cash -= a;
            bs.ppe += a;
            cfs.capital_expenditures -= a;
        }
        EventType::BuyPpeDebt => {
            bs.ppe += a;
            bs.long_term_debt += a;
            cfs.capital_expenditures -= a;
            cfs.debt_issuance += a;
        }
        EventType::Depreciation => {
            is.depreciation += charge;
            bs.accumulated_depreciation += charge;
            cfs.depreciation += charge;
        }
        EventType::IssueEquity => {
            bs.cash += a;
            bs.common_stock += a;
            cfs.equity_issuance += a;
        }
        EventType::PayDownDebt => {
            bs.cash -= a;
            bs.long_term_debt -= a;
            cfs.debt_repayment += a;
        }
        EventType::IncreaseInventory => {
            bs.cash -= a;
            bs.inventory += a;
            cfs.change_in_inventory -= a;
        }
        EventType::IncreaseAr => {
            bs.accounts_receivable += a;
            cfs.change_in_ar -= a;
            bs.cash -= a;
        }
        EventType::RevenueCredit => {
            is.revenue += a;
            bs.accounts_receivable += a;
            cfs.change_in_ar -= a;
        }
        EventType::RevenueCash => {
            is.revenue += a;
            bs.cash += a;
        }
        EventType::AccruedExpense => {
            is.sga += a;
            bs.accrued_expenses += a;
            cfs.change_in_accrued_expenses += a;
        }
        EventType::PrepaidExpense => {
            bs.cash -= a;
            bs.prepaid_expenses += a;
            cfs.change_in_prepaid_expenses -= a;
        }
        EventType::WriteDown => {
            let half = a / dec!(2);
            bs.goodwill -= half;
            bs.intangibles -= half;
            is.sga += a;
            cfs.amortization += a;
        }
    }
}

/// Taxes settle in cash in the period they arise.
fn post_income(model: &mut FinancialModel, f: &EventFigures) {
    model.balance_sheet.retained_earnings += f.net_income_change;
    model.cash_flow_statement.net_income += f.net_income_change;
    model.balance_sheet.cash -= f.tax_change;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::model::create_baseline;

    fn assumptions(amount: Decimal) -> EventAssumptions {
        EventAssumptions::new(amount, dec!(0.25))
    }

    #[test]
    fn test_every_event_balances_and_reconciles() {
        let base = create_baseline();
        for event in EventType::ALL {
            let a = assumptions(dec!(100)).with_useful_life(dec!(10));
            let result = process_event(&base, event, &a).unwrap();
            assert!(result.is_balanced, "{event} left the balance sheet unbalanced");
            assert!(result.cash_reconciles, "{event} broke the cash reconciliation");
        }
    }

    #[test]
    fn test_input_snapshot_untouched() {
        let base = create_baseline();
        let _ = apply_event(&base, EventType::IssueEquity, &assumptions(dec!(250))).unwrap();
        assert_eq!(base, create_baseline());
    }

    #[test]
    fn test_buy_ppe_cash() {
        let base = create_baseline();
        let after = apply_event(&base, EventType::BuyPpeCash, &assumptions(dec!(100))).unwrap();
        assert_eq!(after.balance_sheet.cash, dec!(400));
        assert_eq!(after.balance_sheet.ppe, dec!(1100));
        assert_eq!(after.balance_sheet.total_assets, base.balance_sheet.total_assets);
        assert_eq!(after.cash_flow_statement.cash_from_investing, dec!(-100));
        assert_eq!(after.income_statement, base.income_statement);
    }

    #[test]
    fn test_buy_ppe_debt_nets_to_zero_cash() {
        let base = create_baseline();
        let after = apply_event(&base, EventType::BuyPpeDebt, &assumptions(dec!(300))).unwrap();
        assert_eq!(after.balance_sheet.long_term_debt, dec!(800));
        assert_eq!(after.balance_sheet.total_assets, dec!(2400));
        assert_eq!(after.cash_flow_statement.net_change_in_cash, dec!(295));
        assert_eq!(after.balance_sheet.cash, dec!(500));
    }

    #[test]
    fn test_depreciation_with_useful_life() {
        let base = create_baseline();
        let a = assumptions(dec!(500)).with_useful_life(dec!(10));
        let after = apply_event(&base, EventType::Depreciation, &a).unwrap();
        assert_eq!(after.income_statement.depreciation, dec!(100));
        assert_eq!(after.income_statement.taxes, dec!(62.5));
        assert_eq!(after.income_statement.net_income, dec!(187.5));
        assert_eq!(after.balance_sheet.accumulated_depreciation, dec!(250));
        assert_eq!(after.balance_sheet.retained_earnings, dec!(462.5));
        assert_eq!(after.balance_sheet.cash, dec!(512.5));
        assert_eq!(after.cash_flow_statement.net_income, after.income_statement.net_income);
    }

    #[test]
    fn test_depreciation_without_useful_life_charges_full_amount() {
        let base = create_baseline();
        let after = apply_event(&base, EventType::Depreciation, &assumptions(dec!(40))).unwrap();
        assert_eq!(after.income_statement.depreciation, dec!(90));
        assert_eq!(after.balance_sheet.retained_earnings, dec!(470));
    }

    #[test]
    fn test_issue_equity() {
        let base = create_baseline();
        let after = apply_event(&base, EventType::IssueEquity, &assumptions(dec!(200))).unwrap();
        assert_eq!(after.balance_sheet.cash, dec!(700));
        assert_eq!(after.balance_sheet.common_stock, dec!(1000));
        assert_eq!(after.cash_flow_statement.cash_from_financing, dec!(200));
    }

    #[test]
    fn test_pay_down_debt() {
        let base = create_baseline();
        let after = apply_event(&base, EventType::PayDownDebt, &assumptions(dec!(500))).unwrap();
        assert_eq!(after.balance_sheet.long_term_debt, Decimal::ZERO);
        assert_eq!(after.balance_sheet.cash, Decimal::ZERO);
        assert_eq!(after.cash_flow_statement.cash_from_financing, dec!(-500));
    }

    #[test]
    fn test_pay_down_more_than_outstanding_rejected() {
        let base = create_baseline();
        let err = apply_event(&base, EventType::PayDownDebt, &assumptions(dec!(500.01))).unwrap_err();
        assert!(matches!(err, FinSimError::FinancialImpossibility(_)));
    }

    #[test]
    fn test_working_capital_events() {
        let base = create_baseline();
        let inv = apply_event(&base, EventType::IncreaseInventory, &assumptions(dec!(50))).unwrap();
        assert_eq!(inv.cash_flow_statement.changes_in_working_capital, dec!(-50));
        assert_eq!(inv.balance_sheet.inventory, dec!(200));

        let ar = apply_event(&base, EventType::IncreaseAr, &assumptions(dec!(50))).unwrap();
        assert_eq!(ar.balance_sheet.accounts_receivable, dec!(250));
        assert_eq!(ar.cash_flow_statement.change_in_ar, dec!(-50));
        assert_eq!(ar.balance_sheet.cash, dec!(450));

        let pre = apply_event(&base, EventType::PrepaidExpense, &assumptions(dec!(30))).unwrap();
        assert_eq!(pre.balance_sheet.prepaid_expenses, dec!(80));
        assert_eq!(pre.cash_flow_statement.change_in_prepaid_expenses, dec!(-30));
    }

    #[test]
    fn test_revenue_on_credit_pays_tax_in_cash() {
        let base = create_baseline();
        let after = apply_event(&base, EventType::RevenueCredit, &assumptions(dec!(200))).unwrap();
        assert_eq!(after.income_statement.revenue, dec!(1200));
        assert_eq!(after.income_statement.taxes, dec!(125));
        assert_eq!(after.balance_sheet.accounts_receivable, dec!(400));
        assert_eq!(after.balance_sheet.retained_earnings, dec!(650));
        assert_eq!(after.balance_sheet.cash, dec!(450));
        // +150 net income, -200 AR build
        assert_eq!(after.cash_flow_statement.cash_from_operations, dec!(245));
    }

    #[test]
    fn test_revenue_cash() {
        let base = create_baseline();
        let after = apply_event(&base, EventType::RevenueCash, &assumptions(dec!(200))).unwrap();
        assert_eq!(after.income_statement.revenue, dec!(1200));
        assert_eq!(after.income_statement.taxes, dec!(125));
        assert_eq!(after.balance_sheet.cash, dec!(650));
        assert_eq!(after.balance_sheet.retained_earnings, dec!(650));
    }

    #[test]
    fn test_accrued_expense() {
        let base = create_baseline();
        let after = apply_event(&base, EventType::AccruedExpense, &assumptions(dec!(100))).unwrap();
        assert_eq!(after.income_statement.sga, dec!(300));
        assert_eq!(after.income_statement.taxes, dec!(50));
        assert_eq!(after.income_statement.net_income, dec!(150));
        assert_eq!(after.balance_sheet.accrued_expenses, dec!(200));
        assert_eq!(after.balance_sheet.retained_earnings, dec!(425));
        assert_eq!(after.balance_sheet.cash, dec!(525));
    }

    #[test]
    fn test_write_down_splits_goodwill_and_intangibles() {
        let base = create_baseline();
        let after = apply_event(&base, EventType::WriteDown, &assumptions(dec!(100))).unwrap();
        assert_eq!(after.balance_sheet.goodwill, dec!(250));
        assert_eq!(after.balance_sheet.intangibles, dec!(50));
        assert_eq!(after.income_statement.sga, dec!(300));
        assert_eq!(after.cash_flow_statement.amortization, dec!(120));
        assert_eq!(after.balance_sheet.retained_earnings, dec!(425));
    }

    #[test]
    fn test_write_down_beyond_intangibles_rejected() {
        let base = create_baseline();
        let err = apply_event(&base, EventType::WriteDown, &assumptions(dec!(201))).unwrap_err();
        assert!(matches!(err, FinSimError::FinancialImpossibility(_)));
        assert!(apply_event(&base, EventType::WriteDown, &assumptions(dec!(200))).is_ok());
    }

    #[test]
    fn test_invalid_assumptions_rejected_before_mutation() {
        let base = create_baseline();
        let err = process_event(&base, EventType::BuyPpeCash, &assumptions(dec!(-1))).unwrap_err();
        assert!(matches!(err, FinSimError::InvalidInput { .. }));

        let zero_life = assumptions(dec!(100)).with_useful_life(Decimal::ZERO);
        let err = process_event(&base, EventType::Depreciation, &zero_life).unwrap_err();
        assert!(matches!(err, FinSimError::InvalidInput { ref field, .. } if field == "useful_life"));
    }

    #[test]
    fn test_figures_for_balance_sheet_only_event_have_no_tax() {
        let result = process_event(&create_baseline(), EventType::IssueEquity, &assumptions(dec!(80))).unwrap();
        assert_eq!(result.figures.tax_change, Decimal::ZERO);
        assert_eq!(result.figures.net_income_change, Decimal::ZERO);
        assert_eq!(result.figures.charge, dec!(80));
    }

    #[test]
    fn test_figures_for_depreciation() {
        let a = assumptions(dec!(500)).with_useful_life(dec!(10));
        let f = process_event(&create_baseline(), EventType::Depreciation, &a).unwrap().figures;
        assert_eq!(f.charge, dec!(50));
        assert_eq!(f.tax_change, dec!(-12.5));
        assert_eq!(f.net_income_change, dec!(-37.5));
        assert_eq!(f.tax_effect(), dec!(12.5));
        assert_eq!(f.after_tax(), dec!(37.5));
    }

    #[test]
    fn test_expense_pushing_ebt_negative_caps_tax_saving() {
        let base = create_baseline();
        let result = process_event(&base, EventType::AccruedExpense, &assumptions(dec!(400))).unwrap();
        let after = &result.after;
        assert_eq!(after.income_statement.ebt, dec!(-100));
        assert_eq!(after.income_statement.taxes, Decimal::ZERO);
        assert_eq!(after.income_statement.net_income, dec!(-100));
        assert_eq!(after.cash_flow_statement.net_income, dec!(-100));
        // 500 plug less the full 325 drop in net income
        assert_eq!(after.balance_sheet.retained_earnings, dec!(175));
        assert_eq!(after.balance_sheet.cash, dec!(575));
        assert_eq!(result.figures.tax_change, dec!(-75));
        assert_eq!(result.figures.net_income_change, dec!(-325));
        assert!(result.is_balanced);
        assert!(result.cash_reconciles);
    }

    #[test]
    fn test_revenue_only_taxed_above_zero_ebt() {
        let base = create_baseline();
        let loss = apply_event(&base, EventType::AccruedExpense, &assumptions(dec!(400))).unwrap();
        let result = process_event(&loss, EventType::RevenueCash, &assumptions(dec!(200))).unwrap();
        assert_eq!(result.after.income_statement.ebt, dec!(100));
        assert_eq!(result.after.income_statement.taxes, dec!(25));
        assert_eq!(result.figures.tax_change, dec!(25));
        assert_eq!(result.figures.net_income_change, dec!(175));
        assert_eq!(result.after.balance_sheet.cash, dec!(750));
        assert!(result.is_balanced);
        assert!(result.cash_reconciles);
    }

    #[test]
    fn test_revenue_inside_a_loss_moves_no_tax() {
        let base = create_baseline();
        let loss = apply_event(&base, EventType::AccruedExpense, &assumptions(dec!(400))).unwrap();
        let result = process_event(&loss, EventType::RevenueCredit, &assumptions(dec!(50))).unwrap();
        assert_eq!(result.figures.tax_change, Decimal::ZERO);
        assert_eq!(result.figures.net_income_change, dec!(50));
        assert_eq!(result.after.balance_sheet.cash, loss.balance_sheet.cash);
    }

    #[test]
    fn test_microscopic_useful_life_rejected_without_panic() {
        let a = assumptions(dec!(100)).with_useful_life(Decimal::new(1, 28));
        let err = process_event(&create_baseline(), EventType::Depreciation, &a).unwrap_err();
        assert!(matches!(err, FinSimError::InvalidInput { ref field, .. } if field == "useful_life"));
    }

    #[test]
    fn test_maximum_decimal_amount_rejected_without_panic() {
        let a = assumptions(Decimal::MAX);
        for event in EventType::ALL {
            let err = process_event(&create_baseline(), event, &a).unwrap_err();
            assert!(matches!(err, FinSimError::InvalidInput { ref field, .. } if field == "amount"));
        }
    }

    #[test]
    fn test_oversized_snapshot_rejected_without_panic() {
        let mut model = create_baseline();
        model.balance_sheet.cash = Decimal::MAX;
        let err = process_event(&model, EventType::IssueEquity, &assumptions(dec!(1))).unwrap_err();
        assert!(matches!(err, FinSimError::InvalidInput { ref field, .. } if field == "model.cash"));
    }

    #[test]
    fn test_depreciation_charge_above_ceiling_is_overflow() {
        let a = EventAssumptions {
            amount: MAX_AMOUNT,
            tax_rate: dec!(0.25),
            useful_life: Some(dec!(0.5)),
        };
        assert!(matches!(
            pre_tax_charge(EventType::Depreciation, &a),
            Err(FinSimError::ArithmeticOverflow { .. })
        ));
        assert_eq!(pre_tax_charge(EventType::IssueEquity, &a).unwrap(), MAX_AMOUNT);
    }

    #[test]
    fn test_zero_tax_rate_moves_no_tax() {
        let base = create_baseline();
        let a = EventAssumptions::new(dec!(100), Decimal::ZERO);
        let after = apply_event(&base, EventType::RevenueCredit, &a).unwrap();
        assert_eq!(after.income_statement.taxes, dec!(75));
        assert_eq!(after.balance_sheet.cash, dec!(500));
        assert!(is_balanced(&after));
    }
}

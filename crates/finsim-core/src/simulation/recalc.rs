use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::types::{Money, Rate};

use super::model::FinancialModel;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Effective tax rate assumed when earnings before tax are not positive.
pub const FALLBACK_TAX_RATE: Rate = dec!(0.25);

/// Maximum gap between assets and liabilities + equity that still counts as balanced.
pub const BALANCE_TOLERANCE: Money = dec!(0.01);

// ---------------------------------------------------------------------------
// Recalculation
// ---------------------------------------------------------------------------

/// Re-derive every subtotal of the snapshot from its primitive line items.
///
/// Order matters: income statement, then balance sheet, then cash flow.
/// `taxes` is a primitive that event handlers adjust directly (tax shields,
/// tax on new revenue); this pass only re-derives the lines that depend on
/// it. Running it twice gives the same result as running it once.
pub fn recalculate(model: &mut FinancialModel) {
    let is = &mut model.income_statement;
    is.gross_profit = is.revenue - is.cogs;
    is.ebit = is.gross_profit - is.sga - is.depreciation - is.amortization;
    is.ebt = is.ebit - is.interest_expense;
    is.taxes = derived_taxes(is.ebt, is.taxes);
    is.net_income = is.ebt - is.taxes;

    let bs = &mut model.balance_sheet;
    bs.total_current_assets =
        bs.cash + bs.accounts_receivable + bs.inventory + bs.prepaid_expenses;
    bs.net_ppe = bs.ppe - bs.accumulated_depreciation;
    bs.total_assets = bs.total_current_assets + bs.net_ppe + bs.goodwill + bs.intangibles;
    bs.total_current_liabilities = bs.accounts_payable + bs.accrued_expenses + bs.current_debt;
    bs.total_liabilities = bs.total_current_liabilities + bs.long_term_debt;
    bs.total_equity = bs.common_stock + bs.retained_earnings;
    bs.total_liabilities_and_equity = bs.total_liabilities + bs.total_equity;

    let cfs = &mut model.cash_flow_statement;
    cfs.changes_in_working_capital = cfs.change_in_ar
        + cfs.change_in_inventory
        + cfs.change_in_ap
        + cfs.change_in_accrued_expenses
        + cfs.change_in_prepaid_expenses;
    cfs.cash_from_operations =
        cfs.net_income + cfs.depreciation + cfs.amortization + cfs.changes_in_working_capital;
    cfs.cash_from_investing = cfs.capital_expenditures;
    cfs.cash_from_financing =
        cfs.debt_issuance - cfs.debt_repayment + cfs.equity_issuance - cfs.dividends_paid;
    cfs.net_change_in_cash =
        cfs.cash_from_operations + cfs.cash_from_investing + cfs.cash_from_financing;
    cfs.ending_cash = cfs.beginning_cash + cfs.net_change_in_cash;
}

/// By-value form of [`recalculate`].
pub fn recalculated(mut model: FinancialModel) -> FinancialModel {
    recalculate(&mut model);
    model
}

/// Tax line re-derived at the rate the current line implies.
///
/// The implied rate is `taxes / ebt`, so a snapshot that is already closed
/// out keeps its taxes exactly. No tax is owed when EBT is not positive.
fn derived_taxes(ebt: Money, taxes: Money) -> Money {
    if ebt <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let rate = effective_tax_rate(ebt, taxes);
    ebt.checked_mul(rate)
        .map_or_else(|| round2(ebt * FALLBACK_TAX_RATE), round2)
}

/// Rate implied by the current tax line, or the fallback when the ratio
/// leaves the decimal range.
fn effective_tax_rate(ebt: Money, taxes: Money) -> Rate {
    taxes.checked_div(ebt).unwrap_or(FALLBACK_TAX_RATE)
}

// ---------------------------------------------------------------------------
// Balance validation
// ---------------------------------------------------------------------------

/// Total assets minus total liabilities and equity.
pub fn balance_difference(model: &FinancialModel) -> Money {
    let bs = &model.balance_sheet;
    bs.total_assets - bs.total_liabilities_and_equity
}

/// True when the accounting identity holds within [`BALANCE_TOLERANCE`].
pub fn is_balanced(model: &FinancialModel) -> bool {
    balance_difference(model).abs() < BALANCE_TOLERANCE
}

/// True when the cash flow statement's ending cash matches balance sheet cash.
pub fn cash_reconciles(model: &FinancialModel) -> bool {
    (model.cash_flow_statement.ending_cash - model.balance_sheet.cash).abs() < BALANCE_TOLERANCE
}

/// Round to cents, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::model::create_baseline;

    #[test]
    fn test_recalculate_is_idempotent_on_baseline() {
        let once = recalculated(create_baseline());
        let twice = recalculated(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_taxes_preserved_when_ebt_positive() {
        let mut model = create_baseline();
        model.income_statement.taxes = dec!(62.5);
        model.income_statement.depreciation += dec!(50);
        recalculate(&mut model);
        assert_eq!(model.income_statement.ebt, dec!(250));
        assert_eq!(model.income_statement.taxes, dec!(62.5));
        assert_eq!(model.income_statement.net_income, dec!(187.5));
    }

    #[test]
    fn test_taxes_zero_when_ebt_negative() {
        let mut model = create_baseline();
        model.income_statement.sga += dec!(1000);
        recalculate(&mut model);
        assert_eq!(model.income_statement.ebt, dec!(-700));
        assert_eq!(model.income_statement.taxes, Decimal::ZERO);
        assert_eq!(model.income_statement.net_income, dec!(-700));

        let again = recalculated(model.clone());
        assert_eq!(again, model);
    }

    #[test]
    fn test_taxes_zero_when_ebt_exactly_zero() {
        let mut model = create_baseline();
        model.income_statement.sga += dec!(300);
        recalculate(&mut model);
        assert_eq!(model.income_statement.ebt, Decimal::ZERO);
        assert_eq!(model.income_statement.taxes, Decimal::ZERO);
    }

    #[test]
    fn test_taxes_rounded_to_cents() {
        let mut model = create_baseline();
        model.income_statement.taxes = dec!(75.004);
        recalculate(&mut model);
        assert_eq!(model.income_statement.taxes, dec!(75));
    }

    #[test]
    fn test_balance_sheet_subtotals() {
        let mut model = create_baseline();
        model.balance_sheet.cash = dec!(600);
        model.balance_sheet.long_term_debt = dec!(600);
        recalculate(&mut model);
        let bs = &model.balance_sheet;
        assert_eq!(bs.total_current_assets, dec!(1000));
        assert_eq!(bs.total_assets, dec!(2200));
        assert_eq!(bs.total_liabilities, dec!(900));
        assert_eq!(bs.total_liabilities_and_equity, dec!(2200));
        assert!(is_balanced(&model));
    }

    #[test]
    fn test_cash_flow_totals() {
        let mut model = create_baseline();
        let cfs = &mut model.cash_flow_statement;
        cfs.capital_expenditures = dec!(-100);
        cfs.debt_issuance = dec!(40);
        cfs.debt_repayment = dec!(10);
        cfs.dividends_paid = dec!(5);
        cfs.change_in_ar = dec!(-20);
        recalculate(&mut model);
        let cfs = &model.cash_flow_statement;
        assert_eq!(cfs.changes_in_working_capital, dec!(-20));
        assert_eq!(cfs.cash_from_operations, dec!(275));
        assert_eq!(cfs.cash_from_investing, dec!(-100));
        assert_eq!(cfs.cash_from_financing, dec!(25));
        assert_eq!(cfs.net_change_in_cash, dec!(200));
        assert_eq!(cfs.ending_cash, dec!(405));
    }

    #[test]
    fn test_unbalanced_snapshot_is_reported_not_fixed() {
        let mut model = create_baseline();
        model.balance_sheet.cash += dec!(10);
        recalculate(&mut model);
        assert!(!is_balanced(&model));
        assert_eq!(balance_difference(&model), dec!(10));
        assert!(!cash_reconciles(&model));
    }

    #[test]
    fn test_tolerance_boundary() {
        let mut model = create_baseline();
        model.balance_sheet.cash += dec!(0.009);
        recalculate(&mut model);
        assert!(is_balanced(&model));

        model.balance_sheet.cash += dec!(0.001);
        recalculate(&mut model);
        assert!(!is_balanced(&model));
    }

    #[test]
    fn test_tiny_ebt_with_huge_taxes_does_not_panic() {
        let mut model = create_baseline();
        model.income_statement.sga = dec!(499.9999999999);
        model.income_statement.taxes = dec!(1000000000000000000);
        recalculate(&mut model);
        assert_eq!(model.income_statement.ebt, dec!(0.0000000001));
        assert_eq!(model.income_statement.taxes, dec!(1000000000000000000));
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round2(dec!(2.344)), dec!(2.34));
    }
}

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinSimError;
use crate::types::Money;
use crate::FinSimResult;

use super::recalc::recalculate;

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// Income statement for the simulated period.
///
/// `gross_profit`, `ebit`, `ebt` and `net_income` are derived; everything
/// else is a primitive that event handlers may adjust.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub revenue: Money,
    pub cogs: Money,
    pub gross_profit: Money,
    pub sga: Money,
    pub depreciation: Money,
    pub amortization: Money,
    pub ebit: Money,
    pub interest_expense: Money,
    pub ebt: Money,
    pub taxes: Money,
    pub net_income: Money,
}

/// Balance sheet at the end of the simulated period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub cash: Money,
    pub accounts_receivable: Money,
    pub inventory: Money,
    pub prepaid_expenses: Money,
    pub total_current_assets: Money,
    /// Gross PP&E
    pub ppe: Money,
    pub accumulated_depreciation: Money,
    pub net_ppe: Money,
    pub goodwill: Money,
    pub intangibles: Money,
    pub total_assets: Money,
    pub accounts_payable: Money,
    pub accrued_expenses: Money,
    pub current_debt: Money,
    pub total_current_liabilities: Money,
    pub long_term_debt: Money,
    pub total_liabilities: Money,
    pub common_stock: Money,
    pub retained_earnings: Money,
    pub total_equity: Money,
    pub total_liabilities_and_equity: Money,
}

/// Cash flow statement for the simulated period.
///
/// Outflows are stored as negative values (`capital_expenditures`, working
/// capital uses of cash). `debt_repayment` and `dividends_paid` are stored
/// positive and subtracted in cash from financing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub net_income: Money,
    pub depreciation: Money,
    pub amortization: Money,
    pub changes_in_working_capital: Money,
    pub change_in_ar: Money,
    pub change_in_inventory: Money,
    pub change_in_ap: Money,
    pub change_in_accrued_expenses: Money,
    pub change_in_prepaid_expenses: Money,
    pub cash_from_operations: Money,
    pub capital_expenditures: Money,
    pub cash_from_investing: Money,
    pub debt_issuance: Money,
    pub debt_repayment: Money,
    pub equity_issuance: Money,
    pub dividends_paid: Money,
    pub cash_from_financing: Money,
    pub net_change_in_cash: Money,
    pub beginning_cash: Money,
    pub ending_cash: Money,
}

/// One consistent snapshot of the three linked statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialModel {
    pub income_statement: IncomeStatement,
    pub balance_sheet: BalanceSheet,
    pub cash_flow_statement: CashFlowStatement,
}

/// Which of the three statements a line item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    IncomeStatement,
    BalanceSheet,
    CashFlowStatement,
}

impl StatementKind {
    pub fn label(self) -> &'static str {
        match self {
            StatementKind::IncomeStatement => "Income Statement",
            StatementKind::BalanceSheet => "Balance Sheet",
            StatementKind::CashFlowStatement => "Cash Flow Statement",
        }
    }
}

/// A single named value on a statement, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    pub field: &'static str,
    pub label: &'static str,
    pub value: Money,
}

const fn item(field: &'static str, label: &'static str, value: Money) -> LineItem {
    LineItem {
        field,
        label,
        value,
    }
}

impl IncomeStatement {
    pub fn line_items(&self) -> [LineItem; 11] {
        [
            item("revenue", "Revenue", self.revenue),
            item("cogs", "Cost of Goods Sold", self.cogs),
            item("gross_profit", "Gross Profit", self.gross_profit),
            item("sga", "SG&A Expenses", self.sga),
            item("depreciation", "Depreciation", self.depreciation),
            item("amortization", "Amortization", self.amortization),
            item("ebit", "EBIT", self.ebit),
            item("interest_expense", "Interest Expense", self.interest_expense),
            item("ebt", "Earnings Before Tax", self.ebt),
            item("taxes", "Income Taxes", self.taxes),
            item("net_income", "Net Income", self.net_income),
        ]
    }
}

impl BalanceSheet {
    pub fn line_items(&self) -> [LineItem; 21] {
        [
            item("cash", "Cash", self.cash),
            item("accounts_receivable", "Accounts Receivable", self.accounts_receivable),
            item("inventory", "Inventory", self.inventory),
            item("prepaid_expenses", "Prepaid Expenses", self.prepaid_expenses),
            item("total_current_assets", "Total Current Assets", self.total_current_assets),
            item("ppe", "PP&E (Gross)", self.ppe),
            item(
                "accumulated_depreciation",
                "Accumulated Depreciation",
                self.accumulated_depreciation,
            ),
            item("net_ppe", "Net PP&E", self.net_ppe),
            item("goodwill", "Goodwill", self.goodwill),
            item("intangibles", "Intangible Assets", self.intangibles),
            item("total_assets", "Total Assets", self.total_assets),
            item("accounts_payable", "Accounts Payable", self.accounts_payable),
            item("accrued_expenses", "Accrued Expenses", self.accrued_expenses),
            item("current_debt", "Current Debt", self.current_debt),
            item(
                "total_current_liabilities",
                "Total Current Liabilities",
                self.total_current_liabilities,
            ),
            item("long_term_debt", "Long-Term Debt", self.long_term_debt),
            item("total_liabilities", "Total Liabilities", self.total_liabilities),
            item("common_stock", "Common Stock", self.common_stock),
            item("retained_earnings", "Retained Earnings", self.retained_earnings),
            item("total_equity", "Total Equity", self.total_equity),
            item(
                "total_liabilities_and_equity",
                "Total Liabilities & Equity",
                self.total_liabilities_and_equity,
            ),
        ]
    }
}

impl CashFlowStatement {
    pub fn line_items(&self) -> [LineItem; 20] {
        [
            item("net_income", "Net Income", self.net_income),
            item("depreciation", "Depreciation (Add-back)", self.depreciation),
            item("amortization", "Amortization (Add-back)", self.amortization),
            item(
                "changes_in_working_capital",
                "Changes in Working Capital",
                self.changes_in_working_capital,
            ),
            item("change_in_ar", "Change in Accounts Receivable", self.change_in_ar),
            item("change_in_inventory", "Change in Inventory", self.change_in_inventory),
            item("change_in_ap", "Change in Accounts Payable", self.change_in_ap),
            item(
                "change_in_accrued_expenses",
                "Change in Accrued Expenses",
                self.change_in_accrued_expenses,
            ),
            item(
                "change_in_prepaid_expenses",
                "Change in Prepaid Expenses",
                self.change_in_prepaid_expenses,
            ),
            item("cash_from_operations", "Cash from Operations", self.cash_from_operations),
            item("capital_expenditures", "Capital Expenditures", self.capital_expenditures),
            item("cash_from_investing", "Cash from Investing", self.cash_from_investing),
            item("debt_issuance", "Debt Issuance", self.debt_issuance),
            item("debt_repayment", "Debt Repayment", self.debt_repayment),
            item("equity_issuance", "Equity Issuance", self.equity_issuance),
            item("dividends_paid", "Dividends Paid", self.dividends_paid),
            item("cash_from_financing", "Cash from Financing", self.cash_from_financing),
            item("net_change_in_cash", "Net Change in Cash", self.net_change_in_cash),
            item("beginning_cash", "Beginning Cash", self.beginning_cash),
            item("ending_cash", "Ending Cash", self.ending_cash),
        ]
    }
}

/// Largest magnitude any line of an incoming snapshot may carry.
pub const MAX_LINE_VALUE: Money = dec!(1000000000000000000);

impl FinancialModel {
    /// Reject snapshots whose lines are large enough that applying an event
    /// could leave the decimal range.
    pub fn check_bounds(&self) -> FinSimResult<()> {
        let items = self
            .income_statement
            .line_items()
            .into_iter()
            .chain(self.balance_sheet.line_items())
            .chain(self.cash_flow_statement.line_items());
        for item in items {
            if item.value.abs() > MAX_LINE_VALUE {
                return Err(FinSimError::InvalidInput {
                    field: format!("model.{}", item.field),
                    reason: format!("Magnitude must not exceed {MAX_LINE_VALUE}, got {}", item.value),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Baseline
// ---------------------------------------------------------------------------

/// The fixed starting snapshot every session begins from.
///
/// Only primitives are written here; derived lines come from a single
/// recalculation pass. Retained earnings is the plug that makes the
/// opening balance sheet balance.
pub fn create_baseline() -> FinancialModel {
    let income_statement = IncomeStatement {
        revenue: dec!(1000),
        cogs: dec!(400),
        gross_profit: Decimal::ZERO,
        sga: dec!(200),
        depreciation: dec!(50),
        amortization: dec!(20),
        ebit: Decimal::ZERO,
        interest_expense: dec!(30),
        ebt: Decimal::ZERO,
        taxes: dec!(75),
        net_income: Decimal::ZERO,
    };

    let total_assets = dec!(500) + dec!(200) + dec!(150) + dec!(50) // current assets
        + (dec!(1000) - dec!(200)) // net PP&E
        + dec!(300)
        + dec!(100);
    let total_liabilities = dec!(150) + dec!(100) + dec!(50) + dec!(500);
    let common_stock = dec!(800);

    let balance_sheet = BalanceSheet {
        cash: dec!(500),
        accounts_receivable: dec!(200),
        inventory: dec!(150),
        prepaid_expenses: dec!(50),
        total_current_assets: Decimal::ZERO,
        ppe: dec!(1000),
        accumulated_depreciation: dec!(200),
        net_ppe: Decimal::ZERO,
        goodwill: dec!(300),
        intangibles: dec!(100),
        total_assets: Decimal::ZERO,
        accounts_payable: dec!(150),
        accrued_expenses: dec!(100),
        current_debt: dec!(50),
        total_current_liabilities: Decimal::ZERO,
        long_term_debt: dec!(500),
        total_liabilities: Decimal::ZERO,
        common_stock,
        retained_earnings: total_assets - total_liabilities - common_stock,
        total_equity: Decimal::ZERO,
        total_liabilities_and_equity: Decimal::ZERO,
    };

    let cash_flow_statement = CashFlowStatement {
        net_income: dec!(225),
        depreciation: dec!(50),
        amortization: dec!(20),
        changes_in_working_capital: Decimal::ZERO,
        change_in_ar: Decimal::ZERO,
        change_in_inventory: Decimal::ZERO,
        change_in_ap: Decimal::ZERO,
        change_in_accrued_expenses: Decimal::ZERO,
        change_in_prepaid_expenses: Decimal::ZERO,
        cash_from_operations: Decimal::ZERO,
        capital_expenditures: Decimal::ZERO,
        cash_from_investing: Decimal::ZERO,
        debt_issuance: Decimal::ZERO,
        debt_repayment: Decimal::ZERO,
        equity_issuance: Decimal::ZERO,
        dividends_paid: Decimal::ZERO,
        cash_from_financing: Decimal::ZERO,
        net_change_in_cash: Decimal::ZERO,
        beginning_cash: dec!(205),
        ending_cash: Decimal::ZERO,
    };

    let mut model = FinancialModel {
        income_statement,
        balance_sheet,
        cash_flow_statement,
    };
    recalculate(&mut model);
    model
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

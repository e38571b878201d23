use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinSimError;
use crate::types::{Money, Rate, Years};
use crate::FinSimResult;

// ---------------------------------------------------------------------------
// Event catalog
// ---------------------------------------------------------------------------

/// The closed set of business events the simulator can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    BuyPpeCash,
    BuyPpeDebt,
    Depreciation,
    IssueEquity,
    PayDownDebt,
    IncreaseInventory,
    IncreaseAr,
    RevenueCredit,
    RevenueCash,
    AccruedExpense,
    PrepaidExpense,
    WriteDown,
}

/// Cash flow statement section an event is classified under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Operating,
    Investing,
    Financing,
}

/// Static catalog entry describing an event for selection controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDefinition {
    pub event_type: EventType,
    pub label: &'static str,
    pub description: &'static str,
    pub category: EventCategory,
}

impl EventType {
    /// Every event, in catalog order.
    pub const ALL: [EventType; 12] = [
        EventType::BuyPpeCash,
        EventType::BuyPpeDebt,
        EventType::Depreciation,
        EventType::IssueEquity,
        EventType::PayDownDebt,
        EventType::IncreaseInventory,
        EventType::IncreaseAr,
        EventType::RevenueCredit,
        EventType::RevenueCash,
        EventType::AccruedExpense,
        EventType::PrepaidExpense,
        EventType::WriteDown,
    ];

    /// Stable identifier used on the wire and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            EventType::BuyPpeCash => "buy_ppe_cash",
            EventType::BuyPpeDebt => "buy_ppe_debt",
            EventType::Depreciation => "depreciation",
            EventType::IssueEquity => "issue_equity",
            EventType::PayDownDebt => "pay_down_debt",
            EventType::IncreaseInventory => "increase_inventory",
            EventType::IncreaseAr => "increase_ar",
            EventType::RevenueCredit => "revenue_credit",
            EventType::RevenueCash => "revenue_cash",
            EventType::AccruedExpense => "accrued_expense",
            EventType::PrepaidExpense => "prepaid_expense",
            EventType::WriteDown => "write_down",
        }
    }

    pub fn definition(self) -> EventDefinition {
        let (label, description, category) = match self {
            EventType::BuyPpeCash => (
                "Purchase PP&E with Cash",
                "Buy property, plant & equipment using cash. Cash decreases, PP&E increases.",
                EventCategory::Investing,
            ),
            EventType::BuyPpeDebt => (
                "Purchase PP&E with Debt",
                "Buy property, plant & equipment financed by long-term debt. PP&E and LT Debt both increase.",
                EventCategory::Investing,
            ),
            EventType::Depreciation => (
                "Record Depreciation",
                "Record depreciation expense. Non-cash charge that reduces net income but is added back on the cash flow statement.",
                EventCategory::Operating,
            ),
            EventType::IssueEquity => (
                "Issue Equity",
                "Raise capital by issuing common stock. Cash and common stock both increase.",
                EventCategory::Financing,
            ),
            EventType::PayDownDebt => (
                "Pay Down Debt",
                "Repay long-term debt with cash. Cash and LT Debt both decrease.",
                EventCategory::Financing,
            ),
            EventType::IncreaseInventory => (
                "Purchase Inventory",
                "Purchase additional inventory with cash. Cash decreases, inventory increases.",
                EventCategory::Operating,
            ),
            EventType::IncreaseAr => (
                "Increase Accounts Receivable",
                "Accounts receivable increases with no cash collected. Working capital use of cash.",
                EventCategory::Operating,
            ),
            EventType::RevenueCredit => (
                "Earn Revenue (on Credit)",
                "Recognize revenue on credit. AR increases, flows through IS to retained earnings.",
                EventCategory::Operating,
            ),
            EventType::RevenueCash => (
                "Earn Revenue (Cash)",
                "Recognize revenue collected in cash. Cash increases, flows through IS to retained earnings.",
                EventCategory::Operating,
            ),
            EventType::AccruedExpense => (
                "Accrue an Expense",
                "Record an expense not yet paid in cash. SG&A increases, accrued liabilities increase.",
                EventCategory::Operating,
            ),
            EventType::PrepaidExpense => (
                "Prepay an Expense",
                "Pay cash in advance for a future expense. Cash decreases, prepaid expenses increase.",
                EventCategory::Operating,
            ),
            EventType::WriteDown => (
                "Write Down / Impairment",
                "Impair goodwill or intangibles. Non-cash charge that reduces asset value and net income.",
                EventCategory::Operating,
            ),
        };
        EventDefinition {
            event_type: self,
            label,
            description,
            category,
        }
    }

    pub fn label(self) -> &'static str {
        self.definition().label
    }

    /// Whether the event consumes `useful_life` from its assumptions.
    pub fn uses_useful_life(self) -> bool {
        matches!(self, EventType::Depreciation)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for EventType {
    type Err = FinSimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        EventType::ALL
            .into_iter()
            .find(|e| e.id() == needle)
            .ok_or_else(|| FinSimError::UnknownEventType(s.to_string()))
    }
}

/// The full static catalog, in selection order.
pub fn list_event_definitions() -> Vec<EventDefinition> {
    EventType::ALL.iter().map(|e| e.definition()).collect()
}

// ---------------------------------------------------------------------------
// Assumptions
// ---------------------------------------------------------------------------

/// Largest transaction amount, and largest annual depreciation charge, an
/// event accepts.
pub const MAX_AMOUNT: Money = dec!(1000000000000000);

/// Per-invocation inputs to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAssumptions {
    /// Transaction size
    pub amount: Money,
    /// Tax rate applied to taxable effects (0.25 = 25%)
    pub tax_rate: Rate,
    /// Useful life in years; only depreciation reads it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub useful_life: Option<Years>,
}

impl EventAssumptions {
    pub fn new(amount: Money, tax_rate: Rate) -> Self {
        Self {
            amount,
            tax_rate,
            useful_life: None,
        }
    }

    pub fn with_useful_life(mut self, years: Years) -> Self {
        self.useful_life = Some(years);
        self
    }

    /// Reject nonsensical inputs before any mutation happens.
    pub fn validate(&self) -> FinSimResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(FinSimError::InvalidInput {
                field: "amount".into(),
                reason: format!("Amount must be positive, got {}", self.amount),
            });
        }
        if self.amount > MAX_AMOUNT {
            return Err(FinSimError::InvalidInput {
                field: "amount".into(),
                reason: format!("Amount must not exceed {MAX_AMOUNT}, got {}", self.amount),
            });
        }
        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE {
            return Err(FinSimError::InvalidInput {
                field: "tax_rate".into(),
                reason: format!("Rate must be between 0 and 1, got {}", self.tax_rate),
            });
        }
        if let Some(life) = self.useful_life {
            if life <= Decimal::ZERO {
                return Err(FinSimError::InvalidInput {
                    field: "useful_life".into(),
                    reason: format!("Useful life must be positive, got {life}"),
                });
            }
            if self.amount.checked_div(life).map_or(true, |charge| charge > MAX_AMOUNT) {
                return Err(FinSimError::InvalidInput {
                    field: "useful_life".into(),
                    reason: format!(
                        "Useful life of {life} years puts the annual charge above {MAX_AMOUNT}"
                    ),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::engine::EventFigures;
use super::events::{EventAssumptions, EventType};
use super::recalc::round2;

/// Dollar amount to cents, e.g. `$12.50` or `-$3.46`.
pub fn usd(value: Decimal) -> String {
    let cents = round2(value);
    if cents.is_sign_negative() && !cents.is_zero() {
        format!("-${:.2}", cents.abs())
    } else {
        format!("${:.2}", cents.abs())
    }
}

/// True when non-positive pre-tax income kept taxes from moving by the
/// full rate on the charge.
fn tax_limited(assumptions: &EventAssumptions, f: &EventFigures) -> bool {
    (f.charge * assumptions.tax_rate - f.tax_effect()).abs() > dec!(0.01)
}

/// Step-by-step mechanical walk-through of an event across the three
/// statements. Every figure is read from `f`, the movements the engine
/// actually posted.
pub fn generate_explanation(
    event: EventType,
    assumptions: &EventAssumptions,
    f: &EventFigures,
) -> Vec<String> {
    let amount = usd(f.amount);
    let charge = usd(f.charge);
    let tax = usd(f.tax_effect());
    let after_tax = usd(f.after_tax());
    let limited = tax_limited(assumptions, f);
    let saving_cap = if limited {
        " Taxes cannot fall below zero, so the saving is capped."
    } else {
        ""
    };
    let income_floor = if limited {
        " Only income above zero pre-tax income is taxed."
    } else {
        ""
    };

    match event {
        EventType::BuyPpeCash => vec![
            format!("Purchase {amount} of PP&E using cash."),
            format!("Balance Sheet: Cash decreases by {amount}, PP&E increases by {amount}. Total assets unchanged."),
            format!("Cash Flow Statement: Capital expenditure of {amount} recorded in Cash from Investing."),
            "Income Statement: No impact. This is a capital expenditure, not an expense.".to_string(),
        ],
        EventType::BuyPpeDebt => vec![
            format!("Purchase {amount} of PP&E financed with long-term debt."),
            format!("Balance Sheet: PP&E increases by {amount}, Long-Term Debt increases by {amount}. Both sides increase equally."),
            format!("Cash Flow Statement: CapEx of {amount} in CFI, offset by {amount} debt issuance in CFF. Net cash impact is zero."),
            "Income Statement: No impact. No expense is recognized at purchase.".to_string(),
        ],
        EventType::Depreciation => {
            let mut lines = Vec::with_capacity(5);
            if let Some(life) = assumptions.useful_life {
                lines.push(format!(
                    "Record {charge} of depreciation expense ({amount} asset over {} years).",
                    life.normalize()
                ));
            } else {
                lines.push(format!("Record {charge} of depreciation expense."));
            }
            lines.push(format!(
                "Income Statement: Depreciation expense of {charge} reduces EBIT. Tax shield of {tax} reduces taxes.{saving_cap} Net income decreases by {after_tax}."
            ));
            lines.push(format!(
                "Balance Sheet: Accumulated depreciation increases by {charge}, reducing Net PP&E. Cash increases by the {tax} tax shield. Retained earnings decrease by {after_tax}."
            ));
            lines.push(format!(
                "Cash Flow Statement: Net income is down {after_tax} but the {charge} non-cash charge is added back. Net cash impact from operations is positive {tax}."
            ));
            lines
        }
        EventType::IssueEquity => vec![
            format!("Issue {amount} of common stock."),
            format!("Balance Sheet: Cash increases by {amount}, Common Stock increases by {amount}. Both sides increase equally."),
            format!("Cash Flow Statement: {amount} inflow recorded in Cash from Financing."),
            "Income Statement: No impact. Equity issuance is not revenue.".to_string(),
        ],
        EventType::PayDownDebt => vec![
            format!("Repay {amount} of long-term debt."),
            format!("Balance Sheet: Cash decreases by {amount}, Long-Term Debt decreases by {amount}. Both sides decrease equally."),
            format!("Cash Flow Statement: {amount} outflow recorded in Cash from Financing."),
            "Income Statement: No impact. Principal repayment is not an expense.".to_string(),
        ],
        EventType::IncreaseInventory => vec![
            format!("Purchase {amount} of inventory with cash."),
            format!("Balance Sheet: Cash decreases by {amount}, Inventory increases by {amount}. Total assets unchanged."),
            format!("Cash Flow Statement: The {amount} inventory build is a use of cash in working capital (CFO)."),
            "Income Statement: No impact. Inventory is an asset until it is sold.".to_string(),
        ],
        EventType::IncreaseAr => vec![
            format!("Accounts Receivable increases by {amount}."),
            format!("Balance Sheet: AR increases by {amount} and Cash decreases by {amount}. Total assets unchanged."),
            format!("Cash Flow Statement: The {amount} AR increase is a use of cash in working capital (CFO)."),
            "Income Statement: No direct impact from the AR change alone.".to_string(),
        ],
        EventType::RevenueCredit => vec![
            format!("Earn {amount} of revenue on credit."),
            format!("Income Statement: Revenue increases by {amount}. Taxes increase by {tax}.{income_floor} Net income increases by {after_tax}."),
            format!("Balance Sheet: AR increases by {amount}. Cash decreases by the {tax} of tax paid. Retained earnings increase by {after_tax}."),
            format!("Cash Flow Statement: Net income up {after_tax} in CFO, offset by AR increase of {amount}. Net cash impact from operations is negative {tax} (taxes owed)."),
        ],
        EventType::RevenueCash => vec![
            format!("Earn {amount} of revenue collected in cash."),
            format!("Income Statement: Revenue increases by {amount}. Taxes increase by {tax}.{income_floor} Net income increases by {after_tax}."),
            format!("Balance Sheet: Cash increases by {after_tax}. Retained earnings increase by {after_tax}."),
            format!("Cash Flow Statement: Net income up {after_tax} flows directly through CFO."),
        ],
        EventType::AccruedExpense => vec![
            format!("Accrue {amount} of expense (not yet paid in cash)."),
            format!("Income Statement: SG&A increases by {amount}. Tax saving of {tax}.{saving_cap} Net income decreases by {after_tax}."),
            format!("Balance Sheet: Accrued expenses (liability) increase by {amount}. Cash increases by the {tax} tax saving. Retained earnings decrease by {after_tax}."),
            format!("Cash Flow Statement: Net income decreases by {after_tax}, but the accrued expense increase of {amount} is added back in working capital. Net CFO impact is positive {tax}."),
        ],
        EventType::PrepaidExpense => vec![
            format!("Prepay {amount} of expense in cash."),
            format!("Balance Sheet: Cash decreases by {amount}, Prepaid Expenses increase by {amount}. Total assets unchanged."),
            format!("Cash Flow Statement: The {amount} prepaid increase is a use of cash in working capital (CFO)."),
            "Income Statement: No impact. The expense is recognized in the period it covers.".to_string(),
        ],
        EventType::WriteDown => {
            let half = usd(f.amount / dec!(2));
            vec![
                format!("Write down {amount} of intangible assets (split equally between goodwill and other intangibles)."),
                format!("Income Statement: Impairment charge of {amount} recorded in SG&A. Tax benefit of {tax}.{saving_cap} Net income decreases by {after_tax}."),
                format!("Balance Sheet: Goodwill decreases by {half}, Intangibles decrease by {half}. Cash increases by the {tax} tax benefit. Retained earnings decrease by {after_tax}."),
                format!("Cash Flow Statement: Non-cash charge. The {amount} impairment is added back in CFO, leaving the {tax} tax benefit as the only cash impact."),
            ]
        }
    }
}

/// Conceptual framing of an event for interview answers.
pub fn generate_mental_model(event: EventType, f: &EventFigures) -> Vec<String> {

    match event {
        EventType::BuyPpeCash => vec![
            "Think of it as swapping one asset for another: cash leaves, a fixed asset arrives.".into(),
            "Key insight: CapEx is NOT an expense. It's an investment that gets expensed over time via depreciation.".into(),
            "The Income Statement is completely unaffected.".into(),
        ],
        EventType::BuyPpeDebt => vec![
            "Both sides of the balance sheet grow: assets (PP&E) and liabilities (debt) increase equally.".into(),
            "No cash changes hands, but the CFS shows the CapEx and debt issuance as offsetting items.".into(),
            "This is why you can't just look at CapEx to understand cash usage. Check the financing too.".into(),
        ],
        EventType::Depreciation => vec![
            "Depreciation is the classic non-cash charge. It reduces net income but cash never leaves the building.".into(),
            "On the CFS, it gets added back because we start with net income (which already subtracted it).".into(),
            format!(
                "The tax shield is real cash savings: {} of lower taxes on {} of depreciation.",
                usd(f.tax_effect()),
                usd(f.charge)
            ),
        ],
        EventType::IssueEquity => vec![
            "Selling stock is like inviting new partners: cash comes in, ownership stake goes up.".into(),
            "It flows through CFF, not CFO. Revenue is earned; equity is raised.".into(),
            "No income statement impact. Issuing stock is not the same as earning revenue.".into(),
        ],
        EventType::PayDownDebt => vec![
            "Paying off debt shrinks both sides of the balance sheet equally.".into(),
            "Principal repayment is NOT an expense; only interest is. That's why it's in CFF, not CFO.".into(),
            "Many beginners confuse debt repayment with interest expense. They're fundamentally different.".into(),
        ],
        EventType::IncreaseInventory => vec![
            "Buying inventory swaps cash for another current asset. Total assets don't change.".into(),
            "Inventory isn't an expense until it's sold (then it becomes COGS).".into(),
            "The cash outflow shows up in working capital changes in CFO, not in CFI.".into(),
        ],
        EventType::IncreaseAr => vec![
            "AR going up means you're owed more money: you made sales but haven't collected cash yet.".into(),
            "An increase in AR is a USE of cash in working capital. Think: asset goes up = cash goes down.".into(),
            "Working capital rule: current asset increases are cash outflows, current liability increases are cash inflows.".into(),
        ],
        EventType::RevenueCredit => vec![
            format!("Revenue of {} flows through the IS, but since it's on credit, no cash is collected.", usd(f.amount)),
            "AR increases on the BS, and retained earnings increase by the after-tax amount.".into(),
            "On the CFS: net income goes up (good), but AR increase offsets it (no cash came in).".into(),
            format!(
                "Net cash effect: you lose {} because you owe taxes on revenue you haven't collected!",
                usd(f.tax_effect())
            ),
        ],
        EventType::RevenueCash => vec![
            format!("Revenue of {} flows through IS and cash actually comes in.", usd(f.amount)),
            "This is the simplest revenue scenario: earn it, collect it, pay tax on it.".into(),
            format!("Cash increases by the after-tax amount: {}.", usd(f.after_tax())),
        ],
        EventType::AccruedExpense => vec![
            "You recognized an expense but haven't paid cash yet: the opposite of a prepaid.".into(),
            "The liability (accrued expenses) increases, which is a SOURCE of cash in working capital.".into(),
            format!(
                "Net cash effect: the expense hurts net income, but the accrual adds back in working capital, netting to a small positive {} (tax benefit).",
                usd(f.tax_effect())
            ),
        ],
        EventType::PrepaidExpense => vec![
            "You paid cash now for a future expense, like paying rent 3 months ahead.".into(),
            "Cash goes down, but a prepaid asset goes up. Total assets unchanged.".into(),
            "No IS impact yet. The expense hits the IS later when the prepaid is 'used up.'".into(),
        ],
        EventType::WriteDown => vec![
            "An impairment is admitting an asset is worth less than what's on the books.".into(),
            "It's a non-cash charge: no cash leaves, but the asset value drops and so does net income.".into(),
            "On the CFS, it's added back (like depreciation) because it's non-cash.".into(),
            format!(
                "The tax benefit is real: lower pre-tax income means {} less tax (actual cash savings).",
                usd(f.tax_effect())
            ),
        ],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

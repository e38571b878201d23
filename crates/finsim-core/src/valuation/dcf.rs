use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinSimError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinSimResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Longest explicit forecast accepted.
pub const MAX_FORECAST_YEARS: u32 = 30;

/// Ceiling on any projected revenue figure.
const MAX_PROJECTED_REVENUE: Money = dec!(1000000000000000000000000);

/// Drivers of an unlevered free cash flow DCF. Every rate is a decimal
/// (0.10 = 10%). Omitted fields take the textbook defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcfInput {
    /// Year 0 revenue
    pub base_revenue: Money,
    /// Constant annual revenue growth
    pub revenue_growth: Rate,
    pub ebitda_margin: Rate,
    /// D&A as a fraction of revenue
    pub da_pct_revenue: Rate,
    pub tax_rate: Rate,
    pub capex_pct_revenue: Rate,
    /// Working capital build as a fraction of the year's revenue increase
    pub nwc_pct_revenue_change: Rate,
    /// Discount rate
    pub wacc: Rate,
    /// Perpetuity growth for the Gordon terminal value
    pub terminal_growth: Rate,
    /// EV/EBITDA multiple for the exit terminal value
    pub exit_multiple: Decimal,
    pub forecast_years: u32,
}

impl Default for DcfInput {
    fn default() -> Self {
        DcfInput {
            base_revenue: dec!(1000),
            revenue_growth: dec!(0.10),
            ebitda_margin: dec!(0.30),
            da_pct_revenue: dec!(0.05),
            tax_rate: dec!(0.25),
            capex_pct_revenue: dec!(0.08),
            nwc_pct_revenue_change: dec!(0.10),
            wacc: dec!(0.10),
            terminal_growth: dec!(0.03),
            exit_multiple: dec!(10),
            forecast_years: 5,
        }
    }
}

/// One forecast year, from revenue down to unlevered free cash flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcfYearProjection {
    pub year: u32,
    pub revenue: Money,
    pub ebitda: Money,
    pub da: Money,
    pub ebit: Money,
    pub taxes: Money,
    pub nopat: Money,
    pub capex: Money,
    pub nwc_change: Money,
    /// NOPAT + D&A - CapEx - change in NWC
    pub ufcf: Money,
    /// `1 / (1 + wacc)^year`, end-of-year convention
    pub discount_factor: Rate,
    pub pv_ufcf: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcfOutput {
    pub projections: Vec<DcfYearProjection>,
    /// Zero when WACC does not exceed terminal growth
    pub terminal_value_gordon: Money,
    pub terminal_value_exit: Money,
    pub pv_terminal_gordon: Money,
    pub pv_terminal_exit: Money,
    pub sum_pv_ufcf: Money,
    pub ev_gordon: Money,
    pub ev_exit: Money,
    /// Midpoint of the two enterprise values
    pub ev_average: Money,
    /// Gordon terminal value over final-year EBITDA
    pub implied_exit_multiple: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project unlevered free cash flow and value it both ways: a Gordon growth
/// perpetuity and an exit multiple on final-year EBITDA.
pub fn build_dcf(input: &DcfInput) -> FinSimResult<ComputationOutput<DcfOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_dcf_input(input)?;

    let projections = build_projections(input)?;
    let last = projections
        .last()
        .ok_or_else(|| FinSimError::InsufficientData("No projection years generated".into()))?;

    let sum_pv_ufcf: Money = projections.iter().map(|p| p.pv_ufcf).sum();
    let (tv_gordon, tv_exit) = compute_terminal_values(input, last, &mut warnings)?;

    let pv_terminal_gordon = discount(tv_gordon, last.discount_factor)?;
    let pv_terminal_exit = discount(tv_exit, last.discount_factor)?;
    let ev_gordon = sum_pv_ufcf + pv_terminal_gordon;
    let ev_exit = sum_pv_ufcf + pv_terminal_exit;
    let ev_average = (ev_gordon + ev_exit) / dec!(2);

    if last.ufcf < Decimal::ZERO {
        warnings.push(format!(
            "Final-year UFCF is negative ({}); the Gordon terminal value is negative too",
            last.ufcf.round_dp(2)
        ));
    }
    if !ev_gordon.is_zero() && pv_terminal_gordon / ev_gordon > dec!(0.75) {
        warnings.push(format!(
            "Terminal value represents {:.1}% of the Gordon enterprise value",
            pv_terminal_gordon / ev_gordon * dec!(100)
        ));
    }

    let implied_exit_multiple = if last.ebitda.is_zero() {
        Decimal::ZERO
    } else {
        tv_gordon / last.ebitda
    };

    let output = DcfOutput {
        projections,
        terminal_value_gordon: tv_gordon,
        terminal_value_exit: tv_exit,
        pv_terminal_gordon,
        pv_terminal_exit,
        sum_pv_ufcf,
        ev_gordon,
        ev_exit,
        ev_average,
        implied_exit_multiple,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Unlevered FCF DCF (Gordon growth and exit multiple)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_dcf_input(input: &DcfInput) -> FinSimResult<()> {
    if input.base_revenue <= Decimal::ZERO || input.base_revenue > MAX_PROJECTED_REVENUE {
        return Err(FinSimError::InvalidInput {
            field: "base_revenue".into(),
            reason: format!(
                "Base revenue must be positive and at most {MAX_PROJECTED_REVENUE}, got {}",
                input.base_revenue
            ),
        });
    }
    if input.wacc <= Decimal::ZERO || input.wacc > Decimal::ONE {
        return Err(FinSimError::InvalidInput {
            field: "wacc".into(),
            reason: format!("WACC must be in (0, 1], got {}", input.wacc),
        });
    }
    if input.revenue_growth <= -Decimal::ONE || input.revenue_growth > dec!(10) {
        return Err(FinSimError::InvalidInput {
            field: "revenue_growth".into(),
            reason: format!("Growth must be in (-1, 10], got {}", input.revenue_growth),
        });
    }
    if input.terminal_growth <= -Decimal::ONE || input.terminal_growth >= Decimal::ONE {
        return Err(FinSimError::InvalidInput {
            field: "terminal_growth".into(),
            reason: format!("Terminal growth must be in (-1, 1), got {}", input.terminal_growth),
        });
    }
    for (field, value) in [
        ("ebitda_margin", input.ebitda_margin),
        ("da_pct_revenue", input.da_pct_revenue),
        ("tax_rate", input.tax_rate),
        ("capex_pct_revenue", input.capex_pct_revenue),
        ("nwc_pct_revenue_change", input.nwc_pct_revenue_change),
    ] {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(FinSimError::InvalidInput {
                field: field.into(),
                reason: format!("Rate must be between 0 and 1, got {value}"),
            });
        }
    }
    if input.exit_multiple < Decimal::ZERO || input.exit_multiple > dec!(100) {
        return Err(FinSimError::InvalidInput {
            field: "exit_multiple".into(),
            reason: format!("Exit multiple must be between 0 and 100, got {}", input.exit_multiple),
        });
    }
    if input.forecast_years == 0 || input.forecast_years > MAX_FORECAST_YEARS {
        return Err(FinSimError::InvalidInput {
            field: "forecast_years".into(),
            reason: format!(
                "Forecast must cover 1 to {MAX_FORECAST_YEARS} years, got {}",
                input.forecast_years
            ),
        });
    }
    Ok(())
}

fn build_projections(input: &DcfInput) -> FinSimResult<Vec<DcfYearProjection>> {
    let mut projections = Vec::with_capacity(input.forecast_years as usize);
    let mut prev_revenue = input.base_revenue;
    let mut discount_factor = Decimal::ONE;
    let growth_factor = Decimal::ONE + input.revenue_growth;
    let wacc_factor = Decimal::ONE + input.wacc;

    for year in 1..=input.forecast_years {
        let revenue = prev_revenue
            .checked_mul(growth_factor)
            .filter(|r| *r <= MAX_PROJECTED_REVENUE)
            .ok_or_else(|| FinSimError::ArithmeticOverflow {
                context: format!("year {year} revenue projection"),
            })?;
        let ebitda = revenue * input.ebitda_margin;
        let da = revenue * input.da_pct_revenue;
        let ebit = ebitda - da;
        let taxes = ebit * input.tax_rate;
        let nopat = ebit - taxes;
        let capex = revenue * input.capex_pct_revenue;
        let nwc_change = (revenue - prev_revenue) * input.nwc_pct_revenue_change;
        let ufcf = nopat + da - capex - nwc_change;

        discount_factor /= wacc_factor;
        let pv_ufcf = ufcf * discount_factor;

        projections.push(DcfYearProjection {
            year,
            revenue,
            ebitda,
            da,
            ebit,
            taxes,
            nopat,
            capex,
            nwc_change,
            ufcf,
            discount_factor,
            pv_ufcf,
        });
        prev_revenue = revenue;
    }

    Ok(projections)
}

/// Gordon value is zero, with a warning, unless WACC exceeds terminal growth.
fn compute_terminal_values(
    input: &DcfInput,
    last_year: &DcfYearProjection,
    warnings: &mut Vec<String>,
) -> FinSimResult<(Money, Money)> {
    let g = input.terminal_growth;
    let spread = input.wacc - g;
    let tv_gordon = if spread > Decimal::ZERO {
        (last_year.ufcf * (Decimal::ONE + g))
            .checked_div(spread)
            .ok_or_else(|| FinSimError::ArithmeticOverflow {
                context: format!("Gordon terminal value with a WACC-growth spread of {spread}"),
            })?
    } else {
        warnings.push(format!(
            "Terminal growth ({g}) is not below WACC ({}); Gordon terminal value set to zero",
            input.wacc
        ));
        Decimal::ZERO
    };
    let tv_exit = last_year.ebitda * input.exit_multiple;
    Ok((tv_gordon, tv_exit))
}

fn discount(value: Money, factor: Rate) -> FinSimResult<Money> {
    value
        .checked_mul(factor)
        .ok_or_else(|| FinSimError::ArithmeticOverflow {
            context: "terminal value discounting".into(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

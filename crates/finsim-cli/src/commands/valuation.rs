use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finsim_core::valuation::dcf::{self, DcfInput};

use crate::input;

/// Arguments for a DCF valuation. Omitted flags keep the default drivers.
#[derive(Args)]
pub struct DcfArgs {
    /// Path to JSON input file with DCF parameters
    #[arg(long)]
    pub input: Option<String>,

    /// Year 0 revenue
    #[arg(long)]
    pub base_revenue: Option<Decimal>,

    /// Annual revenue growth (e.g. 0.10 for 10%)
    #[arg(long)]
    pub growth_rate: Option<Decimal>,

    /// EBITDA margin
    #[arg(long)]
    pub ebitda_margin: Option<Decimal>,

    /// D&A as a fraction of revenue
    #[arg(long)]
    pub da_pct: Option<Decimal>,

    /// Tax rate on EBIT
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// CapEx as a fraction of revenue
    #[arg(long)]
    pub capex_pct: Option<Decimal>,

    /// Working capital build as a fraction of the revenue increase
    #[arg(long)]
    pub nwc_pct: Option<Decimal>,

    /// Discount rate (WACC)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Terminal growth rate
    #[arg(long)]
    pub terminal_growth: Option<Decimal>,

    /// Exit EV/EBITDA multiple
    #[arg(long)]
    pub exit_multiple: Option<Decimal>,

    /// Projection years
    #[arg(long, default_value = "5")]
    pub years: u32,
}

pub fn run_dcf(args: DcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dcf_input: DcfInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        from_flags(&args)
    };

    let result = dcf::build_dcf(&dcf_input)?;
    Ok(serde_json::to_value(result)?)
}

fn from_flags(args: &DcfArgs) -> DcfInput {
    let defaults = DcfInput::default();
    DcfInput {
        base_revenue: args.base_revenue.unwrap_or(defaults.base_revenue),
        revenue_growth: args.growth_rate.unwrap_or(defaults.revenue_growth),
        ebitda_margin: args.ebitda_margin.unwrap_or(defaults.ebitda_margin),
        da_pct_revenue: args.da_pct.unwrap_or(defaults.da_pct_revenue),
        tax_rate: args.tax_rate.unwrap_or(defaults.tax_rate),
        capex_pct_revenue: args.capex_pct.unwrap_or(defaults.capex_pct_revenue),
        nwc_pct_revenue_change: args.nwc_pct.unwrap_or(defaults.nwc_pct_revenue_change),
        wacc: args.discount_rate.unwrap_or(defaults.wacc),
        terminal_growth: args.terminal_growth.unwrap_or(defaults.terminal_growth),
        exit_multiple: args.exit_multiple.unwrap_or(defaults.exit_multiple),
        forecast_years: args.years,
    }
}

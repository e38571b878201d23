use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use finsim_core::simulation::{
    self, create_baseline, list_event_definitions, process_event, EventAssumptions, EventType,
    FinancialModel, ScenarioInput,
};

use crate::input;

/// Arguments for applying a single event
#[derive(Args)]
pub struct ApplyArgs {
    /// Event id, e.g. buy_ppe_cash or depreciation (see `finsim events`)
    #[arg(long)]
    pub event: Option<String>,

    /// Transaction amount
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Tax rate applied to taxable effects (e.g. 0.25 for 25%)
    #[arg(long, default_value = "0.25")]
    pub tax_rate: Decimal,

    /// Useful life in years (depreciation only)
    #[arg(long)]
    pub useful_life: Option<Decimal>,

    /// Path to a JSON snapshot to start from instead of the baseline
    #[arg(long)]
    pub model: Option<String>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for replaying a scenario
#[derive(Args)]
pub struct ScenarioArgs {
    /// Path to JSON input file with `steps` and an optional `starting_model`
    #[arg(long)]
    pub input: Option<String>,
}

/// JSON form of `apply`: the event plus its assumptions, flat.
#[derive(Deserialize)]
struct ApplyRequest {
    #[serde(default)]
    model: Option<FinancialModel>,
    event_type: EventType,
    #[serde(flatten)]
    assumptions: EventAssumptions,
}

pub fn run_events() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(list_event_definitions())?)
}

pub fn run_baseline() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(create_baseline())?)
}

pub fn run_apply(args: ApplyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ApplyRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let event: EventType = args
            .event
            .as_deref()
            .ok_or("--event is required (or provide --input)")?
            .parse()?;
        let amount = args
            .amount
            .ok_or("--amount is required (or provide --input)")?;
        let mut assumptions = EventAssumptions::new(amount, args.tax_rate);
        assumptions.useful_life = args.useful_life;
        ApplyRequest {
            model: None,
            event_type: event,
            assumptions,
        }
    };

    let model = match (request.model, args.model) {
        (Some(model), _) => model,
        (None, Some(path)) => input::file::read_json(&path)?,
        (None, None) => create_baseline(),
    };

    let result = process_event(&model, request.event_type, &request.assumptions)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_scenario(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario: ScenarioInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for scenario".into());
    };
    let result = simulation::run_scenario(&scenario)?;
    Ok(serde_json::to_value(result)?)
}

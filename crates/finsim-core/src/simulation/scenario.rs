use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinSimError;
use crate::types::{with_metadata, ComputationOutput};
use crate::FinSimResult;

use super::engine::EventResult;
use super::events::{EventAssumptions, EventType};
use super::model::FinancialModel;
use super::recalc::balance_difference;
use super::session::{HistoryEntry, SimulationSession};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A sequence of events replayed against one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    /// Snapshot to start from; the baseline when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_model: Option<FinancialModel>,
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub event_type: EventType,
    #[serde(flatten)]
    pub assumptions: EventAssumptions,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutput {
    pub steps: Vec<EventResult>,
    pub history: Vec<HistoryEntry>,
    pub final_model: FinancialModel,
    pub all_balanced: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Replay every step in order. The first failing step aborts the run and
/// its error names the step.
pub fn run_scenario(input: &ScenarioInput) -> FinSimResult<ComputationOutput<ScenarioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.steps.is_empty() {
        return Err(FinSimError::InsufficientData(
            "Scenario must contain at least one step".into(),
        ));
    }

    let mut session = match &input.starting_model {
        Some(model) => SimulationSession::from_model(model.clone()),
        None => SimulationSession::new(),
    };

    let mut steps = Vec::with_capacity(input.steps.len());
    for (idx, step) in input.steps.iter().enumerate() {
        let n = idx + 1;
        let result = session
            .apply(step.event_type, &step.assumptions)
            .map_err(|e| annotate(n, step.event_type, e))?
            .clone();

        if !result.is_balanced {
            warnings.push(format!(
                "Step {n} ({}): balance sheet off by {}",
                step.event_type,
                balance_difference(&result.after)
            ));
        }
        if !result.cash_reconciles {
            warnings.push(format!(
                "Step {n} ({}): ending cash does not match balance sheet cash",
                step.event_type
            ));
        }
        if result.after.balance_sheet.cash < Decimal::ZERO {
            warnings.push(format!(
                "Step {n} ({}): negative cash balance ({})",
                step.event_type, result.after.balance_sheet.cash
            ));
        }
        steps.push(result);
    }

    let all_balanced = steps.iter().all(|s| s.is_balanced);
    let history = session.history().to_vec();
    let output = ScenarioOutput {
        steps,
        history,
        final_model: session.into_current(),
        all_balanced,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Sequential Three-Statement Event Simulation",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn annotate(step: usize, event: EventType, err: FinSimError) -> FinSimError {
    match err {
        FinSimError::InvalidInput { field, reason } => FinSimError::InvalidInput {
            field: format!("steps[{}].{field}", step - 1),
            reason,
        },
        FinSimError::FinancialImpossibility(msg) => {
            FinSimError::FinancialImpossibility(format!("Step {step} ({event}): {msg}"))
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use napi::Result as NapiResult;
use napi_derive::napi;

use finsim_core::grading::{self, GradeRequest};
use finsim_core::simulation::{self, EventAssumptions, EventType, FinancialModel, ScenarioInput};
use finsim_core::valuation::dcf::{self, DcfInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn create_baseline() -> NapiResult<String> {
    serde_json::to_string(&simulation::create_baseline()).map_err(to_napi_error)
}

#[napi]
pub fn list_event_definitions() -> NapiResult<String> {
    serde_json::to_string(&simulation::list_event_definitions()).map_err(to_napi_error)
}

#[napi]
pub fn process_event(
    model_json: String,
    event_type: String,
    assumptions_json: String,
) -> NapiResult<String> {
    let model: FinancialModel = serde_json::from_str(&model_json).map_err(to_napi_error)?;
    let event: EventType = event_type.parse().map_err(to_napi_error)?;
    let assumptions: EventAssumptions =
        serde_json::from_str(&assumptions_json).map_err(to_napi_error)?;
    let output =
        simulation::process_event(&model, event, &assumptions).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn run_scenario(input_json: String) -> NapiResult<String> {
    let input: ScenarioInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = simulation::run_scenario(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Essay grading
// ---------------------------------------------------------------------------

#[napi]
pub fn build_grading_prompts(request_json: String) -> NapiResult<String> {
    let request: GradeRequest = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let output = grading::build_prompts(&request).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Never fails on bad model output; unusable replies come back as the
/// sentinel grade.
#[napi]
pub fn parse_essay_grade(raw: String) -> NapiResult<String> {
    serde_json::to_string(&grading::parse_grade_response(&raw)).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[napi]
pub fn build_dcf(input_json: String) -> NapiResult<String> {
    let input: DcfInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = dcf::build_dcf(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

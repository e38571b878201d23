pub mod delta;
pub mod engine;
pub mod events;
pub mod explanation;
pub mod model;
pub mod recalc;
pub mod reveal;
pub mod scenario;
pub mod session;

pub use delta::{compute_deltas, full_deltas, StatementDelta, StatementDeltas};
pub use engine::{apply_event, process_event, EventFigures, EventResult};
pub use events::{list_event_definitions, EventAssumptions, EventCategory, EventDefinition, EventType};
pub use explanation::{generate_explanation, generate_mental_model};
pub use model::{create_baseline, FinancialModel, StatementKind};
pub use recalc::{cash_reconciles, is_balanced, recalculate};
pub use reveal::RevealSequence;
pub use scenario::{run_scenario, ScenarioInput, ScenarioOutput};
pub use session::SimulationSession;

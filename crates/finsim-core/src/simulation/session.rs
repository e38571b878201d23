use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Money;
use crate::FinSimResult;

use super::engine::{process_event, EventResult};
use super::events::{EventAssumptions, EventType};
use super::model::{create_baseline, FinancialModel};

/// Record of one applied event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub event_type: EventType,
    pub label: String,
    pub amount: Money,
}

/// Session-scoped simulator state owned by the caller.
///
/// Holds the one current snapshot and advances it strictly in sequence:
/// `apply` takes `&mut self`, so two events can never race on the same
/// session. A failed event leaves the session untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSession {
    current: FinancialModel,
    history: Vec<HistoryEntry>,
    last_result: Option<EventResult>,
}

impl Default for SimulationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationSession {
    /// Start from the fixed baseline.
    pub fn new() -> Self {
        Self::from_model(create_baseline())
    }

    /// Start from a caller-supplied snapshot.
    pub fn from_model(model: FinancialModel) -> Self {
        Self {
            current: model,
            history: Vec::new(),
            last_result: None,
        }
    }

    pub fn apply(
        &mut self,
        event: EventType,
        assumptions: &EventAssumptions,
    ) -> FinSimResult<&EventResult> {
        let result = process_event(&self.current, event, assumptions)?;
        self.current = result.after.clone();
        self.history.push(HistoryEntry {
            event_type: event,
            label: event.label().to_string(),
            amount: assumptions.amount,
        });
        debug!(event = %event, step = self.history.len(), "session advanced");
        Ok(&*self.last_result.insert(result))
    }

    /// Back to the baseline with an empty history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn current(&self) -> &FinancialModel {
        &self.current
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn last_result(&self) -> Option<&EventResult> {
        self.last_result.as_ref()
    }

    pub fn into_current(self) -> FinancialModel {
        self.current
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

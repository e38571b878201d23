use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinSimError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FinSimError {
    fn from(e: serde_json::Error) -> Self {
        FinSimError::SerializationError(e.to_string())
    }
}

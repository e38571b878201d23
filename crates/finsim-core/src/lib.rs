pub mod error;
pub mod types;

#[cfg(feature = "simulation")]
pub mod simulation;

#[cfg(feature = "grading")]
pub mod grading;

#[cfg(feature = "valuation")]
pub mod valuation;

pub use error::FinSimError;
pub use types::*;

/// Standard result type for all finsim operations
pub type FinSimResult<T> = Result<T, FinSimError>;

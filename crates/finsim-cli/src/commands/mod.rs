pub mod grading;
pub mod simulation;
pub mod valuation;

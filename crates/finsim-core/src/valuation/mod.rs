pub mod dcf;

pub use dcf::{build_dcf, DcfInput, DcfOutput, DcfYearProjection};

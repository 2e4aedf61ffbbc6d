//! Domain layer types and invariants.

pub mod error;
pub mod outcome;
pub mod report;
pub mod types;

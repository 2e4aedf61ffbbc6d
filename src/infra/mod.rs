//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod render;
pub mod report;
pub mod telemetry;
pub mod urls;
pub mod validator;

use std::error::Error as StdError;

use thiserror::Error;

use crate::{application::scheduler::SchedulerError, config::LoadError, infra::error::InfraError};

/// Failures allowed to reach the process boundary.
///
/// Per-page problems never show up here; they are recorded in the report.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl AppError {
    /// The error message followed by every message in its source chain.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut current = self.source();
        while let Some(inner) = current {
            let message = inner.to_string();
            if messages.last() != Some(&message) {
                messages.push(message);
            }
            current = inner.source();
        }
        messages
    }
}

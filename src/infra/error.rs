use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("File {} does not exist.", path.display())]
    InputMissing { path: PathBuf },
    #[error("failed to read `{}`: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write report `{}`: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl InfraError {
    pub fn input_missing(path: impl AsRef<Path>) -> Self {
        Self::InputMissing {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn input(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Input {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn report(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Report {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}

//! Outcomes produced by the render and validate capabilities.

/// Result of loading a page and serializing its final document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Markup(String),
    Failure(String),
}

impl RenderOutcome {
    pub fn failure(reason: impl AsRef<str>) -> Self {
        Self::Failure(super::types::collapse_line_breaks(reason.as_ref()))
    }
}

/// Verdict returned by the conformance checker for one document.
///
/// `Invalid` means the checker ran and found problems; `Failure` means the
/// checker itself could not be consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(String),
    Failure(String),
}

impl ValidationOutcome {
    pub fn failure(reason: impl AsRef<str>) -> Self {
        Self::Failure(super::types::collapse_line_breaks(reason.as_ref()))
    }
}

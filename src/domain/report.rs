//! Report rows and run summaries.

use super::types::{PageStatus, PageUrl, collapse_line_breaks};

/// Details recorded for pages the checker accepted without diagnostics.
pub const NO_ERRORS: &str = "No errors";

/// One row of the final report. Built once per input URL and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    url: String,
    status: PageStatus,
    details: String,
}

impl PageReport {
    /// Build a row, normalizing `details` so it never carries line breaks.
    pub fn new(url: &PageUrl, status: PageStatus, details: impl AsRef<str>) -> Self {
        Self {
            url: url.as_str().trim().to_string(),
            status,
            details: collapse_line_breaks(details.as_ref()),
        }
    }

    pub fn valid(url: &PageUrl) -> Self {
        Self::new(url, PageStatus::Valid, NO_ERRORS)
    }

    pub fn invalid(url: &PageUrl, details: impl AsRef<str>) -> Self {
        Self::new(url, PageStatus::Invalid, details)
    }

    pub fn error(url: &PageUrl, reason: impl AsRef<str>) -> Self {
        Self::new(url, PageStatus::Error, reason)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> PageStatus {
        self.status
    }

    pub fn details(&self) -> &str {
        &self.details
    }
}

/// Per-status totals for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub valid: usize,
    pub invalid: usize,
    pub error: usize,
}

impl RunSummary {
    pub fn from_reports(reports: &[PageReport]) -> Self {
        reports
            .iter()
            .fold(Self::default(), |mut summary, report| {
                match report.status() {
                    PageStatus::Valid => summary.valid += 1,
                    PageStatus::Invalid => summary.invalid += 1,
                    PageStatus::Error => summary.error += 1,
                }
                summary
            })
    }

    pub fn total(&self) -> usize {
        self.valid + self.invalid + self.error
    }
}

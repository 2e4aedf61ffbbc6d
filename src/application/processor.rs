//! Per-URL render-then-validate operation.

use std::{
    panic::AssertUnwindSafe,
    sync::Arc,
    time::{Duration, Instant},
};

use futures::FutureExt;
use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::{
    application::ports::{Renderer, Validator},
    domain::{
        outcome::{RenderOutcome, ValidationOutcome},
        report::PageReport,
        types::PageUrl,
    },
};

pub const PAGES_TOTAL: &str = "domcheck_pages_total";
pub const PAGE_MS: &str = "domcheck_page_ms";

/// Composes a [`Renderer`] and a [`Validator`] into one operation that always
/// yields a [`PageReport`].
#[derive(Clone)]
pub struct PageProcessor {
    renderer: Arc<dyn Renderer>,
    validator: Arc<dyn Validator>,
    timeout: Option<Duration>,
}

impl PageProcessor {
    pub fn new(renderer: Arc<dyn Renderer>, validator: Arc<dyn Validator>) -> Self {
        Self {
            renderer,
            validator,
            timeout: None,
        }
    }

    /// Bound each page's render plus validate time. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Render and validate one page. Never fails: render errors, checker
    /// errors, timeouts and panics all become an `error` row.
    pub async fn process(&self, url: &PageUrl) -> PageReport {
        let started_at = Instant::now();

        let guarded = AssertUnwindSafe(self.render_and_validate(url)).catch_unwind();
        let report = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(outcome) => outcome.unwrap_or_else(|_| panicked(url)),
                Err(_) => {
                    warn!(
                        target = "domcheck::processor",
                        url = %url,
                        timeout_ms = limit.as_millis() as u64,
                        "page processing timed out"
                    );
                    PageReport::error(
                        url,
                        format!("timed out after {}s", limit.as_secs_f64()),
                    )
                }
            },
            None => guarded.await.unwrap_or_else(|_| panicked(url)),
        };

        let elapsed_ms = started_at.elapsed().as_millis() as u64;
        counter!(PAGES_TOTAL, "status" => report.status().as_str()).increment(1);
        histogram!(PAGE_MS).record(elapsed_ms as f64);
        info!(
            target = "domcheck::processor",
            url = %url,
            status = %report.status(),
            elapsed_ms,
            "page processed"
        );

        report
    }

    async fn render_and_validate(&self, url: &PageUrl) -> PageReport {
        let markup = match self.renderer.render(url).await {
            RenderOutcome::Markup(markup) => markup,
            RenderOutcome::Failure(reason) => {
                warn!(
                    target = "domcheck::processor",
                    url = %url,
                    reason = %reason,
                    "render failed"
                );
                return PageReport::error(url, reason);
            }
        };

        match self.validator.validate(&markup).await {
            ValidationOutcome::Valid => PageReport::valid(url),
            ValidationOutcome::Invalid(details) => PageReport::invalid(url, details),
            ValidationOutcome::Failure(reason) => {
                warn!(
                    target = "domcheck::processor",
                    url = %url,
                    reason = %reason,
                    "validation failed"
                );
                PageReport::error(url, reason)
            }
        }
    }
}

fn panicked(url: &PageUrl) -> PageReport {
    warn!(
        target = "domcheck::processor",
        url = %url,
        "page processing panicked"
    );
    PageReport::error(url, "page processing panicked")
}

//! Bounded fan-out over a list of pages.
//!
//! Two strategies are available. [`BatchMode::Barrier`] splits the input
//! into consecutive groups of at most `concurrency` URLs and waits for a whole
//! group before starting the next. [`BatchMode::Pool`] keeps up to
//! `concurrency` pages in flight and starts the next URL as soon as a slot
//! frees up. Both return reports in input order regardless of completion
//! order.

use std::{num::NonZeroUsize, time::Instant};

use futures::{StreamExt, future::join_all, stream};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    application::processor::PageProcessor,
    domain::{
        report::{PageReport, RunSummary},
        types::PageUrl,
    },
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("concurrency must be a positive integer, got {requested}")]
    InvalidConcurrency { requested: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchMode {
    #[default]
    Barrier,
    Pool,
}

impl BatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchMode::Barrier => "barrier",
            BatchMode::Pool => "pool",
        }
    }
}

impl TryFrom<&str> for BatchMode {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "barrier" => Ok(BatchMode::Barrier),
            "pool" => Ok(BatchMode::Pool),
            _ => Err(()),
        }
    }
}

pub struct BatchScheduler {
    processor: PageProcessor,
    concurrency: NonZeroUsize,
    mode: BatchMode,
}

impl BatchScheduler {
    /// Rejects a zero concurrency before any work is attempted.
    pub fn new(
        processor: PageProcessor,
        concurrency: usize,
        mode: BatchMode,
    ) -> Result<Self, SchedulerError> {
        let concurrency = NonZeroUsize::new(concurrency)
            .ok_or(SchedulerError::InvalidConcurrency {
                requested: concurrency,
            })?;
        Ok(Self {
            processor,
            concurrency,
            mode,
        })
    }

    /// Process every URL and return one report per URL, in input order.
    pub async fn run(&self, urls: &[PageUrl]) -> Vec<PageReport> {
        let started_at = Instant::now();
        info!(
            target = "domcheck::scheduler",
            total = urls.len(),
            concurrency = self.concurrency.get(),
            mode = self.mode.as_str(),
            "starting batch run"
        );

        let reports = match self.mode {
            BatchMode::Barrier => self.run_groups(urls).await,
            BatchMode::Pool => self.run_pool(urls).await,
        };

        let summary = RunSummary::from_reports(&reports);
        info!(
            target = "domcheck::scheduler",
            total = summary.total(),
            valid = summary.valid,
            invalid = summary.invalid,
            error = summary.error,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "batch run finished"
        );

        reports
    }

    async fn run_groups(&self, urls: &[PageUrl]) -> Vec<PageReport> {
        let mut reports = Vec::with_capacity(urls.len());
        for (index, group) in urls.chunks(self.concurrency.get()).enumerate() {
            debug!(
                target = "domcheck::scheduler",
                group = index,
                size = group.len(),
                "starting group"
            );
            // join_all yields outputs in the order the futures were supplied.
            let group_reports =
                join_all(group.iter().map(|url| self.processor.process(url))).await;
            reports.extend(group_reports);
            debug!(
                target = "domcheck::scheduler",
                group = index,
                completed = reports.len(),
                "group finished"
            );
        }
        reports
    }

    async fn run_pool(&self, urls: &[PageUrl]) -> Vec<PageReport> {
        stream::iter(urls)
            .map(|url| self.processor.process(url))
            .buffered(self.concurrency.get())
            .collect()
            .await
    }
}

/// Run `urls` through `processor` in barrier-separated groups of `concurrency`.
pub async fn run_batches(
    processor: &PageProcessor,
    urls: &[PageUrl],
    concurrency: usize,
) -> Result<Vec<PageReport>, SchedulerError> {
    let scheduler = BatchScheduler::new(processor.clone(), concurrency, BatchMode::Barrier)?;
    Ok(scheduler.run(urls).await)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        application::testing::{Event, ScriptedRenderer, ScriptedValidator, shared, urls},
        domain::{outcome::RenderOutcome, types::PageStatus},
    };

    fn processor(renderer: &Arc<ScriptedRenderer>) -> PageProcessor {
        PageProcessor::new(renderer.clone(), shared(ScriptedValidator::new()))
    }

    fn reversed_delays(raw: &[&str]) -> ScriptedRenderer {
        let count = raw.len() as u64;
        raw.iter()
            .enumerate()
            .fold(ScriptedRenderer::new(), |renderer, (index, url)| {
                renderer.with_delay(url, Duration::from_millis(5 * (count - index as u64)))
            })
    }

    const INPUT: [&str; 7] = [
        "https://a.test",
        "https://b.test",
        "https://c.test",
        "https://a.test",
        "https://d.test",
        "https://e.test",
        "https://f.test",
    ];

    #[tokio::test]
    async fn zero_concurrency_is_rejected_before_any_work() {
        let renderer = shared(ScriptedRenderer::new());
        let result = run_batches(&processor(&renderer), &urls(&INPUT), 0).await;

        assert_eq!(
            result.expect_err("zero concurrency"),
            SchedulerError::InvalidConcurrency { requested: 0 }
        );
        assert_eq!(renderer.calls(), 0);
    }

    #[tokio::test]
    async fn empty_input_launches_nothing() {
        let renderer = shared(ScriptedRenderer::new());
        let reports = run_batches(&processor(&renderer), &[], 3)
            .await
            .expect("valid concurrency");

        assert!(reports.is_empty());
        assert_eq!(renderer.calls(), 0);
    }

    #[tokio::test]
    async fn barrier_mode_preserves_input_order_and_duplicates() {
        let renderer = shared(reversed_delays(&INPUT));
        let input = urls(&INPUT);

        let reports = run_batches(&processor(&renderer), &input, 3)
            .await
            .expect("valid concurrency");

        assert_eq!(reports.len(), input.len());
        for (report, url) in reports.iter().zip(&input) {
            assert_eq!(report.url(), url.as_str());
        }
        assert_eq!(renderer.calls(), INPUT.len());
    }

    #[tokio::test]
    async fn barrier_mode_never_overlaps_groups() {
        let raw = [
            "https://1.test",
            "https://2.test",
            "https://3.test",
            "https://4.test",
            "https://5.test",
        ];
        let renderer = shared(reversed_delays(&raw));

        run_batches(&processor(&renderer), &urls(&raw), 2)
            .await
            .expect("valid concurrency");

        let events = renderer.events();
        let groups: Vec<&[&str]> = raw.chunks(2).collect();
        for (index, group) in groups.iter().enumerate().skip(1) {
            let first_start = events
                .iter()
                .position(|event| {
                    matches!(event, Event::Started(url) if group.contains(&url.as_str()))
                })
                .expect("group started");
            let previous = groups[index - 1];
            let last_finish = events
                .iter()
                .rposition(|event| {
                    matches!(event, Event::Finished(url) if previous.contains(&url.as_str()))
                })
                .expect("previous group finished");
            assert!(
                last_finish < first_start,
                "group {index} started before group {} finished",
                index - 1
            );
        }
        assert_eq!(renderer.max_in_flight(), 2);
    }

    #[tokio::test]
    async fn concurrency_bound_is_respected_in_both_modes() {
        for mode in [BatchMode::Barrier, BatchMode::Pool] {
            let renderer = shared(reversed_delays(&INPUT));
            let scheduler =
                BatchScheduler::new(processor(&renderer), 3, mode).expect("valid concurrency");

            let reports = scheduler.run(&urls(&INPUT)).await;

            assert_eq!(reports.len(), INPUT.len());
            assert!(renderer.max_in_flight() <= 3, "{mode:?} exceeded the bound");
            assert!(renderer.max_in_flight() >= 2, "{mode:?} ran sequentially");
        }
    }

    #[tokio::test]
    async fn pool_mode_preserves_input_order() {
        let renderer = shared(reversed_delays(&INPUT));
        let input = urls(&INPUT);
        let scheduler = BatchScheduler::new(processor(&renderer), 4, BatchMode::Pool)
            .expect("valid concurrency");

        let reports = scheduler.run(&input).await;

        let got: Vec<&str> = reports.iter().map(PageReport::url).collect();
        assert_eq!(got, INPUT.to_vec());
    }

    #[tokio::test]
    async fn concurrency_of_one_is_sequential() {
        let renderer = shared(reversed_delays(&INPUT));

        let reports = run_batches(&processor(&renderer), &urls(&INPUT), 1)
            .await
            .expect("valid concurrency");

        assert_eq!(renderer.max_in_flight(), 1);
        let got: Vec<&str> = reports.iter().map(PageReport::url).collect();
        assert_eq!(got, INPUT.to_vec());
    }

    #[tokio::test]
    async fn concurrency_above_input_size_runs_one_group() {
        let renderer = shared(reversed_delays(&INPUT));

        run_batches(&processor(&renderer), &urls(&INPUT), 100)
            .await
            .expect("valid concurrency");

        assert_eq!(renderer.max_in_flight(), INPUT.len());
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_siblings() {
        let renderer = shared(ScriptedRenderer::new().with_outcome(
            "https://b.test",
            RenderOutcome::failure("net::ERR_CONNECTION_REFUSED"),
        ));

        let reports = run_batches(&processor(&renderer), &urls(&INPUT), 2)
            .await
            .expect("valid concurrency");

        let statuses: Vec<PageStatus> = reports.iter().map(PageReport::status).collect();
        assert_eq!(
            statuses,
            vec![
                PageStatus::Valid,
                PageStatus::Error,
                PageStatus::Valid,
                PageStatus::Valid,
                PageStatus::Valid,
                PageStatus::Valid,
                PageStatus::Valid,
            ]
        );
    }

    #[tokio::test]
    async fn reruns_are_identical() {
        let renderer = shared(reversed_delays(&INPUT));
        let processor = processor(&renderer);
        let input = urls(&INPUT);

        let first = run_batches(&processor, &input, 3).await.expect("first run");
        let second = run_batches(&processor, &input, 3).await.expect("second run");

        assert_eq!(first, second);
    }
}

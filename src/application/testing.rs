//! Deterministic fakes for the render and validate capabilities.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    application::ports::{Renderer, Validator},
    domain::{
        outcome::{RenderOutcome, ValidationOutcome},
        types::PageUrl,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Started(String),
    Finished(String),
}

/// Renderer driven by a per-URL script. Unscripted URLs render `<p>{url}</p>`.
#[derive(Default)]
pub(crate) struct ScriptedRenderer {
    outcomes: HashMap<String, RenderOutcome>,
    delays: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
    events: Mutex<Vec<Event>>,
}

impl ScriptedRenderer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_outcome(mut self, url: &str, outcome: RenderOutcome) -> Self {
        self.outcomes.insert(url.to_string(), outcome);
        self
    }

    pub(crate) fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().expect("events lock").clone()
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn render(&self, url: &PageUrl) -> RenderOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.events
            .lock()
            .expect("events lock")
            .push(Event::Started(url.to_string()));

        if let Some(delay) = self.delays.get(url.as_str()) {
            tokio::time::sleep(*delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.events
            .lock()
            .expect("events lock")
            .push(Event::Finished(url.to_string()));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.outcomes
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| RenderOutcome::Markup(format!("<p>{url}</p>")))
    }
}

/// Validator keyed by markup. Unscripted markup is `Valid`.
#[derive(Default)]
pub(crate) struct ScriptedValidator {
    verdicts: HashMap<String, ValidationOutcome>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedValidator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_verdict(mut self, markup: &str, verdict: ValidationOutcome) -> Self {
        self.verdicts.insert(markup.to_string(), verdict);
        self
    }

    pub(crate) fn seen(&self) -> Vec<String> {
        self.seen.lock().expect("seen lock").clone()
    }
}

#[async_trait]
impl Validator for ScriptedValidator {
    async fn validate(&self, markup: &str) -> ValidationOutcome {
        self.seen
            .lock()
            .expect("seen lock")
            .push(markup.to_string());
        self.verdicts
            .get(markup)
            .cloned()
            .unwrap_or(ValidationOutcome::Valid)
    }
}

pub(crate) fn urls(raw: &[&str]) -> Vec<PageUrl> {
    raw.iter()
        .map(|value| PageUrl::parse(value).expect("valid url"))
        .collect()
}

pub(crate) fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}

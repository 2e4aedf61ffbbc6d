//! Conformance checking against a Nu HTML Checker compatible service.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{
    application::ports::Validator,
    domain::{
        outcome::ValidationOutcome,
        types::{Diagnostic, flatten_diagnostics},
    },
    infra::error::InfraError,
};

pub const DEFAULT_VALIDATOR_URL: &str = "https://validator.w3.org/nu/";

const BODY_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Error)]
pub(crate) enum CheckerError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("checker responded with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed checker response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct CheckerResponse {
    messages: Vec<CheckerMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckerMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    last_line: Option<u32>,
    #[serde(default)]
    first_column: Option<u32>,
    #[serde(default)]
    message: String,
}

impl From<CheckerMessage> for Diagnostic {
    fn from(message: CheckerMessage) -> Self {
        Diagnostic::new(
            message.kind,
            message.last_line,
            message.first_column,
            message.message,
        )
    }
}

/// Posts markup to the checker and asks for the JSON message list.
#[derive(Debug, Clone)]
pub struct NuValidator {
    client: Client,
    endpoint: Url,
}

impl NuValidator {
    pub fn new(client: Client, endpoint: &Url) -> Self {
        let mut endpoint = endpoint.clone();
        endpoint.query_pairs_mut().append_pair("out", "json");
        Self { client, endpoint }
    }

    pub fn from_settings(settings: &crate::config::ValidatorSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self::new(client, &settings.url))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub(crate) async fn check(&self, markup: &str) -> Result<Vec<Diagnostic>, CheckerError> {
        let started_at = Instant::now();
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/html; charset=utf-8")
            .body(markup.to_owned())
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes)
                .chars()
                .take(BODY_EXCERPT_CHARS)
                .collect();
            return Err(CheckerError::Status { status, body });
        }

        let parsed: CheckerResponse = serde_json::from_slice(&bytes)?;
        debug!(
            target = "domcheck::validator",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            messages = parsed.messages.len(),
            "checker responded"
        );
        Ok(parsed.messages.into_iter().map(Diagnostic::from).collect())
    }
}

#[async_trait]
impl Validator for NuValidator {
    async fn validate(&self, markup: &str) -> ValidationOutcome {
        match self.check(markup).await {
            Ok(diagnostics) if diagnostics.is_empty() => ValidationOutcome::Valid,
            Ok(diagnostics) => ValidationOutcome::Invalid(flatten_diagnostics(&diagnostics)),
            Err(err) => {
                warn!(
                    target = "domcheck::validator",
                    endpoint = %self.endpoint,
                    error = %err,
                    "conformance check failed"
                );
                ValidationOutcome::failure(format!("Validation error: {err}"))
            }
        }
    }
}

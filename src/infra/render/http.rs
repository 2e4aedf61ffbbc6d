use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{
    application::ports::Renderer,
    domain::{outcome::RenderOutcome, types::PageUrl},
};

#[derive(Debug, Error)]
pub(crate) enum HttpRenderError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported URL scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server responded with status {0}")]
    Status(reqwest::StatusCode),
}

/// Fetches the served document as-is, without running scripts.
///
/// Useful where no browser is installed or for statically generated sites.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub(crate) async fn fetch(&self, url: &PageUrl) -> Result<String, HttpRenderError> {
        let target = Url::parse(url.as_str())?;
        if !matches!(target.scheme(), "http" | "https") {
            return Err(HttpRenderError::UnsupportedScheme(
                target.scheme().to_string(),
            ));
        }

        let response = self.client.get(target).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpRenderError::Status(status));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &PageUrl) -> RenderOutcome {
        match self.fetch(url).await {
            Ok(markup) => RenderOutcome::Markup(markup),
            Err(err) => {
                warn!(
                    target = "domcheck::render::http",
                    url = %url,
                    error = %err,
                    "http render failed"
                );
                RenderOutcome::failure(err.to_string())
            }
        }
    }
}

//! Renderer adapters.

mod browser;
mod http;

use std::sync::Arc;

use reqwest::Client;

pub use browser::BrowserRenderer;
pub use http::HttpRenderer;

use crate::{
    application::ports::Renderer,
    config::{RenderEngine, RenderSettings},
    infra::error::InfraError,
};

/// Build the renderer selected by `settings.engine`.
pub fn build_renderer(settings: &RenderSettings) -> Result<Arc<dyn Renderer>, InfraError> {
    match settings.engine {
        RenderEngine::Browser => Ok(Arc::new(
            BrowserRenderer::new(settings.browser_path.clone())
                .with_user_agent(settings.user_agent.clone()),
        )),
        RenderEngine::Http => {
            let client = Client::builder()
                .user_agent(settings.user_agent.clone())
                .build()
                .map_err(|err| {
                    InfraError::configuration(format!("failed to build HTTP client: {err}"))
                })?;
            Ok(Arc::new(HttpRenderer::new(client)))
        }
    }
}

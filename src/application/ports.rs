//! Capability traits describing the external collaborators of the pipeline.
//!
//! Implementations must be total: every failure is reported through the
//! returned outcome rather than by panicking or returning an error.

use async_trait::async_trait;

use crate::domain::{
    outcome::{RenderOutcome, ValidationOutcome},
    types::PageUrl,
};

/// Loads a page and returns its fully-resolved markup.
///
/// Each call owns its rendering context exclusively and releases it before
/// returning, on success and failure alike.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &PageUrl) -> RenderOutcome;
}

/// Checks markup for conformance problems.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, markup: &str) -> ValidationOutcome;
}

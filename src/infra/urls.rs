//! URL list loading.

use std::{io::ErrorKind, path::Path};

use tracing::info;

use crate::{domain::types::PageUrl, infra::error::InfraError};

/// Read one URL per line, trimming each and skipping blank lines.
pub async fn load_urls(path: &Path) -> Result<Vec<PageUrl>, InfraError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| match err.kind() {
            ErrorKind::NotFound => InfraError::input_missing(path),
            _ => InfraError::input(path, err),
        })?;

    let urls = parse_url_list(&contents);
    info!(
        target = "domcheck::input",
        path = %path.display(),
        urls = urls.len(),
        "loaded URL list"
    );
    Ok(urls)
}

pub fn parse_url_list(contents: &str) -> Vec<PageUrl> {
    contents
        .split('\n')
        .filter_map(|line| PageUrl::parse(line).ok())
        .collect()
}

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    process::Stdio,
    time::Instant,
};

use async_trait::async_trait;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

use crate::{
    application::ports::Renderer,
    domain::{outcome::RenderOutcome, types::PageUrl},
};

const STDERR_EXCERPT_CHARS: usize = 240;

#[derive(Debug, Error)]
pub(crate) enum BrowserRenderError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported URL scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("failed to create browser profile: {0}")]
    Profile(io::Error),
    #[error("browser unavailable: {0}")]
    NotFound(io::Error),
    #[error("failed to run browser: {0}")]
    Io(io::Error),
    #[error("browser exited with status {}: {stderr}", describe_exit(*exit_code))]
    Exit {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("browser returned an empty document")]
    EmptyDocument,
    #[error("browser output is not valid UTF-8")]
    Encoding,
}

/// Renders pages by running a headless Chromium-family browser with
/// `--dump-dom`.
///
/// Every call starts its own browser process with a throwaway profile
/// directory. The process is killed and the profile removed when the call
/// returns or its future is dropped.
#[derive(Debug, Clone)]
pub struct BrowserRenderer {
    browser_path: PathBuf,
    user_agent: Option<String>,
}

impl BrowserRenderer {
    pub fn new(browser_path: impl Into<PathBuf>) -> Self {
        Self {
            browser_path: browser_path.into(),
            user_agent: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub(crate) async fn dump_dom(&self, url: &PageUrl) -> Result<String, BrowserRenderError> {
        let target = Url::parse(url.as_str())?;
        if !matches!(target.scheme(), "http" | "https" | "file") {
            return Err(BrowserRenderError::UnsupportedScheme(
                target.scheme().to_string(),
            ));
        }

        let profile = tempfile::Builder::new()
            .prefix("domcheck-profile-")
            .tempdir()
            .map_err(BrowserRenderError::Profile)?;

        let started_at = Instant::now();
        let output = self
            .command(&profile, &target)
            .output()
            .await
            .map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    BrowserRenderError::NotFound(err)
                } else {
                    BrowserRenderError::Io(err)
                }
            })?;

        if !output.status.success() {
            let stderr = excerpt(&String::from_utf8_lossy(&output.stderr));
            return Err(BrowserRenderError::Exit {
                exit_code: output.status.code(),
                stderr,
            });
        }

        let markup = String::from_utf8(output.stdout).map_err(|_| BrowserRenderError::Encoding)?;
        if markup.trim().is_empty() {
            return Err(BrowserRenderError::EmptyDocument);
        }

        debug!(
            target = "domcheck::render::browser",
            url = %url,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            markup_bytes = markup.len(),
            "page rendered"
        );

        Ok(markup)
    }

    fn command(&self, profile: &TempDir, target: &Url) -> Command {
        let mut command = Command::new(&self.browser_path);
        command
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-first-run")
            .arg("--hide-scrollbars")
            .arg("--mute-audio")
            .arg(format!("--user-data-dir={}", profile.path().display()));
        if let Some(user_agent) = &self.user_agent {
            command.arg(format!("--user-agent={user_agent}"));
        }
        command
            .arg("--dump-dom")
            .arg(target.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Renderer for BrowserRenderer {
    async fn render(&self, url: &PageUrl) -> RenderOutcome {
        match self.dump_dom(url).await {
            Ok(markup) => RenderOutcome::Markup(markup),
            Err(err) => {
                warn!(
                    target = "domcheck::render::browser",
                    url = %url,
                    browser = %self.browser_path.display(),
                    error = %err,
                    "browser render failed"
                );
                RenderOutcome::failure(err.to_string())
            }
        }
    }
}

/// Last non-empty stderr line, capped in length. Chromium prints its own
/// diagnostics before the navigation error.
fn excerpt(stderr: &str) -> String {
    let line = stderr
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty())
        .unwrap_or("no output");
    line.chars().take(STDERR_EXCERPT_CHARS).collect()
}

fn describe_exit(exit_code: Option<i32>) -> String {
    exit_code.map_or_else(|| "signal".to_string(), |code| code.to_string())
}

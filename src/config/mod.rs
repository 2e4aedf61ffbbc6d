//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::{application::scheduler::BatchMode, infra::validator::DEFAULT_VALIDATOR_URL};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "domcheck";
const ENV_PREFIX: &str = "DOMCHECK";
pub(crate) const DEFAULT_BROWSER_PATH: &str = "chromium";
pub(crate) const DEFAULT_USER_AGENT: &str = concat!("domcheck/", env!("CARGO_PKG_VERSION"));

/// Command-line arguments for the domcheck binary.
#[derive(Debug, Parser)]
#[command(
    name = "domcheck",
    version,
    about = "Render pages, check their markup for HTML conformance, and write a CSV report",
    allow_negative_numbers = true
)]
pub struct CliArgs {
    /// File with one URL per line; blank lines are ignored.
    #[arg(value_name = "URLS_FILE", value_hint = ValueHint::FilePath)]
    pub urls_file: PathBuf,

    /// Where to write the CSV report.
    #[arg(value_name = "OUTPUT_CSV", value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Number of pages rendered and validated at the same time.
    #[arg(value_name = "CONCURRENCY", value_parser = clap::value_parser!(usize))]
    pub concurrency: usize,

    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "DOMCHECK_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: RunOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RunOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override how pages are loaded (browser|http).
    #[arg(long = "render-engine", value_name = "ENGINE")]
    pub render_engine: Option<String>,

    /// Override the headless browser executable.
    #[arg(long = "browser-path", value_name = "PATH")]
    pub browser_path: Option<PathBuf>,

    /// Override the User-Agent sent when loading pages and calling the checker.
    #[arg(long = "user-agent", value_name = "AGENT")]
    pub user_agent: Option<String>,

    /// Override the conformance checker endpoint.
    #[arg(long = "validator-url", value_name = "URL")]
    pub validator_url: Option<String>,

    /// Override the scheduling strategy (barrier|pool).
    #[arg(long = "batch-mode", value_name = "MODE")]
    pub batch_mode: Option<String>,

    /// Give up on a page after this many seconds.
    #[arg(long = "timeout-seconds", value_name = "SECONDS")]
    pub timeout_seconds: Option<u64>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub render: RenderSettings,
    pub validator: ValidatorSettings,
    pub batch: BatchSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEngine {
    /// Headless Chromium-family browser; scripts run before the DOM is captured.
    Browser,
    /// Plain HTTP fetch of the served document.
    Http,
}

impl TryFrom<&str> for RenderEngine {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "browser" => Ok(RenderEngine::Browser),
            "http" => Ok(RenderEngine::Http),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub engine: RenderEngine,
    pub browser_path: PathBuf,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct ValidatorSettings {
    pub url: Url,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub concurrency: NonZeroUsize,
    pub mode: BatchMode,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);
    raw.batch.concurrency = Some(cli.concurrency);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    render: RawRenderSettings,
    validator: RawValidatorSettings,
    batch: RawBatchSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &RunOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(engine) = overrides.render_engine.as_ref() {
            self.render.engine = Some(engine.clone());
        }
        if let Some(path) = overrides.browser_path.as_ref() {
            self.render.browser_path = Some(path.clone());
        }
        if let Some(agent) = overrides.user_agent.as_ref() {
            self.render.user_agent = Some(agent.clone());
        }
        if let Some(url) = overrides.validator_url.as_ref() {
            self.validator.url = Some(url.clone());
        }
        if let Some(mode) = overrides.batch_mode.as_ref() {
            self.batch.mode = Some(mode.clone());
        }
        if let Some(seconds) = overrides.timeout_seconds {
            self.batch.timeout_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let logging = build_logging_settings(raw.logging)?;
        let render = build_render_settings(raw.render)?;
        let validator = build_validator_settings(raw.validator, &render.user_agent)?;
        let batch = build_batch_settings(raw.batch)?;

        Ok(Self {
            logging,
            render,
            validator,
            batch,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let engine = match render.engine {
        Some(value) => RenderEngine::try_from(value.as_str()).map_err(|()| {
            LoadError::invalid(
                "render.engine",
                format!("unknown engine `{value}` (expected browser or http)"),
            )
        })?,
        None => RenderEngine::Browser,
    };

    let browser_path = render
        .browser_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BROWSER_PATH));
    if browser_path.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "render.browser_path",
            "path must not be empty",
        ));
    }

    let user_agent = render
        .user_agent
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    Ok(RenderSettings {
        engine,
        browser_path,
        user_agent,
    })
}

fn build_validator_settings(
    validator: RawValidatorSettings,
    user_agent: &str,
) -> Result<ValidatorSettings, LoadError> {
    let raw_url = validator
        .url
        .unwrap_or_else(|| DEFAULT_VALIDATOR_URL.to_string());
    let url = Url::parse(raw_url.trim())
        .map_err(|err| LoadError::invalid("validator.url", format!("invalid URL: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "validator.url",
            "scheme must be http or https",
        ));
    }

    Ok(ValidatorSettings {
        url,
        user_agent: user_agent.to_string(),
    })
}

fn build_batch_settings(batch: RawBatchSettings) -> Result<BatchSettings, LoadError> {
    let concurrency = batch
        .concurrency
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| LoadError::invalid("batch.concurrency", "must be a positive integer"))?;

    let mode = match batch.mode {
        Some(value) => BatchMode::try_from(value.as_str()).map_err(|()| {
            LoadError::invalid(
                "batch.mode",
                format!("unknown mode `{value}` (expected barrier or pool)"),
            )
        })?,
        None => BatchMode::default(),
    };

    let timeout = match batch.timeout_seconds {
        Some(0) => {
            return Err(LoadError::invalid(
                "batch.timeout_seconds",
                "must be greater than zero",
            ));
        }
        Some(seconds) => Some(Duration::from_secs(seconds)),
        None => None,
    };

    Ok(BatchSettings {
        concurrency,
        mode,
        timeout,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    engine: Option<String>,
    browser_path: Option<PathBuf>,
    user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawValidatorSettings {
    url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBatchSettings {
    concurrency: Option<usize>,
    mode: Option<String>,
    timeout_seconds: Option<u64>,
}

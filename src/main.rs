use std::{process, sync::Arc};

use domcheck::{
    application::{error::AppError, processor::PageProcessor, scheduler::BatchScheduler},
    config::{self, CliArgs, Settings},
    domain::report::RunSummary,
    infra::{
        render::build_renderer, report::write_report, telemetry, urls::load_urls,
        validator::NuValidator,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let chain = error.messages().join(": ");
    if dispatcher::has_been_set() {
        error!(target = "domcheck::main", error = %chain, "run aborted");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(target = "domcheck::main", error = %chain, "run aborted");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let urls = load_urls(&cli_args.urls_file).await?;
    let scheduler = build_scheduler(&settings)?;

    let reports = scheduler.run(&urls).await;
    write_report(&cli_args.output, &reports)?;

    let summary = RunSummary::from_reports(&reports);
    info!(
        target = "domcheck::main",
        total = summary.total(),
        valid = summary.valid,
        invalid = summary.invalid,
        error = summary.error,
        "run complete"
    );
    announce_report(&cli_args);
    Ok(())
}

fn build_scheduler(settings: &Settings) -> Result<BatchScheduler, AppError> {
    let renderer = build_renderer(&settings.render)?;
    let validator = Arc::new(NuValidator::from_settings(&settings.validator)?);
    let processor = PageProcessor::new(renderer, validator).with_timeout(settings.batch.timeout);

    BatchScheduler::new(
        processor,
        settings.batch.concurrency.get(),
        settings.batch.mode,
    )
    .map_err(AppError::from)
}

fn announce_report(cli_args: &CliArgs) {
    println!("Results saved to {}", cli_args.output.display());
}

//! Pinterest Downloader - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use pinterest_downloader::{
    cli::Args,
    config::{validate_config, Config},
    download::RunSummary,
    error::{exit_codes, Error, Result},
    fs::ensure_dir,
    output::{
        print_banner, print_error, print_failures, print_info, print_run_summary, print_success,
        print_summary, print_warning, ProgressView,
    },
    queue::{QueueEvent, QueueOrchestrator, QueueSnapshot},
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(summary) => ExitCode::from(exit_code_for(&summary) as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::TomlParse(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::Destination(_) | Error::Io(_) => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

fn exit_code_for(summary: &RunSummary) -> i32 {
    if summary.cancelled > 0 {
        exit_codes::ABORT
    } else if summary.only_network_failures() {
        exit_codes::NETWORK_ERROR
    } else if summary.has_failures() {
        exit_codes::DOWNLOAD_ERROR
    } else {
        exit_codes::SUCCESS
    }
}

async fn run() -> Result<RunSummary> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        print_info(&format!(
            "No configuration file at {}, using defaults",
            args.config.display()
        ));
        Config::default()
    };

    args.merge_into_config(&mut config);
    validate_config(&config)?;

    let links = args.collect_links()?;
    if links.is_empty() {
        return Err(Error::Config(
            "No links given; pass pin or profile URLs or use --input".into(),
        ));
    }

    let destination = config.download_directory();
    ensure_dir(&destination)?;
    print_run_summary(
        links.len(),
        &destination.display().to_string(),
        &config.resolver.quality.to_string(),
        &config.resolver.story_pins.to_string(),
    );

    let orchestrator = QueueOrchestrator::from_config(&config)?;
    let mut handle = orchestrator.start(links, &destination)?;

    let cancel = handle.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            print_warning("Interrupted, finishing the current item...");
            cancel.cancel();
        }
    });

    let mut view = ProgressView::new(args.quiet);
    let mut snapshot = QueueSnapshot::default();
    let mut summary = RunSummary::default();

    while let Some(event) = handle.next_event().await {
        snapshot.apply(&event);
        view.handle(&event, &snapshot);
        if let QueueEvent::Finished(totals) = event {
            summary = totals;
        }
    }
    view.finish();
    handle.join().await?;

    print_failures(&snapshot);
    print_summary(&summary);
    if !summary.has_failures() && summary.cancelled == 0 {
        print_success(&format!("Saved {} file(s)", summary.completed()));
    }

    Ok(summary)
}

//! CLI entrypoint for conclave
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use conclave_application::{BroadcastHub, DiscussionOrchestrator, InMemoryDiscussionRepository};
use conclave_domain::{DiscussionEvent, DiscussionStatus};
use conclave_infrastructure::{
    ChannelObserver, ConfigLoader, FileConfig, JsonlTranscriptObserver, OpenAiCompatibleGateway,
    StaticRoleSupplier,
};
use conclave_presentation::{Cli, ConsoleObserver, DiscussionReport, ReportFormatter};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(cli.verbose, config.logging.log_dir.as_deref());

    check_config(&config)?;

    let topic = match cli.topic {
        Some(t) if !t.trim().is_empty() => t,
        _ => bail!("A topic is required. Run with --help for usage."),
    };

    info!("Starting conclave");

    // === Dependency Injection ===
    let engine = config.to_engine_config();
    let cast = config.cast();
    let role_count = cli.roles.unwrap_or_else(|| cast.len().min(engine.max_roles));

    let gateway = Arc::new(OpenAiCompatibleGateway::from_config(&config.provider));
    let repository = Arc::new(InMemoryDiscussionRepository::new());
    let hub = Arc::new(BroadcastHub::new(engine.delivery_timeout));
    let orchestrator = DiscussionOrchestrator::new(gateway, repository, hub, engine)
        .with_role_supplier(Arc::new(StaticRoleSupplier::new(cast)));

    let snapshot = orchestrator
        .create_from_topic(topic, role_count, cli.max_turns)
        .await?;
    let id = snapshot.id;

    // Observers: one channel for this task, console and transcript for the user
    let (channel, mut events) = ChannelObserver::new("cli");
    orchestrator.attach_observer(id, Arc::new(channel))?;

    if !cli.quiet {
        println!();
        println!("+============================================================+");
        println!("|                 Conclave - Panel Discussion                |");
        println!("+============================================================+");
        println!();
        println!("Topic: {}", snapshot.topic);
        println!(
            "Panel: {}",
            snapshot
                .roles
                .iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("Turn budget: {}", snapshot.max_turns);
        orchestrator.attach_observer(id, Arc::new(ConsoleObserver::new(&snapshot.roles)))?;
    }

    let transcript = match (&cli.transcript, &config.logging.transcript_dir) {
        (Some(path), _) => Some(JsonlTranscriptObserver::create(path)),
        (None, Some(dir)) => Some(JsonlTranscriptObserver::in_directory(dir, id)),
        (None, None) => None,
    };
    if let Some(transcript) = transcript {
        let transcript = transcript.context("Failed to open transcript file")?;
        info!(path = %transcript.path().display(), "Writing transcript");
        orchestrator.attach_observer(id, Arc::new(transcript))?;
    }

    orchestrator.start(id).await?;

    // Follow the event stream; the first Ctrl-C asks the loop to stop
    let mut stop_requested = false;
    let outcome = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) if event.is_final() => break Some(event),
                Some(_) => continue,
                None => break None,
            },
            signal = tokio::signal::ctrl_c(), if !stop_requested => {
                stop_requested = true;
                if let Err(e) = signal {
                    warn!("Could not listen for Ctrl-C: {}", e);
                    continue;
                }
                eprintln!("\nStopping after the current turn...");
                if let Err(e) = orchestrator.request_stop(id) {
                    debug!("Stop request ignored: {}", e);
                }
            }
        }
    };

    let status = orchestrator.wait_for_completion(id).await?;
    let discussion = orchestrator.status(id).await?;
    let messages = orchestrator
        .read_messages(id, 0, discussion.message_count)
        .await?
        .messages;

    let report = DiscussionReport {
        discussion,
        outcome,
        messages,
    };
    println!();
    println!("{}", ReportFormatter::format(&report, cli.output));

    orchestrator.shutdown().await;

    Ok(match (status, &report.outcome) {
        (DiscussionStatus::Failed, _) | (_, Some(DiscussionEvent::DiscussionFailed { .. })) => {
            ExitCode::FAILURE
        }
        _ => ExitCode::SUCCESS,
    })
}

/// Initialize logging based on verbosity level; `RUST_LOG` takes precedence.
///
/// With a log directory configured, records are also written to a daily
/// rolling file.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "conclave.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}

/// Print configuration issues; refuse to run on errors
fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    for issue in &issues {
        if issue.is_error() {
            eprintln!("config {}", issue);
        } else {
            warn!("config {}", issue);
        }
    }
    if issues.iter().any(|i| i.is_error()) {
        bail!("Invalid configuration ({} error(s))", issues.iter().filter(|i| i.is_error()).count());
    }
    Ok(())
}

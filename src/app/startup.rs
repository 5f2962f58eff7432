//! Runtime driver
//!
//! Parses the command line, applies the settings file, starts logging, loads
//! credentials and runs the selected loop until shutdown or a fatal error.

use super::cli::args::{Args, CursorSource, Invocation, Mode, RunSettings};
use super::cli::profile::OciProfile;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::{effective_level, init_logging};
use crate::core::retry::retry_async;
use crate::core::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::core::time::SystemTimeProvider;
use crate::streaming::client::StreamClient;
use crate::streaming::consumer::{ConsumerConfig, ConsumerLoop, LogSink};
use crate::streaming::cursor::CursorManager;
use crate::streaming::error::{StreamError, StreamResult};
use crate::streaming::http::HttpStreamClient;
use crate::streaming::model::Cursor;
use crate::streaming::producer::{ProducerConfig, ProducerLoop};
use clap::error::ErrorKind;
use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;

/// Run the program and return its exit status
pub async fn startup() -> i32 {
    let mut args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return 0;
        }
        Err(e) => {
            log::debug!("Unrecognised command line: {}", e);
            println!("{}", super::cli::args::usage());
            return 0;
        }
    };

    if args.run_mode().is_none() {
        println!("{}", super::cli::args::usage());
        return 0;
    }

    if let Err(e) = Args::load_config_file(&mut args).await {
        eprintln!("Error: {}", e);
        return 1;
    }

    let level = effective_level(args.log_level.as_deref(), args.verbosity());
    let log_file = args.effective_log_file();
    if let Err(e) = init_logging(
        Some(level),
        args.log_format.as_deref(),
        log_file.as_deref(),
        args.use_color(std::io::stdout().is_terminal()),
    ) {
        eprintln!("Error: failed to initialise logging: {}", e);
        return 1;
    }

    let settings = match args.resolve() {
        Ok(Invocation::Run(settings)) => settings,
        Ok(Invocation::Usage) => {
            println!("{}", super::cli::args::usage());
            return 0;
        }
        Err(e) => {
            log_error_with_context(&e, "Invalid arguments");
            return 1;
        }
    };

    log::info!(
        "{} {} starting as {:?} on stream {}",
        env!("CARGO_PKG_NAME"),
        crate::core::version::long_version(),
        settings.mode,
        settings.stream_id
    );

    match run(&settings).await {
        Ok(()) => 0,
        Err(e) => {
            let context = match settings.mode {
                Mode::Producer => "Producer failed",
                Mode::Consumer => "Consumer failed",
            };
            log_error_with_context(&e, context);
            1
        }
    }
}

/// Load credentials, build the HTTP client and run under signal handling
pub async fn run(settings: &RunSettings) -> StreamResult<()> {
    let profile = OciProfile::load(&settings.oci_config, &settings.profile).await?;
    if let Some(region) = &profile.region {
        log::debug!("Profile '{}' region: {}", settings.profile, region);
    }
    let signer = profile.signer().await?;
    let client: Arc<dyn StreamClient> =
        Arc::new(HttpStreamClient::new(&settings.endpoint, signer)?);

    ShutdownCoordinator::guard(|mut shutdown| async move {
        run_with_client(client, settings, &mut shutdown).await
    })
    .await
}

/// Run the selected mode against an already-built client
pub async fn run_with_client(
    client: Arc<dyn StreamClient>,
    settings: &RunSettings,
    shutdown: &mut ShutdownSignal,
) -> StreamResult<()> {
    match settings.mode {
        Mode::Producer => {
            let config = ProducerConfig {
                interval: settings.interval,
                retry: settings.retry.clone(),
            };
            let mut producer = ProducerLoop::new(
                client,
                settings.stream_id.as_str(),
                Arc::new(SystemTimeProvider),
                config,
            );
            producer.run(shutdown).await
        }
        Mode::Consumer => {
            let cursor = initial_cursor(client.clone(), settings).await?;
            let config = ConsumerConfig {
                interval: settings.interval,
                limit: settings.limit,
                retry: settings.retry.clone(),
            };
            let mut consumer =
                ConsumerLoop::new(client, settings.stream_id.as_str(), cursor, config, LogSink);
            consumer.run(shutdown).await
        }
    }
}

/// Create the consumer's starting cursor, retrying transient failures
pub async fn initial_cursor(
    client: Arc<dyn StreamClient>,
    settings: &RunSettings,
) -> StreamResult<Cursor> {
    let manager = CursorManager::new(client, settings.stream_id.as_str());
    let manager = &manager;
    let source = &settings.cursor_source;

    retry_async(
        "create_cursor",
        &settings.retry,
        StreamError::is_retryable,
        move || async move {
            match source {
                CursorSource::Partition(partition) => {
                    manager.create_partition_cursor(partition).await
                }
                CursorSource::Group(membership) => manager.create_group_cursor(membership).await,
            }
        },
    )
    .await
}

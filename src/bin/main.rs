//! instance-dns-sync binary entry point.
//!
//! The message bus adapter is an external collaborator; this binary reads
//! already-decoded notification envelopes as newline-delimited JSON on
//! stdin and dispatches each one. Bad lines are logged and skipped; a
//! single bad event never takes the consumer down.

use clap::Parser;
use instance_dns_sync::{
    telemetry, Config, Dispatcher, HttpZoneApi, InstanceFqdnHandler, NotificationEnvelope,
    SharedHandlerConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

/// Notification-driven DNS record synchronizer for compute instances.
#[derive(Parser, Debug)]
#[command(name = "instance-dns-sync")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML).
    #[arg(short, long, default_value = "instance-dns-sync.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // Load configuration
    let config: Config = config::Config::builder()
        .add_source(config::File::from(args.config.clone()))
        .add_source(
            config::Environment::with_prefix("INSTANCE_DNS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    // Initialize telemetry
    telemetry::init(&config.telemetry)?;

    info!(
        config_file = %args.config.display(),
        zone_api = %config.zone_api.endpoint,
        exchange = %config.handler.control_exchange,
        topics = ?config.handler.notification_topics,
        "Starting instance-dns-sync"
    );

    let api = Arc::new(HttpZoneApi::new(&config.zone_api)?);
    let handler = InstanceFqdnHandler::new(SharedHandlerConfig::new(config.handler), api);

    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Arc::new(handler));

    run_event_loop(&dispatcher).await?;

    info!("instance-dns-sync shutdown complete");
    Ok(())
}

/// Read envelopes from stdin until EOF or ctrl-c.
async fn run_event_loop(dispatcher: &Dispatcher) -> Result<(), std::io::Error> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                return Ok(());
            }

            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => match serde_json::from_str::<NotificationEnvelope>(&line) {
                        Ok(envelope) => dispatcher.dispatch(&envelope).await,
                        Err(e) => {
                            // Wire decoding belongs to the bus adapter; a
                            // broken line here is logged and skipped.
                            error!(error = %e, "failed to decode notification envelope");
                        }
                    },
                    None => {
                        warn!("Event feed closed, shutting down");
                        return Ok(());
                    }
                }
            }
        }
    }
}

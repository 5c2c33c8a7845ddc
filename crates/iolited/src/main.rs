use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use iolited::config::LoggingConfig;
use iolited::engine::IntegrationContext;
use iolited::hub::JsonFileClient;
use iolited::Config;
use iolited::Coordinator;
use iolited::Engine;
use tokio::sync::watch;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Expose IOLITE humidity sensors as Home Assistant entities
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "iolited.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    init_logging(&config.logging);

    tracing::info!("iolited starting");
    tracing::info!("Loaded config from: {}", args.config.display());

    let client = JsonFileClient::new(&config.hub.snapshot_path);
    let coordinator = Arc::new(Coordinator::default());

    // Entities are built from whatever the first refresh returns
    if let Err(e) = coordinator.refresh(&client).await {
        tracing::warn!(
            "Initial refresh from {} failed, starting with no devices: {}",
            client.path().display(),
            e
        );
    }

    let engine = Arc::new(Engine::new());

    #[cfg(feature = "export_mqtt")]
    let mqtt_task = match &config.mqtt {
        Some(mqtt_config) => {
            let publisher = iolited::mqtt::publisher_from_config(mqtt_config)?;
            let events = engine.subscribe_events();
            Some(tokio::spawn(publisher.run(events)))
        }
        None => None,
    };
    #[cfg(not(feature = "export_mqtt"))]
    let mqtt_task: Option<tokio::task::JoinHandle<()>> = None;

    engine.register_integrations_from_config(&IntegrationContext {
        config: &config,
        coordinator: coordinator.clone(),
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poll_task = {
        let coordinator = coordinator.clone();
        let interval = config.hub.poll_interval();
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            coordinator.run(&client, interval, shutdown_rx).await;
        })
    };

    let (api_shutdown_tx, api_task) = match &config.api {
        Some(api) => {
            let (tx, rx) = tokio::sync::oneshot::channel();
            let task = tokio::spawn(iolited::api::serve(
                api.listen.clone(),
                api.port,
                engine.clone(),
                rx,
            ));
            (Some(tx), Some(task))
        }
        None => (None, None),
    };

    let engine_task = {
        let engine = engine.clone();
        let mut shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            engine
                .run(async move {
                    let _ = shutdown_rx.wait_for(|stop| *stop).await;
                })
                .await
        })
    };

    tracing::info!("iolited running, press Ctrl+C to exit");

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received shutdown signal"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }

    shutdown_tx.send_replace(true);
    engine.shutdown().await;

    if let Some(tx) = api_shutdown_tx {
        let _ = tx.send(());
    }
    if let Some(task) = api_task {
        match task.await {
            Ok(Err(e)) => tracing::error!("HTTP API server failed: {}", e),
            Err(e) => tracing::error!("HTTP API task failed: {}", e),
            Ok(Ok(())) => {}
        }
    }

    if let Err(e) = poll_task.await {
        tracing::error!("Coordinator task failed: {}", e);
    }
    match engine_task.await {
        Ok(Err(e)) => tracing::error!("Engine failed: {}", e),
        Err(e) => tracing::error!("Engine task failed: {}", e),
        Ok(Ok(())) => {}
    }

    if let Some(task) = mqtt_task {
        // The engine still holds the event sender, so the publisher never sees Closed
        task.abort();
    }

    tracing::info!("iolited shutdown complete");

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let targets = Targets::new()
        .with_default(logging.level)
        .with_targets(
            logging
                .overrides
                .iter()
                .map(|(target, level)| (target.clone(), *level)),
        );

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(targets)
        .init();
}

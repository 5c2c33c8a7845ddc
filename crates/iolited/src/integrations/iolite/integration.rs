use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::sensor::IoliteSensor;
use super::walker::build_entities;
use crate::coordinator::Coordinator;
use crate::engine::EntitySink;
use crate::engine::Integration;

/// Sensor integration for IOLITE humidity sensors
///
/// Entities are built once, from the snapshot the coordinator holds at setup
/// time. Devices that appear later are not picked up until restart.
pub struct IoliteIntegration {
    coordinator: Arc<Coordinator>,
    refresh_task: Option<JoinHandle<()>>,
}

impl IoliteIntegration {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self {
            coordinator,
            refresh_task: None,
        }
    }

    /// Resolve every entity against one snapshot and write the values
    async fn publish_all(
        coordinator: &Coordinator,
        entities: &[IoliteSensor],
        sink: &EntitySink,
    ) -> Result<(), Box<dyn Error + Send>> {
        let snapshot = coordinator.snapshot();
        for entity in entities {
            entity.on_refresh(&snapshot, sink).await?;
        }
        Ok(())
    }

    /// Forward coordinator refreshes to the entities until the engine goes away
    async fn refresh_task(
        coordinator: Arc<Coordinator>,
        mut refreshed: watch::Receiver<u64>,
        entities: Vec<IoliteSensor>,
        sink: EntitySink,
    ) {
        while refreshed.changed().await.is_ok() {
            let generation = *refreshed.borrow_and_update();
            debug!(
                "Refreshing {} entities for generation {}",
                entities.len(),
                generation
            );

            if let Err(e) = Self::publish_all(&coordinator, &entities, &sink).await {
                warn!("Failed to publish sensor states: {}", e);
                break;
            }
        }

        info!("IOLITE refresh task exiting");
    }
}

#[async_trait]
impl Integration for IoliteIntegration {
    fn name(&self) -> &str {
        "iolite"
    }

    async fn setup(&mut self, sink: EntitySink) -> Result<(), Box<dyn Error + Send>> {
        info!("Setting up IOLITE sensors");

        // Subscribe before building so a refresh racing setup is not lost
        let refreshed = self.coordinator.subscribe();
        let entities = build_entities(&self.coordinator);
        sink.add_entities(&entities).await?;
        Self::publish_all(&self.coordinator, &entities, &sink).await?;

        info!("Added {} IOLITE sensor entities", entities.len());

        let coordinator = self.coordinator.clone();
        let task = tokio::spawn(Self::refresh_task(coordinator, refreshed, entities, sink));
        self.refresh_task = Some(task);

        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), Box<dyn Error + Send>> {
        info!("IOLITE integration shutting down");

        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }

        Ok(())
    }
}

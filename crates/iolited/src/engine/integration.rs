use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use linkme::distributed_slice;
use tokio::sync::mpsc;
use tracing::warn;

use super::entity::Entity;
use super::entity::SensorValue;
use super::message::FromIntegrationMessage;
use crate::config::Config;
use crate::coordinator::Coordinator;

/// Channel types for messages FROM integrations TO the engine
/// These are bounded channels to provide backpressure
pub type FromIntegrationSender = mpsc::Sender<FromIntegrationMessage>;
pub type FromIntegrationReceiver = mpsc::Receiver<FromIntegrationMessage>;

/// Result type for integration factory functions
pub type IntegrationFactoryResult = anyhow::Result<Option<Box<dyn Integration>>>;

pub struct IntegrationContext<'a> {
    pub config: &'a Config,
    pub coordinator: Arc<Coordinator>,
}

#[distributed_slice]
pub static REGISTRY: [fn(&IntegrationContext) -> IntegrationFactoryResult];

/// Handle through which an integration publishes entities and their state.
///
/// Replaces a global entity registry: the engine hands one to each
/// integration on setup, and the integration writes into it.
#[derive(Debug, Clone)]
pub struct EntitySink {
    integration_name: String,
    tx: FromIntegrationSender,
}

impl EntitySink {
    pub fn new(integration_name: impl Into<String>, tx: FromIntegrationSender) -> Self {
        Self {
            integration_name: integration_name.into(),
            tx,
        }
    }

    /// Register entities with the engine
    pub async fn add_entities<E: Entity>(&self, entities: &[E]) -> Result<(), Box<dyn Error + Send>> {
        for entity in entities {
            let msg = FromIntegrationMessage::EntityAdded {
                descriptor: entity.descriptor(),
                integration_name: self.integration_name.clone(),
            };
            self.send(msg).await?;
        }
        Ok(())
    }

    /// Publish a sensor value
    pub async fn write_state(
        &self,
        entity_id: &str,
        value: SensorValue,
    ) -> Result<(), Box<dyn Error + Send>> {
        let msg = FromIntegrationMessage::SensorStateChanged {
            entity_id: entity_id.to_string(),
            value,
        };
        self.send(msg).await
    }

    async fn send(&self, msg: FromIntegrationMessage) -> Result<(), Box<dyn Error + Send>> {
        self.tx.send(msg).await.map_err(|e| -> Box<dyn Error + Send> {
            warn!("[{}] Engine channel closed", self.integration_name);
            Box::new(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e.to_string(),
            ))
        })
    }
}

/// Integration trait that all integrations must implement
#[async_trait]
pub trait Integration: Send + Sync {
    /// Get the name/identifier of this integration
    fn name(&self) -> &str;

    /// Set up the integration - build entities, start forwarding refreshes, etc.
    ///
    /// The integration receives a sink to publish entities and state back to
    /// the engine.
    async fn setup(&mut self, sink: EntitySink) -> Result<(), Box<dyn Error + Send>>;

    /// Shut down the integration gracefully
    async fn shutdown(&mut self) -> Result<(), Box<dyn Error + Send>>;
}

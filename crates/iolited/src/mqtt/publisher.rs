use std::error::Error;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::client::MqttClient;
use super::discovery::SensorDiscovery;
use super::discovery::Topics;
use crate::config::MqttConfig;
use crate::engine::EntityDescriptor;
use crate::engine::Event;
use crate::engine::SensorValue;

const ONLINE: &[u8] = b"online";
const OFFLINE: &[u8] = b"offline";

/// Exports engine events to Home Assistant over MQTT
///
/// Entities are announced with retained discovery configs; every state write
/// is published to the entity's state and availability topics.
pub struct MqttPublisher<C: MqttClient> {
    client: C,
    config: MqttConfig,
}

impl<C: MqttClient> MqttPublisher<C> {
    pub fn new(client: C, config: &MqttConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    fn topics(&self, unique_id: &str) -> Topics {
        Topics::new(
            &self.config.discovery_prefix,
            &self.config.state_prefix,
            unique_id,
        )
    }

    /// Connect, then publish events until the engine's event channel closes
    pub async fn run(mut self, mut events: broadcast::Receiver<Event>) {
        info!(
            "Connecting to MQTT broker at {}:{}",
            self.config.broker, self.config.port
        );
        if let Err(e) = self.client.connect().await {
            warn!("Failed to connect to MQTT broker: {}", e);
            return;
        }

        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(e) = self.handle_event(&event).await {
                        warn!("Failed to publish {:?}: {}", event, e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("MQTT publisher lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }

        info!("MQTT publisher exiting");
    }

    pub async fn handle_event(&mut self, event: &Event) -> Result<(), Box<dyn Error + Send>> {
        match event {
            Event::EntityAdded { descriptor } => self.announce(descriptor).await,
            Event::SensorStateChanged { entity_id, value } => {
                self.publish_state(entity_id, *value).await
            }
        }
    }

    async fn announce(&mut self, descriptor: &EntityDescriptor) -> Result<(), Box<dyn Error + Send>> {
        let topics = self.topics(&descriptor.unique_id);
        let payload = serde_json::to_vec(&SensorDiscovery::from_descriptor(descriptor, &topics))
            .map_err(|e| -> Box<dyn Error + Send> { Box::new(e) })?;

        self.client.publish(&topics.config, &payload, true).await?;
        info!("Announced {} on {}", descriptor.unique_id, topics.config);
        Ok(())
    }

    async fn publish_state(
        &mut self,
        entity_id: &str,
        value: SensorValue,
    ) -> Result<(), Box<dyn Error + Send>> {
        let topics = self.topics(entity_id);

        match value {
            SensorValue::Available(v) => {
                let payload = v.to_string();
                self.client
                    .publish(&topics.state, payload.as_bytes(), true)
                    .await?;
                self.client
                    .publish(&topics.availability, ONLINE, true)
                    .await?;
                debug!("Published {} = {}", entity_id, payload);
            }
            SensorValue::Unavailable => {
                self.client
                    .publish(&topics.availability, OFFLINE, true)
                    .await?;
                debug!("Published {} offline", entity_id);
            }
        }

        Ok(())
    }
}

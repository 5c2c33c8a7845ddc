//! Home Assistant MQTT exporter.

mod client;
mod discovery;
mod publisher;

use anyhow::Context;
pub use client::MqttClient;
pub use client::RumqttcClient;
pub use discovery::SensorDiscovery;
pub use discovery::Topics;
pub use publisher::MqttPublisher;

use crate::config::MqttConfig;

/// Build a publisher connected through rumqttc
pub fn publisher_from_config(config: &MqttConfig) -> anyhow::Result<MqttPublisher<RumqttcClient>> {
    let client = RumqttcClient::new(config).context("Failed to create MQTT client")?;
    Ok(MqttPublisher::new(client, config))
}

//! Entity abstraction for iolited
//!
//! Every published observation implements the Entity trait. The engine only
//! ever sees the descriptor and the values written through the sink.

use serde::Deserialize;
use serde::Serialize;

use super::device::DeviceInfo;

/// Device class of a numeric sensor, matching Home Assistant's sensor device classes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorDeviceClass {
    Humidity,
    Temperature,
}

/// How a sensor's values relate to each other over time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateClass {
    Measurement,
}

/// Latest value of a sensor
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum SensorValue {
    Available(f64),
    #[default]
    Unavailable,
}

impl SensorValue {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Static description of an entity, fixed for its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub unique_id: String,
    pub name: String,
    pub platform: String,
    pub device_class: Option<SensorDeviceClass>,
    pub unit_of_measurement: Option<String>,
    pub state_class: Option<StateClass>,
    pub device: Option<DeviceInfo>,
}

/// Base trait that all entities must implement
pub trait Entity: Send + Sync {
    /// Identifier unique across all integrations
    fn unique_id(&self) -> &str;

    /// Return the platform type of this entity (e.g. "sensor")
    fn platform(&self) -> &'static str;

    /// Static description handed to the engine on registration
    fn descriptor(&self) -> EntityDescriptor;

    /// Current value, resolved at call time
    fn native_value(&self) -> SensorValue;
}

use std::collections::HashMap;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use tracing::warn;

/// Rooms keyed by room identifier, as last reported by the hub.
///
/// A snapshot is never edited after it has been published; the coordinator
/// replaces it wholesale on every refresh.
pub type Snapshot = HashMap<String, Room>;

/// A room (IOLITE "place") and the devices it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub identifier: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_devices")]
    pub devices: HashMap<String, Device>,
}

/// Decode devices one at a time, dropping any that do not parse.
///
/// A single malformed device must not cost every other room its readings.
fn deserialize_devices<'de, D>(deserializer: D) -> Result<HashMap<String, Device>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<Device>(value) {
            Ok(device) => Some((key, device)),
            Err(e) => {
                warn!("Skipping malformed device {}: {}", key, e);
                None
            }
        })
        .collect())
}

/// A device reported by the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Hub identifier, stable across refreshes
    pub identifier: String,

    /// Human-readable name
    pub name: String,

    #[serde(default)]
    pub manufacturer: Option<String>,

    /// Identifier of the room this device is placed in
    pub place_identifier: String,

    #[serde(flatten)]
    pub kind: DeviceKind,
}

/// What a device is and the readings it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceKind {
    HumiditySensor {
        /// Relative humidity in percent
        #[serde(default)]
        humidity_level: Option<u8>,
        /// Ambient temperature in degrees Celsius
        #[serde(default)]
        current_env_temp: Option<f64>,
    },
    RadiatorValve {
        current_env_temp: f64,
        #[serde(default)]
        battery_level: Option<u8>,
        #[serde(default)]
        valve_position: Option<u8>,
    },
    Lamp,
    Switch,
    Blind,
    /// A device type not yet known to iolited
    #[serde(other)]
    Unknown,
}

impl Device {
    /// Relative humidity, if this is a humidity sensor that reported one.
    pub fn humidity_level(&self) -> Option<u8> {
        match self.kind {
            DeviceKind::HumiditySensor { humidity_level, .. } => humidity_level,
            _ => None,
        }
    }

    /// Ambient temperature, if this is a humidity sensor that reported one.
    pub fn env_temperature(&self) -> Option<f64> {
        match self.kind {
            DeviceKind::HumiditySensor {
                current_env_temp, ..
            } => current_env_temp,
            _ => None,
        }
    }

    pub fn is_humidity_sensor(&self) -> bool {
        matches!(self.kind, DeviceKind::HumiditySensor { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_snapshot() {
        let json = r#"{
            "room1": {
                "identifier": "room1",
                "name": "Kitchen",
                "devices": {
                    "dev1": {
                        "identifier": "dev1",
                        "name": "Sensor A",
                        "manufacturer": "IOLITE",
                        "place_identifier": "room1",
                        "type": "humidity_sensor",
                        "humidity_level": 45,
                        "current_env_temp": 21.0
                    },
                    "dev2": {
                        "identifier": "dev2",
                        "name": "Radiator",
                        "place_identifier": "room1",
                        "type": "radiator_valve",
                        "current_env_temp": 20.5,
                        "battery_level": 80
                    }
                }
            }
        }"#;

        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        let room = &snapshot["room1"];
        assert_eq!(room.name, "Kitchen");

        let sensor = &room.devices["dev1"];
        assert_eq!(sensor.manufacturer.as_deref(), Some("IOLITE"));
        assert_eq!(sensor.humidity_level(), Some(45));
        assert_eq!(sensor.env_temperature(), Some(21.0));

        let valve = &room.devices["dev2"];
        assert!(!valve.is_humidity_sensor());
        assert_eq!(valve.manufacturer, None);
        assert_eq!(
            valve.kind,
            DeviceKind::RadiatorValve {
                current_env_temp: 20.5,
                battery_level: Some(80),
                valve_position: None,
            }
        );
    }

    #[test]
    fn test_decode_unknown_device_type() {
        let json = r#"{
            "identifier": "dev9",
            "name": "Doorbell",
            "place_identifier": "hall",
            "type": "doorbell"
        }"#;

        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.kind, DeviceKind::Unknown);
        assert_eq!(device.humidity_level(), None);
    }

    #[test]
    fn test_room_without_devices() {
        let json = r#"{"identifier": "attic", "name": "Attic"}"#;
        let room: Room = serde_json::from_str(json).unwrap();
        assert!(room.devices.is_empty());
    }

    #[test]
    fn test_sensor_missing_reading_still_decodes() {
        let json = r#"{
            "identifier": "dev2",
            "name": "Sensor B",
            "place_identifier": "room2",
            "type": "humidity_sensor",
            "humidity_level": null,
            "current_env_temp": 19.5
        }"#;

        let device: Device = serde_json::from_str(json).unwrap();
        assert!(device.is_humidity_sensor());
        assert_eq!(device.humidity_level(), None);
        assert_eq!(device.env_temperature(), Some(19.5));
    }

    #[test]
    fn test_malformed_device_is_dropped_from_its_room() {
        let json = r#"{
            "room1": {
                "identifier": "room1",
                "name": "Kitchen",
                "devices": {
                    "dev1": {
                        "identifier": "dev1",
                        "name": "Sensor A",
                        "place_identifier": "room1",
                        "type": "humidity_sensor",
                        "humidity_level": 45,
                        "current_env_temp": 21.0
                    },
                    "dev3": {
                        "identifier": "dev3",
                        "name": "Sensor C",
                        "place_identifier": "room1",
                        "type": "humidity_sensor",
                        "humidity_level": "high"
                    }
                }
            },
            "room2": {
                "identifier": "room2",
                "name": "Bathroom",
                "devices": {
                    "dev2": {
                        "identifier": "dev2",
                        "name": "Sensor B",
                        "place_identifier": "room2",
                        "type": "humidity_sensor",
                        "humidity_level": null,
                        "current_env_temp": 19.5
                    }
                }
            }
        }"#;

        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        let kitchen = &snapshot["room1"].devices;
        assert_eq!(kitchen.len(), 1);
        assert_eq!(kitchen["dev1"].humidity_level(), Some(45));

        let bathroom = &snapshot["room2"].devices;
        assert_eq!(bathroom["dev2"].humidity_level(), None);
    }
}

use serde::Serialize;

use crate::engine::EntityDescriptor;

/// Node id under which all iolited entities are announced
const NODE_ID: &str = "iolite";

/// Sensor discovery config for Home Assistant's MQTT integration
///
/// Published retained to `<prefix>/sensor/iolite/<object_id>/config`.
#[derive(Debug, Clone, Serialize)]
pub struct SensorDiscovery {
    /// Human-readable name of the entity
    pub name: String,

    /// Unique identifier for this entity
    pub unique_id: String,

    /// Topic carrying the numeric state
    pub state_topic: String,

    /// Topic carrying `online`/`offline`
    pub availability_topic: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DiscoveryDevice>,
}

/// Device block of a discovery config
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryDevice {
    pub identifiers: Vec<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
}

/// Topics for one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub config: String,
    pub state: String,
    pub availability: String,
}

impl Topics {
    pub fn new(discovery_prefix: &str, state_prefix: &str, unique_id: &str) -> Self {
        let object_id = object_id(unique_id);
        Self {
            config: format!(
                "{}/sensor/{}/{}/config",
                discovery_prefix, NODE_ID, object_id
            ),
            state: format!("{}/{}/state", state_prefix, object_id),
            availability: format!("{}/{}/availability", state_prefix, object_id),
        }
    }
}

/// Make a unique id safe for use as a topic level
///
/// Home Assistant only accepts `[a-zA-Z0-9_-]` in discovery object ids.
pub fn object_id(unique_id: &str) -> String {
    unique_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl SensorDiscovery {
    pub fn from_descriptor(descriptor: &EntityDescriptor, topics: &Topics) -> Self {
        Self {
            name: descriptor.name.clone(),
            unique_id: descriptor.unique_id.clone(),
            state_topic: topics.state.clone(),
            availability_topic: topics.availability.clone(),
            device_class: descriptor.device_class.map(|c| c.to_string()),
            unit_of_measurement: descriptor.unit_of_measurement.clone(),
            state_class: descriptor.state_class.map(|c| c.to_string()),
            device: descriptor.device.as_ref().map(|d| DiscoveryDevice {
                identifiers: d.flat_identifiers(),
                name: d.name.clone(),
                manufacturer: d.manufacturer.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DeviceInfo;
    use crate::engine::SensorDeviceClass;
    use crate::engine::StateClass;

    #[test]
    fn test_topics() {
        let topics = Topics::new("homeassistant", "iolite", "dev1Humidity");
        assert_eq!(topics.config, "homeassistant/sensor/iolite/dev1Humidity/config");
        assert_eq!(topics.state, "iolite/dev1Humidity/state");
        assert_eq!(topics.availability, "iolite/dev1Humidity/availability");
    }

    #[test]
    fn test_object_id_replaces_topic_characters() {
        assert_eq!(object_id("a/b+c#d e"), "a_b_c_d_e");
        assert_eq!(object_id("dev-1_Humidity"), "dev-1_Humidity");
    }

    #[test]
    fn test_discovery_payload() {
        let descriptor = EntityDescriptor {
            unique_id: "dev1Humidity".to_string(),
            name: "Sensor A (Kitchen)".to_string(),
            platform: "sensor".to_string(),
            device_class: Some(SensorDeviceClass::Humidity),
            unit_of_measurement: Some("%".to_string()),
            state_class: Some(StateClass::Measurement),
            device: Some(
                DeviceInfo::new("iolite", "dev1Humidity", "Sensor A (Kitchen)".to_string())
                    .with_manufacturer(Some("IOLITE".to_string())),
            ),
        };
        let topics = Topics::new("homeassistant", "iolite", &descriptor.unique_id);

        let payload = SensorDiscovery::from_descriptor(&descriptor, &topics);
        let json = serde_json::to_string_pretty(&payload).unwrap();

        insta::assert_snapshot!(json, @r#"
        {
          "name": "Sensor A (Kitchen)",
          "unique_id": "dev1Humidity",
          "state_topic": "iolite/dev1Humidity/state",
          "availability_topic": "iolite/dev1Humidity/availability",
          "device_class": "humidity",
          "unit_of_measurement": "%",
          "state_class": "measurement",
          "device": {
            "identifiers": [
              "iolite_dev1Humidity"
            ],
            "name": "Sensor A (Kitchen)",
            "manufacturer": "IOLITE"
          }
        }
        "#);
    }

    #[test]
    fn test_discovery_payload_without_optional_fields() {
        let descriptor = EntityDescriptor {
            unique_id: "x".to_string(),
            name: "X".to_string(),
            platform: "sensor".to_string(),
            device_class: None,
            unit_of_measurement: None,
            state_class: None,
            device: None,
        };
        let topics = Topics::new("ha", "iolite", "x");

        let json = serde_json::to_value(SensorDiscovery::from_descriptor(&descriptor, &topics)).unwrap();
        assert!(json.get("device").is_none());
        assert!(json.get("device_class").is_none());
        assert_eq!(json["state_topic"], "iolite/x/state");
    }
}

use serde::Deserialize;
use serde::Serialize;

/// Device registry entry attached to an entity.
///
/// Identifiers are `(domain, id)` pairs so entities from several
/// integrations never collide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: Option<String>,
}

impl DeviceInfo {
    pub fn new(domain: &str, id: &str, name: String) -> Self {
        Self {
            identifiers: vec![(domain.to_string(), id.to_string())],
            name,
            manufacturer: None,
        }
    }

    pub fn with_manufacturer(mut self, manufacturer: Option<String>) -> Self {
        self.manufacturer = manufacturer;
        self
    }

    /// Flattened `domain_id` identifiers, as used by MQTT discovery
    pub fn flat_identifiers(&self) -> Vec<String> {
        self.identifiers
            .iter()
            .map(|(domain, id)| format!("{}_{}", domain, id))
            .collect()
    }
}

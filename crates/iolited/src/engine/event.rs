use super::entity::EntityDescriptor;
use super::entity::SensorValue;

/// Engine-level events.
///
/// Distinct from `FromIntegrationMessage` (transport-level). The engine converts
/// `FromIntegrationMessage` into `Event` at the boundary, after state is updated.
#[derive(Debug, Clone)]
pub enum Event {
    EntityAdded {
        descriptor: EntityDescriptor,
    },
    SensorStateChanged {
        entity_id: String,
        value: SensorValue,
    },
}

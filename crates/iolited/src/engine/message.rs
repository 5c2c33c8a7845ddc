//! Messages from integrations to the engine.

use super::entity::EntityDescriptor;
use super::entity::SensorValue;

/// Messages FROM integrations TO the engine (registrations/state updates)
#[derive(Debug, Clone)]
pub enum FromIntegrationMessage {
    /// An entity was created and should be published
    EntityAdded {
        descriptor: EntityDescriptor,
        integration_name: String,
    },

    /// A sensor's value was (re)computed; sent on every refresh, changed or not
    SensorStateChanged { entity_id: String, value: SensorValue },
}

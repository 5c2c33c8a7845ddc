use std::collections::HashMap;

use serde::Serialize;

use super::entity::EntityDescriptor;
use super::entity::SensorValue;

/// State of a sensor entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    #[serde(flatten)]
    pub descriptor: EntityDescriptor,

    /// Name of the integration that owns this entity
    pub integration: String,

    /// Latest value written by the owning integration
    pub value: SensorValue,
}

/// Centralized snapshot of the entire engine state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct State {
    pub sensors: HashMap<String, SensorState>,
}

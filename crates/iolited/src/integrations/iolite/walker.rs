use std::sync::Arc;

use tracing::info;

use super::sensor::IoliteSensor;
use super::sensor::Metric;
use crate::coordinator::Coordinator;

/// Build one humidity and one temperature entity per humidity sensor in the
/// coordinator's current snapshot.
///
/// Devices of any other kind are skipped. Order follows the snapshot's
/// iteration order and carries no meaning.
pub fn build_entities(coordinator: &Arc<Coordinator>) -> Vec<IoliteSensor> {
    let snapshot = coordinator.snapshot();

    let entities: Vec<IoliteSensor> = snapshot
        .values()
        .flat_map(|room| {
            room.devices
                .values()
                .filter(|device| device.is_humidity_sensor())
                .flat_map(move |device| {
                    [Metric::Humidity, Metric::Temperature].map(|metric| {
                        IoliteSensor::new(metric, coordinator.clone(), device, room)
                    })
                })
        })
        .collect();

    for entity in &entities {
        info!("Adding {}", entity);
    }

    entities
}

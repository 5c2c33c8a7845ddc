//! IOLITE humidity and temperature sensors.
//!
//! Walks the coordinator's snapshot for humidity sensors, exposes one entity
//! per (device, metric) pair, and republishes every entity on each refresh.

mod integration;
mod sensor;
mod walker;

pub use integration::IoliteIntegration;
use linkme::distributed_slice;
pub use sensor::CoordinatorBinding;
pub use sensor::IoliteSensor;
pub use sensor::Metric;
use tracing::info;
pub use walker::build_entities;

use crate::engine;

/// Domain used in device identifiers
pub const DOMAIN: &str = "iolite";

#[distributed_slice(engine::INTEGRATION_REGISTRY)]
fn init_iolite(ctx: &engine::IntegrationContext) -> engine::IntegrationFactoryResult {
    if !ctx.config.sensors.enabled {
        return Ok(None);
    }

    info!("Initializing IOLITE sensor integration");
    Ok(Some(Box::new(IoliteIntegration::new(
        ctx.coordinator.clone(),
    ))))
}

mod device;
#[allow(clippy::module_inception)]
mod engine;
mod entity;
mod event;
mod integration;
mod message;
pub mod state;

pub use device::DeviceInfo;
pub use engine::Engine;
pub use entity::Entity;
pub use entity::EntityDescriptor;
pub use entity::SensorDeviceClass;
pub use entity::SensorValue;
pub use entity::StateClass;
pub use event::Event;
pub use integration::EntitySink;
pub use integration::FromIntegrationSender;
pub use integration::Integration;
pub use integration::IntegrationContext;
pub use integration::IntegrationFactoryResult;
pub use integration::REGISTRY as INTEGRATION_REGISTRY;
pub use message::FromIntegrationMessage;
pub use state::SensorState;
pub use state::State;

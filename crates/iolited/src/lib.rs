pub mod api;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod hub;
pub mod integrations;
#[cfg(feature = "export_mqtt")]
pub mod mqtt;

pub use config::Config;
pub use config::LogLevel;
pub use coordinator::Coordinator;
pub use engine::Engine;
pub use engine::Event;
pub use engine::SensorValue;
pub use engine::State;

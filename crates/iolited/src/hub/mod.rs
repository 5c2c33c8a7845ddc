//! IOLITE hub data model and snapshot sources.

mod client;
mod model;

pub use client::HubClient;
pub use client::HubError;
pub use client::JsonFileClient;
#[cfg(test)]
pub use client::MockHubClient;
pub use model::Device;
pub use model::DeviceKind;
pub use model::Room;
pub use model::Snapshot;

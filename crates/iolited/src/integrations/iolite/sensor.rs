use std::error::Error;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::info;
use tracing::warn;

use super::DOMAIN;
use crate::coordinator::Coordinator;
use crate::engine::DeviceInfo;
use crate::engine::Entity;
use crate::engine::EntityDescriptor;
use crate::engine::EntitySink;
use crate::engine::SensorDeviceClass;
use crate::engine::SensorValue;
use crate::engine::StateClass;
use crate::hub::Device;
use crate::hub::Room;
use crate::hub::Snapshot;

/// Reading exposed by an [`IoliteSensor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Humidity,
    Temperature,
}

impl Metric {
    /// Suffix appended to the device identifier to form the unique id
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Humidity => "Humidity",
            Self::Temperature => "Temperature",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Humidity => "%",
            Self::Temperature => "°C",
        }
    }

    pub fn device_class(self) -> SensorDeviceClass {
        match self {
            Self::Humidity => SensorDeviceClass::Humidity,
            Self::Temperature => SensorDeviceClass::Temperature,
        }
    }

    /// Pick this metric out of a device, if the device carries it
    fn read(self, device: &Device) -> Option<f64> {
        match self {
            Self::Humidity => device.humidity_level().map(f64::from),
            Self::Temperature => device.env_temperature(),
        }
    }
}

/// Binding of an entity to the coordinator.
///
/// Holds the shared coordinator and the keys needed to find the device again
/// in whatever snapshot is current. Never holds device readings.
#[derive(Clone)]
pub struct CoordinatorBinding {
    coordinator: Arc<Coordinator>,
    place_identifier: String,
    device_identifier: String,
}

impl CoordinatorBinding {
    pub fn new(coordinator: Arc<Coordinator>, device: &Device) -> Self {
        Self {
            coordinator,
            place_identifier: device.place_identifier.clone(),
            device_identifier: device.identifier.clone(),
        }
    }

    /// The coordinator's latest snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.coordinator.snapshot()
    }

    /// Find the bound device in `snapshot`
    pub fn resolve<'a>(&self, snapshot: &'a Snapshot) -> Option<&'a Device> {
        snapshot
            .get(&self.place_identifier)?
            .devices
            .get(&self.device_identifier)
    }
}

impl fmt::Debug for CoordinatorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinatorBinding")
            .field("place_identifier", &self.place_identifier)
            .field("device_identifier", &self.device_identifier)
            .finish()
    }
}

/// Humidity or temperature sensor backed by an IOLITE humidity sensor
#[derive(Debug)]
pub struct IoliteSensor {
    metric: Metric,
    binding: CoordinatorBinding,
    unique_id: String,
    name: String,
    manufacturer: Option<String>,
    /// Availability last written on refresh, for logging transitions only
    available: AtomicBool,
}

impl IoliteSensor {
    pub fn new(metric: Metric, coordinator: Arc<Coordinator>, device: &Device, room: &Room) -> Self {
        Self {
            metric,
            binding: CoordinatorBinding::new(coordinator, device),
            unique_id: format!("{}{}", device.identifier, metric.suffix()),
            name: format!("{} ({})", device.name, room.name),
            manufacturer: device.manufacturer.clone(),
            available: AtomicBool::new(true),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.manufacturer.as_deref()
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::new(DOMAIN, &self.unique_id, self.name.clone())
            .with_manufacturer(self.manufacturer.clone())
    }

    /// Value as found in `snapshot`
    ///
    /// A device that is gone, or no longer carries this metric, is unavailable.
    pub fn value_in(&self, snapshot: &Snapshot) -> SensorValue {
        match self.binding.resolve(snapshot).and_then(|d| self.metric.read(d)) {
            Some(v) => SensorValue::Available(v),
            None => SensorValue::Unavailable,
        }
    }

    /// Republish the value found in `snapshot`; called on every coordinator refresh
    pub async fn on_refresh(
        &self,
        snapshot: &Snapshot,
        sink: &EntitySink,
    ) -> Result<(), Box<dyn Error + Send>> {
        let value = self.value_in(snapshot);
        self.log_transition(value);
        sink.write_state(&self.unique_id, value).await
    }

    fn log_transition(&self, value: SensorValue) {
        let was_available = self
            .available
            .swap(value.is_available(), Ordering::Relaxed);
        match (was_available, value.is_available()) {
            (true, false) => warn!(
                "{} is unavailable: device not found or no longer carries {}",
                self.unique_id,
                self.metric.device_class()
            ),
            (false, true) => info!("{} is available again", self.unique_id),
            _ => {}
        }
    }
}

impl fmt::Display for IoliteSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sensor {} ({})", self.metric.device_class(), self.unique_id, self.name)
    }
}

impl Entity for IoliteSensor {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn platform(&self) -> &'static str {
        "sensor"
    }

    fn descriptor(&self) -> EntityDescriptor {
        EntityDescriptor {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            platform: self.platform().to_string(),
            device_class: Some(self.metric.device_class()),
            unit_of_measurement: Some(self.metric.unit().to_string()),
            state_class: Some(StateClass::Measurement),
            device: Some(self.device_info()),
        }
    }

    fn native_value(&self) -> SensorValue {
        self.value_in(&self.binding.snapshot())
    }
}

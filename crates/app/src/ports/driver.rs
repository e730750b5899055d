//! Driver port: the capability contracts a live device implements.
//!
//! A stored [`Device`] is only a record. The [`DeviceFactory`] turns it into a
//! [`Driver`], a role-tagged handle on the plugin that actually talks to the
//! hardware. The traits are object safe (through `async_trait`) because the
//! concrete plugin is only known at runtime, from the device's
//! `implementation` key.

use std::sync::Arc;

use async_trait::async_trait;
use verdant_domain::device::{Device, DeviceRole};
use verdant_domain::error::{DeviceError, VerdantError};
use verdant_domain::export::{ExportFilter, ExportOutcome};
use verdant_domain::metric::MetricLog;
use verdant_domain::trigger::PowerAction;

/// A relay or anything else that can be switched on and off.
#[async_trait]
pub trait PowerDriver: Send + Sync {
    async fn on(&self) -> Result<(), DeviceError>;

    async fn off(&self) -> Result<(), DeviceError>;
}

/// A sensor producing metric logs.
#[async_trait]
pub trait SensorDriver: Send + Sync {
    /// Take a reading and store the resulting log.
    async fn read(&self) -> Result<MetricLog, DeviceError>;
}

/// A sink shipping metric logs somewhere else.
#[async_trait]
pub trait ExporterDriver: Send + Sync {
    /// Which logs this exporter wants. Defaults to every log.
    fn filter(&self) -> ExportFilter {
        ExportFilter::All
    }

    /// Ship a batch of logs.
    ///
    /// Never fails as a whole: delivery problems are reported through the
    /// returned [`ExportOutcome`].
    async fn export(&self, logs: &[MetricLog]) -> ExportOutcome;
}

/// A live driver tagged with the role it implements.
#[derive(Clone)]
pub enum Driver {
    Power(Arc<dyn PowerDriver>),
    Sensor(Arc<dyn SensorDriver>),
    Exporter(Arc<dyn ExporterDriver>),
}

impl Driver {
    #[must_use]
    pub fn role(&self) -> DeviceRole {
        match self {
            Self::Power(_) => DeviceRole::Power,
            Self::Sensor(_) => DeviceRole::Sensor,
            Self::Exporter(_) => DeviceRole::Exporter,
        }
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Driver").field(&self.role()).finish()
    }
}

/// A device record paired with its live driver.
pub struct Loaded<D: ?Sized> {
    pub device: Device,
    pub driver: Arc<D>,
}

impl<D: ?Sized> Clone for Loaded<D> {
    fn clone(&self) -> Self {
        Self {
            device: self.device.clone(),
            driver: Arc::clone(&self.driver),
        }
    }
}

impl<D: ?Sized> std::fmt::Debug for Loaded<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loaded")
            .field("device", &self.device.name)
            .finish_non_exhaustive()
    }
}

pub type PowerDevice = Loaded<dyn PowerDriver>;
pub type SensorDevice = Loaded<dyn SensorDriver>;
pub type ExporterDevice = Loaded<dyn ExporterDriver>;

impl Loaded<dyn PowerDriver> {
    /// Switch the device on or off.
    ///
    /// # Errors
    ///
    /// Returns the driver's [`DeviceError`] unchanged.
    pub async fn apply(&self, action: PowerAction) -> Result<(), DeviceError> {
        match action {
            PowerAction::On => self.driver.on().await,
            PowerAction::Off => self.driver.off().await,
        }
    }
}

/// Builds live drivers out of device records.
pub trait DeviceFactory: Send + Sync {
    /// Instantiate the plugin referenced by `device.implementation`.
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::Plugin`] when the device is disabled, its
    /// implementation is unknown, its configuration does not fit the plugin,
    /// or the plugin does not implement the device's declared role.
    fn instantiate(&self, device: &Device) -> Result<Driver, VerdantError>;
}

impl<T: DeviceFactory> DeviceFactory for Arc<T> {
    fn instantiate(&self, device: &Device) -> Result<Driver, VerdantError> {
        (**self).instantiate(device)
    }
}

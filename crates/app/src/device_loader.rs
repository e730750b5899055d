//! Device loader: resolves device names to live drivers.

use verdant_domain::device::{Device, DeviceRole};
use verdant_domain::error::{NotFoundError, PluginError, VerdantError};
use verdant_domain::id::DeviceId;

use crate::ports::{
    DeviceFactory, DeviceRepository, Driver, ExporterDevice, PowerDevice, SensorDevice,
};

/// Loads enabled devices from storage and instantiates their drivers.
pub struct DeviceLoader<DR, F> {
    devices: DR,
    factory: F,
}

impl<DR: DeviceRepository + Sync, F: DeviceFactory> DeviceLoader<DR, F> {
    pub fn new(devices: DR, factory: F) -> Self {
        Self { devices, factory }
    }

    /// Enabled power devices among `names`.
    ///
    /// # Errors
    ///
    /// Returns a storage error, or the first plugin error met while
    /// instantiating a driver.
    pub async fn load_power(&self, names: &[String]) -> Result<Vec<PowerDevice>, VerdantError> {
        let devices = self.devices.find_active(DeviceRole::Power, names).await?;
        devices.into_iter().map(|d| self.power(d)).collect()
    }

    /// Enabled sensors among `names`.
    ///
    /// # Errors
    ///
    /// Same as [`load_power`](Self::load_power).
    pub async fn load_sensors(&self, names: &[String]) -> Result<Vec<SensorDevice>, VerdantError> {
        let devices = self.devices.find_active(DeviceRole::Sensor, names).await?;
        devices
            .into_iter()
            .map(|device| match self.factory.instantiate(&device)? {
                Driver::Sensor(driver) => Ok(SensorDevice { device, driver }),
                other => Err(mismatch(&device, &other)),
            })
            .collect()
    }

    /// Enabled exporters among `names`.
    ///
    /// # Errors
    ///
    /// Same as [`load_power`](Self::load_power).
    pub async fn load_exporters(
        &self,
        names: &[String],
    ) -> Result<Vec<ExporterDevice>, VerdantError> {
        let devices = self.devices.find_active(DeviceRole::Exporter, names).await?;
        devices
            .into_iter()
            .map(|device| match self.factory.instantiate(&device)? {
                Driver::Exporter(driver) => Ok(ExporterDevice { device, driver }),
                other => Err(mismatch(&device, &other)),
            })
            .collect()
    }

    /// A single power device by id, whatever its enabled state.
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::NotFound`] when no such device exists, and
    /// [`PluginError::Disabled`] when it is disabled.
    pub async fn load_power_by_id(&self, id: DeviceId) -> Result<PowerDevice, VerdantError> {
        let device = self.devices.get_by_id(id).await?.ok_or_else(|| NotFoundError {
            entity: "Device",
            id: id.to_string(),
        })?;
        self.power(device)
    }

    fn power(&self, device: Device) -> Result<PowerDevice, VerdantError> {
        match self.factory.instantiate(&device)? {
            Driver::Power(driver) => Ok(PowerDevice { device, driver }),
            other => Err(mismatch(&device, &other)),
        }
    }
}

fn mismatch(device: &Device, driver: &Driver) -> VerdantError {
    PluginError::RoleMismatch {
        device: device.name.clone(),
        expected: device.role,
        actual: driver.role(),
    }
    .into()
}

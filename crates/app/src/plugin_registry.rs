//! Plugin registry: maps an implementation key to a driver constructor.
//!
//! Integrations register their constructors once at startup under a stable
//! key (`"virtual:power"`, …). Device records name that key in their
//! `implementation` field and the registry builds the driver on demand.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use verdant_domain::device::Device;
use verdant_domain::error::{PluginError, VerdantError};

use crate::ports::{DeviceFactory, Driver};

type Constructor = Box<dyn Fn(&Device) -> Result<Driver, PluginError> + Send + Sync>;

/// In-process [`DeviceFactory`] backed by registered constructor closures.
#[derive(Default)]
pub struct PluginRegistry {
    constructors: HashMap<String, Constructor>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `constructor` under `key`, replacing any previous one.
    pub fn register<F>(&mut self, key: impl Into<String>, constructor: F)
    where
        F: Fn(&Device) -> Result<Driver, PluginError> + Send + Sync + 'static,
    {
        let key = key.into();
        if self
            .constructors
            .insert(key.clone(), Box::new(constructor))
            .is_some()
        {
            tracing::warn!(plugin = %key, "plugin registered twice, keeping the latest");
        } else {
            tracing::debug!(plugin = %key, "plugin registered");
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.constructors.contains_key(key)
    }

    /// Registered keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl DeviceFactory for PluginRegistry {
    fn instantiate(&self, device: &Device) -> Result<Driver, VerdantError> {
        if device.disabled {
            return Err(PluginError::Disabled(device.name.clone()).into());
        }
        let constructor = self.constructors.get(&device.implementation).ok_or_else(|| {
            PluginError::UnknownImplementation {
                device: device.name.clone(),
                implementation: device.implementation.clone(),
            }
        })?;
        let driver = constructor(device)?;
        if driver.role() != device.role {
            return Err(PluginError::RoleMismatch {
                device: device.name.clone(),
                expected: device.role,
                actual: driver.role(),
            }
            .into());
        }
        Ok(driver)
    }
}

/// Deserialize a device's configuration overlay into a plugin's typed config.
///
/// # Errors
///
/// Returns [`PluginError::InvalidConfig`] when the overlay does not match `T`.
pub fn device_config<T: DeserializeOwned>(device: &Device) -> Result<T, PluginError> {
    serde_json::from_value(serde_json::Value::Object(device.config.clone())).map_err(|source| {
        PluginError::InvalidConfig {
            device: device.name.clone(),
            source,
        }
    })
}

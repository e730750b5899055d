//! Device: a configured piece of hardware (or a simulation of one).
//!
//! A device record is what the store knows: a unique name, the capability
//! role the device plays, the key of the plugin that drives it and an
//! optional JSON configuration overlay handed to that plugin.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, VerdantError};
use crate::id::DeviceId;

/// Capability contract a device implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    /// Switches electrical equipment on and off.
    Power,
    /// Reads a value and stores it as a metric log.
    Sensor,
    /// Ships metric logs to an external destination.
    Exporter,
}

impl DeviceRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Sensor => "sensor",
            Self::Exporter => "exporter",
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown device role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for DeviceRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "power" => Ok(Self::Power),
            "sensor" => Ok(Self::Sensor),
            "exporter" => Ok(Self::Exporter),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Plugin configuration overlay, stored as a JSON object.
pub type DeviceConfig = serde_json::Map<String, serde_json::Value>;

/// A configured device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub role: DeviceRole,
    /// Registry key of the plugin that drives this device (e.g. `virtual:power`).
    pub implementation: String,
    pub config: DeviceConfig,
    pub disabled: bool,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `implementation` is empty ([`ValidationError::EmptyImplementation`])
    pub fn validate(&self) -> Result<(), VerdantError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.implementation.is_empty() {
            return Err(ValidationError::EmptyImplementation.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    role: Option<DeviceRole>,
    implementation: Option<String>,
    config: DeviceConfig,
    disabled: bool,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn role(mut self, role: DeviceRole) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn implementation(mut self, implementation: impl Into<String>) -> Self {
        self.implementation = Some(implementation.into());
        self
    }

    /// Set a single configuration key.
    #[must_use]
    pub fn config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// The role defaults to [`DeviceRole::Sensor`] when not provided.
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::Validation`] if required fields are missing or empty.
    pub fn build(self) -> Result<Device, VerdantError> {
        let device = Device {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            role: self.role.unwrap_or(DeviceRole::Sensor),
            implementation: self.implementation.unwrap_or_default(),
            config: self.config,
            disabled: self.disabled,
        };
        device.validate()?;
        Ok(device)
    }
}

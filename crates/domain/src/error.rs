//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`VerdantError`] via `#[from]` (or an explicit `From` impl for boxed
//! adapter errors).

use crate::device::DeviceRole;

/// Top-level error for every fallible operation in verdant.
#[derive(Debug, thiserror::Error)]
pub enum VerdantError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("plugin error")]
    Plugin(#[from] PluginError),

    #[error("device error")]
    Device(#[from] DeviceError),

    #[error("dispatch error")]
    Dispatch(#[from] DispatchError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("implementation reference must not be empty")]
    EmptyImplementation,

    #[error("cron field `{0}` must not be empty")]
    EmptyCronField(&'static str),

    #[error("power device `{device}` requires an on/off action")]
    MissingPowerAction { device: String },

    #[error("{role} device `{device}` cannot carry an on/off action")]
    UnexpectedPowerAction { device: String, role: DeviceRole },

    #[error("trigger power device `{device}` is a {role} device")]
    NotAPowerDevice { device: String, role: DeviceRole },

    #[error("a grow is already in progress")]
    GrowAlreadyActive,

    #[error("grow end precedes its start")]
    InvalidGrowEnd,

    #[error("no grow is in progress")]
    NoActiveGrow,

    #[error("schedule `{schedule}` has an invalid cron pattern: {reason}")]
    InvalidCron { schedule: String, reason: String },

    #[error("the bound checker is already registered")]
    BoundCheckerAlreadyRegistered,

    #[error("value {value} of metric `{metric}` is out of range: {expected}")]
    ValueOutOfRange {
        metric: String,
        value: String,
        expected: &'static str,
    },

    #[error("unknown temperature unit `{0}`, expected `c` or `f`")]
    UnknownTemperatureUnit(String),
}

/// A referenced record does not exist.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A device record could not be turned into a live driver.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("no plugin registered for implementation `{implementation}` (device `{device}`)")]
    UnknownImplementation {
        device: String,
        implementation: String,
    },

    #[error("device `{device}` is declared {expected} but its plugin provides {actual}")]
    RoleMismatch {
        device: String,
        expected: DeviceRole,
        actual: DeviceRole,
    },

    #[error("device `{0}` is disabled")]
    Disabled(String),

    #[error("invalid configuration for device `{device}`")]
    InvalidConfig {
        device: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A driver action (on, off, read, export) failed.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("device is unreachable")]
    Unreachable,

    #[error("device rejected `{action}`")]
    Rejected { action: &'static str },

    #[error("driver failure")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// One or more devices in a batched dispatch call failed.
#[derive(Debug, thiserror::Error)]
#[error("{action} failed for {} of {attempted} device(s): {}", failures.len(), failed_names(failures))]
pub struct DispatchError {
    pub action: &'static str,
    pub attempted: usize,
    pub failures: Vec<(String, DeviceError)>,
}

fn failed_names(failures: &[(String, DeviceError)]) -> String {
    failures
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_name_failed_devices_in_dispatch_error() {
        let err = DispatchError {
            action: "power on",
            attempted: 3,
            failures: vec![
                ("pump".to_string(), DeviceError::Unreachable),
                ("fan".to_string(), DeviceError::Rejected { action: "on" }),
            ],
        };
        assert_eq!(
            err.to_string(),
            "power on failed for 2 of 3 device(s): pump, fan"
        );
    }

    #[test]
    fn should_convert_validation_error_into_verdant_error() {
        let err: VerdantError = ValidationError::EmptyName.into();
        assert!(matches!(
            err,
            VerdantError::Validation(ValidationError::EmptyName)
        ));
    }

    #[test]
    fn should_display_not_found_error() {
        let err = NotFoundError {
            entity: "Device",
            id: "pump".to_string(),
        };
        assert_eq!(err.to_string(), "Device `pump` not found");
    }

    #[test]
    fn should_display_role_mismatch() {
        let err = PluginError::RoleMismatch {
            device: "heater".to_string(),
            expected: DeviceRole::Power,
            actual: DeviceRole::Sensor,
        };
        assert_eq!(
            err.to_string(),
            "device `heater` is declared power but its plugin provides sensor"
        );
    }
}

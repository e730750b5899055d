//! Schedule: a cron pattern on which a group of devices is driven.
//!
//! A [`Schedule`] holds the five classic cron fields. Devices are attached
//! to it through [`DeviceSchedule`] links; for power devices the link also
//! says whether a firing switches the device on or off.

use serde::{Deserialize, Serialize};

use crate::device::{Device, DeviceRole};
use crate::error::{ValidationError, VerdantError};
use crate::id::{DeviceId, ScheduleId};

/// A cron-style schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub minute: String,
    pub hour: String,
    pub day_of_month: String,
    pub month: String,
    pub day_of_week: String,
    pub disabled: bool,
}

impl Schedule {
    /// Create a builder for constructing a [`Schedule`].
    #[must_use]
    pub fn builder() -> ScheduleBuilder {
        ScheduleBuilder::default()
    }

    /// Render the five cron fields as a standard crontab line.
    #[must_use]
    pub fn crontab(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.minute, self.hour, self.day_of_month, self.month, self.day_of_week
        )
    }

    /// Check domain invariants.
    ///
    /// Field contents are not parsed here; the cron engine is the judge of
    /// what a valid pattern is.
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::Validation`] when the name or a cron field is empty.
    pub fn validate(&self) -> Result<(), VerdantError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let fields = [
            ("minute", &self.minute),
            ("hour", &self.hour),
            ("day_of_month", &self.day_of_month),
            ("month", &self.month),
            ("day_of_week", &self.day_of_week),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyCronField(field).into());
            }
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Schedule`].
///
/// Every cron field defaults to `*`.
#[derive(Debug, Default)]
pub struct ScheduleBuilder {
    id: Option<ScheduleId>,
    name: Option<String>,
    minute: Option<String>,
    hour: Option<String>,
    day_of_month: Option<String>,
    month: Option<String>,
    day_of_week: Option<String>,
    disabled: bool,
}

impl ScheduleBuilder {
    #[must_use]
    pub fn id(mut self, id: ScheduleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn minute(mut self, minute: impl Into<String>) -> Self {
        self.minute = Some(minute.into());
        self
    }

    #[must_use]
    pub fn hour(mut self, hour: impl Into<String>) -> Self {
        self.hour = Some(hour.into());
        self
    }

    #[must_use]
    pub fn day_of_month(mut self, day_of_month: impl Into<String>) -> Self {
        self.day_of_month = Some(day_of_month.into());
        self
    }

    #[must_use]
    pub fn month(mut self, month: impl Into<String>) -> Self {
        self.month = Some(month.into());
        self
    }

    #[must_use]
    pub fn day_of_week(mut self, day_of_week: impl Into<String>) -> Self {
        self.day_of_week = Some(day_of_week.into());
        self
    }

    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Consume the builder, validate, and return a [`Schedule`].
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::Validation`] if the name or a cron field is empty.
    pub fn build(self) -> Result<Schedule, VerdantError> {
        let star = || "*".to_string();
        let schedule = Schedule {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            minute: self.minute.unwrap_or_else(star),
            hour: self.hour.unwrap_or_else(star),
            day_of_month: self.day_of_month.unwrap_or_else(star),
            month: self.month.unwrap_or_else(star),
            day_of_week: self.day_of_week.unwrap_or_else(star),
            disabled: self.disabled,
        };
        schedule.validate()?;
        Ok(schedule)
    }
}

/// Association between a device and a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSchedule {
    pub schedule_id: ScheduleId,
    pub device_id: DeviceId,
    /// `Some(true)` switches on, `Some(false)` switches off. Only set for power devices.
    pub power_on: Option<bool>,
}

impl DeviceSchedule {
    /// Link `device` to a schedule, checking the action flag against its role.
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::Validation`] when:
    /// - a power device has no action ([`ValidationError::MissingPowerAction`])
    /// - a sensor or exporter has one ([`ValidationError::UnexpectedPowerAction`])
    pub fn link(
        schedule_id: ScheduleId,
        device: &Device,
        power_on: Option<bool>,
    ) -> Result<Self, VerdantError> {
        match (device.role, power_on) {
            (DeviceRole::Power, None) => Err(ValidationError::MissingPowerAction {
                device: device.name.clone(),
            }
            .into()),
            (role @ (DeviceRole::Sensor | DeviceRole::Exporter), Some(_)) => {
                Err(ValidationError::UnexpectedPowerAction {
                    device: device.name.clone(),
                    role,
                }
                .into())
            }
            _ => Ok(Self {
                schedule_id,
                device_id: device.id,
                power_on,
            }),
        }
    }
}

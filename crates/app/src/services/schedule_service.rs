//! Schedule service: creating schedules and attaching devices to them.

use verdant_domain::error::{NotFoundError, VerdantError};
use verdant_domain::schedule::{DeviceSchedule, Schedule};

use crate::job_scheduler::parse_cron;
use crate::ports::{DeviceRepository, ScheduleRepository};

/// Application service for schedule management.
pub struct ScheduleService<SR, DR> {
    schedules: SR,
    devices: DR,
}

impl<SR: ScheduleRepository + Sync, DR: DeviceRepository + Sync> ScheduleService<SR, DR> {
    pub fn new(schedules: SR, devices: DR) -> Self {
        Self { schedules, devices }
    }

    /// Create a schedule after checking its fields and cron pattern.
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::Validation`] if invariants fail or the cron
    /// engine rejects the pattern, or a storage error from the repository.
    #[tracing::instrument(skip(self, schedule), fields(schedule = %schedule.name))]
    pub async fn create_schedule(&self, schedule: Schedule) -> Result<Schedule, VerdantError> {
        schedule.validate()?;
        parse_cron(&schedule)?;
        self.schedules.create(schedule).await
    }

    /// Attach the device called `device_name` to `schedule`.
    ///
    /// `power_on` must be set for power devices and left unset for the others.
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::NotFound`] for an unknown device,
    /// [`VerdantError::Validation`] when `power_on` does not fit the device's
    /// role, or a storage error from the repositories.
    #[tracing::instrument(skip(self, schedule), fields(schedule = %schedule.name))]
    pub async fn link_device(
        &self,
        schedule: &Schedule,
        device_name: &str,
        power_on: Option<bool>,
    ) -> Result<DeviceSchedule, VerdantError> {
        let device = self
            .devices
            .find_by_name(device_name)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Device",
                id: device_name.to_string(),
            })?;
        let link = DeviceSchedule::link(schedule.id, &device, power_on)?;
        self.schedules.link(link).await
    }

    /// Schedules the job scheduler will register.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    pub async fn list_enabled(&self) -> Result<Vec<Schedule>, VerdantError> {
        self.schedules.get_enabled().await
    }
}

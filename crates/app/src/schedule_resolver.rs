//! Schedule resolver: groups each schedule's devices by action.
//!
//! One cron firing issues at most four dispatch calls, each batched, in a
//! fixed order: power on, power off, sensor read, exporter write.

use std::collections::HashSet;

use verdant_domain::device::{Device, DeviceRole};
use verdant_domain::error::VerdantError;
use verdant_domain::schedule::{DeviceSchedule, Schedule};

use crate::ports::ScheduleRepository;

/// Device names to act upon when a schedule fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    pub schedule: Schedule,
    pub power_on: Vec<String>,
    pub power_off: Vec<String>,
    pub sensors: Vec<String>,
    pub exporters: Vec<String>,
}

impl DispatchPlan {
    /// Whether a firing of this plan would do nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.power_on.is_empty()
            && self.power_off.is_empty()
            && self.sensors.is_empty()
            && self.exporters.is_empty()
    }
}

/// Sort the devices linked to `schedule` into the four action lists.
///
/// A device name lands in exactly one list: when a device is linked twice
/// with different actions, the first link wins and the others are skipped
/// with a warning. Power links without an action are skipped too; disabled
/// devices are kept here and filtered out when the plan is loaded.
#[must_use]
pub fn group_devices(schedule: Schedule, links: &[(DeviceSchedule, Device)]) -> DispatchPlan {
    let mut plan = DispatchPlan {
        schedule,
        power_on: Vec::new(),
        power_off: Vec::new(),
        sensors: Vec::new(),
        exporters: Vec::new(),
    };
    let mut placed = HashSet::new();
    for (link, device) in links {
        let list = match (device.role, link.power_on) {
            (DeviceRole::Power, Some(true)) => &mut plan.power_on,
            (DeviceRole::Power, Some(false)) => &mut plan.power_off,
            (DeviceRole::Power, None) => {
                tracing::warn!(
                    schedule = %plan.schedule.name,
                    device = %device.name,
                    "power device linked without an action, skipping"
                );
                continue;
            }
            (DeviceRole::Sensor, _) => &mut plan.sensors,
            (DeviceRole::Exporter, _) => &mut plan.exporters,
        };
        if placed.insert(device.name.as_str()) {
            list.push(device.name.clone());
        } else {
            tracing::warn!(
                schedule = %plan.schedule.name,
                device = %device.name,
                "device linked more than once, keeping its first action"
            );
        }
    }
    plan
}

/// Precomputes a [`DispatchPlan`] for every enabled schedule.
pub struct ScheduleResolver<SR> {
    schedules: SR,
}

impl<SR: ScheduleRepository + Sync> ScheduleResolver<SR> {
    pub fn new(schedules: SR) -> Self {
        Self { schedules }
    }

    /// One plan per enabled schedule. Disabled schedules never get one.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self) -> Result<Vec<DispatchPlan>, VerdantError> {
        let schedules = self.schedules.get_enabled().await?;
        let mut plans = Vec::with_capacity(schedules.len());
        for schedule in schedules {
            let links = self.schedules.find_linked_devices(schedule.id).await?;
            let plan = group_devices(schedule, &links);
            tracing::debug!(
                schedule = %plan.schedule.name,
                power_on = plan.power_on.len(),
                power_off = plan.power_off.len(),
                sensors = plan.sensors.len(),
                exporters = plan.exporters.len(),
                "schedule resolved"
            );
            plans.push(plan);
        }
        Ok(plans)
    }
}

//! Storage port: repository traits for persistence.

use std::future::Future;
use std::sync::Arc;

use verdant_domain::device::{Device, DeviceRole};
use verdant_domain::error::VerdantError;
use verdant_domain::export::{ExportFilter, ExportLog};
use verdant_domain::grow::Grow;
use verdant_domain::id::{DeviceId, MetricId, ScheduleId};
use verdant_domain::metric::{Metric, MetricLog};
use verdant_domain::schedule::{DeviceSchedule, Schedule};
use verdant_domain::time::Timestamp;
use verdant_domain::trigger::Trigger;

/// Repository for persisting and querying [`Device`]s.
pub trait DeviceRepository {
    /// Create a new device in storage.
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, VerdantError>> + Send;

    /// Get a device by its unique identifier.
    fn get_by_id(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, VerdantError>> + Send;

    /// Get a device by its unique name.
    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Device>, VerdantError>> + Send;

    /// Get all devices.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, VerdantError>> + Send;

    /// Enabled devices of `role` whose name is in `names`, ordered by name.
    ///
    /// Disabled devices are never returned.
    fn find_active(
        &self,
        role: DeviceRole,
        names: &[String],
    ) -> impl Future<Output = Result<Vec<Device>, VerdantError>> + Send;

    /// Update an existing device.
    fn update(&self, device: Device) -> impl Future<Output = Result<Device, VerdantError>> + Send;
}

/// Repository for [`Schedule`]s and their device links.
pub trait ScheduleRepository {
    /// Create a new schedule in storage.
    fn create(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, VerdantError>> + Send;

    /// Get all schedules that are not disabled.
    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Schedule>, VerdantError>> + Send;

    /// Attach a device to a schedule.
    fn link(
        &self,
        link: DeviceSchedule,
    ) -> impl Future<Output = Result<DeviceSchedule, VerdantError>> + Send;

    /// Devices linked to a schedule, with the link that attaches them.
    fn find_linked_devices(
        &self,
        schedule_id: ScheduleId,
    ) -> impl Future<Output = Result<Vec<(DeviceSchedule, Device)>, VerdantError>> + Send;
}

/// Repository for [`Metric`]s and their [`MetricLog`]s.
pub trait MetricRepository {
    /// Create a new metric in storage.
    fn create(&self, metric: Metric) -> impl Future<Output = Result<Metric, VerdantError>> + Send;

    /// Get a metric by its unique identifier.
    fn get_by_id(
        &self,
        id: MetricId,
    ) -> impl Future<Output = Result<Option<Metric>, VerdantError>> + Send;

    /// Get a metric by its unique name.
    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Metric>, VerdantError>> + Send;

    /// Persist a new log.
    fn record_log(
        &self,
        log: MetricLog,
    ) -> impl Future<Output = Result<MetricLog, VerdantError>> + Send;

    /// The most recent log of a metric, optionally no older than `since`.
    fn latest_log(
        &self,
        metric_id: MetricId,
        since: Option<Timestamp>,
    ) -> impl Future<Output = Result<Option<MetricLog>, VerdantError>> + Send;
}

/// Repository for [`Trigger`]s.
pub trait TriggerRepository {
    /// Create a new trigger in storage.
    fn create(
        &self,
        trigger: Trigger,
    ) -> impl Future<Output = Result<Trigger, VerdantError>> + Send;

    /// All triggers that are not disabled, in creation order.
    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Trigger>, VerdantError>> + Send;
}

/// Repository tracking which logs went out through which exporter.
pub trait ExportLogRepository {
    /// Logs not yet exported by `exporter_id` that pass `filter`, oldest first.
    fn find_unexported(
        &self,
        exporter_id: DeviceId,
        filter: &ExportFilter,
    ) -> impl Future<Output = Result<Vec<MetricLog>, VerdantError>> + Send;

    /// Persist export records, returning how many were stored.
    fn record(
        &self,
        exports: Vec<ExportLog>,
    ) -> impl Future<Output = Result<usize, VerdantError>> + Send;

    /// Number of logs exported by `exporter_id`.
    fn count_for(
        &self,
        exporter_id: DeviceId,
    ) -> impl Future<Output = Result<usize, VerdantError>> + Send;
}

/// Repository for [`Grow`]s.
pub trait GrowRepository {
    /// Create a new grow in storage.
    fn create(&self, grow: Grow) -> impl Future<Output = Result<Grow, VerdantError>> + Send;

    /// The grow without an end, if any.
    fn get_active(&self) -> impl Future<Output = Result<Option<Grow>, VerdantError>> + Send;

    /// Update an existing grow.
    fn update(&self, grow: Grow) -> impl Future<Output = Result<Grow, VerdantError>> + Send;
}

impl<T: MetricRepository + Send + Sync> MetricRepository for Arc<T> {
    fn create(&self, metric: Metric) -> impl Future<Output = Result<Metric, VerdantError>> + Send {
        (**self).create(metric)
    }

    fn get_by_id(
        &self,
        id: MetricId,
    ) -> impl Future<Output = Result<Option<Metric>, VerdantError>> + Send {
        (**self).get_by_id(id)
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Metric>, VerdantError>> + Send {
        (**self).find_by_name(name)
    }

    fn record_log(
        &self,
        log: MetricLog,
    ) -> impl Future<Output = Result<MetricLog, VerdantError>> + Send {
        (**self).record_log(log)
    }

    fn latest_log(
        &self,
        metric_id: MetricId,
        since: Option<Timestamp>,
    ) -> impl Future<Output = Result<Option<MetricLog>, VerdantError>> + Send {
        (**self).latest_log(metric_id, since)
    }
}

impl<T: DeviceRepository + Send + Sync> DeviceRepository for Arc<T> {
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, VerdantError>> + Send {
        (**self).create(device)
    }

    fn get_by_id(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, VerdantError>> + Send {
        (**self).get_by_id(id)
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Device>, VerdantError>> + Send {
        (**self).find_by_name(name)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, VerdantError>> + Send {
        (**self).get_all()
    }

    fn find_active(
        &self,
        role: DeviceRole,
        names: &[String],
    ) -> impl Future<Output = Result<Vec<Device>, VerdantError>> + Send {
        (**self).find_active(role, names)
    }

    fn update(&self, device: Device) -> impl Future<Output = Result<Device, VerdantError>> + Send {
        (**self).update(device)
    }
}

impl<T: ExportLogRepository + Send + Sync> ExportLogRepository for Arc<T> {
    fn find_unexported(
        &self,
        exporter_id: DeviceId,
        filter: &ExportFilter,
    ) -> impl Future<Output = Result<Vec<MetricLog>, VerdantError>> + Send {
        (**self).find_unexported(exporter_id, filter)
    }

    fn record(
        &self,
        exports: Vec<ExportLog>,
    ) -> impl Future<Output = Result<usize, VerdantError>> + Send {
        (**self).record(exports)
    }

    fn count_for(
        &self,
        exporter_id: DeviceId,
    ) -> impl Future<Output = Result<usize, VerdantError>> + Send {
        (**self).count_for(exporter_id)
    }
}

impl<T: ScheduleRepository + Send + Sync> ScheduleRepository for Arc<T> {
    fn create(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, VerdantError>> + Send {
        (**self).create(schedule)
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Schedule>, VerdantError>> + Send {
        (**self).get_enabled()
    }

    fn link(
        &self,
        link: DeviceSchedule,
    ) -> impl Future<Output = Result<DeviceSchedule, VerdantError>> + Send {
        (**self).link(link)
    }

    fn find_linked_devices(
        &self,
        schedule_id: ScheduleId,
    ) -> impl Future<Output = Result<Vec<(DeviceSchedule, Device)>, VerdantError>> + Send {
        (**self).find_linked_devices(schedule_id)
    }
}

impl<T: TriggerRepository + Send + Sync> TriggerRepository for Arc<T> {
    fn create(
        &self,
        trigger: Trigger,
    ) -> impl Future<Output = Result<Trigger, VerdantError>> + Send {
        (**self).create(trigger)
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Trigger>, VerdantError>> + Send {
        (**self).get_enabled()
    }
}

impl<T: GrowRepository + Send + Sync> GrowRepository for Arc<T> {
    fn create(&self, grow: Grow) -> impl Future<Output = Result<Grow, VerdantError>> + Send {
        (**self).create(grow)
    }

    fn get_active(&self) -> impl Future<Output = Result<Option<Grow>, VerdantError>> + Send {
        (**self).get_active()
    }

    fn update(&self, grow: Grow) -> impl Future<Output = Result<Grow, VerdantError>> + Send {
        (**self).update(grow)
    }
}

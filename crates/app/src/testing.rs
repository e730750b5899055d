//! In-memory port doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use verdant_domain::device::{Device, DeviceRole};
use verdant_domain::error::{DeviceError, VerdantError};
use verdant_domain::export::{ExportFilter, ExportLog, ExportOutcome};
use verdant_domain::grow::Grow;
use verdant_domain::id::{DeviceId, MetricId, MetricLogId, ScheduleId};
use verdant_domain::metric::{Metric, MetricLog};
use verdant_domain::recipe::MetricBound;
use verdant_domain::schedule::{DeviceSchedule, Schedule};
use verdant_domain::time::{Timestamp, now};
use verdant_domain::trigger::Trigger;

use crate::ports::{
    DeviceRepository, ExportLogRepository, ExporterDriver, GrowRepository, MetricRepository,
    PowerDriver, RecipeSource, ScheduleRepository, SensorDriver, TriggerRepository,
};

/// Ordered record of driver calls, as `"<device>:<action>"`.
pub type Journal = Arc<Mutex<Vec<String>>>;

type Tag = Option<(Journal, String)>;

fn note(tag: &Tag, action: &str) {
    if let Some((journal, name)) = tag {
        journal.lock().unwrap().push(format!("{name}:{action}"));
    }
}

pub fn power(name: &str) -> Device {
    device(name, DeviceRole::Power, "test:power")
}

pub fn sensor(name: &str) -> Device {
    device(name, DeviceRole::Sensor, "test:sensor")
}

pub fn exporter(name: &str) -> Device {
    device(name, DeviceRole::Exporter, "test:exporter")
}

fn device(name: &str, role: DeviceRole, implementation: &str) -> Device {
    Device::builder()
        .name(name)
        .role(role)
        .implementation(implementation)
        .build()
        .unwrap()
}

pub fn metric(name: &str, kind: &str) -> Metric {
    Metric::builder()
        .name(name)
        .topic("air")
        .kind(kind)
        .build()
        .unwrap()
}

pub fn schedule(name: &str) -> Schedule {
    Schedule::builder().name(name).build().unwrap()
}

#[derive(Default)]
struct Tables {
    devices: Vec<Device>,
    schedules: Vec<Schedule>,
    links: Vec<DeviceSchedule>,
    metrics: Vec<Metric>,
    logs: Vec<MetricLog>,
    triggers: Vec<Trigger>,
    exports: Vec<ExportLog>,
    grows: Vec<Grow>,
}

/// Every repository port over plain vectors.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn add_device(&self, device: Device) -> Device {
        self.tables.lock().unwrap().devices.push(device.clone());
        device
    }

    pub fn add_schedule(&self, schedule: Schedule) -> Schedule {
        self.tables.lock().unwrap().schedules.push(schedule.clone());
        schedule
    }

    pub fn add_link(&self, link: DeviceSchedule) {
        self.tables.lock().unwrap().links.push(link);
    }

    pub fn links_of(&self, schedule_id: ScheduleId) -> Vec<(DeviceSchedule, Device)> {
        let tables = self.tables.lock().unwrap();
        tables
            .links
            .iter()
            .filter(|link| link.schedule_id == schedule_id)
            .filter_map(|link| {
                tables
                    .devices
                    .iter()
                    .find(|d| d.id == link.device_id)
                    .map(|d| (link.clone(), d.clone()))
            })
            .collect()
    }

    pub fn add_metric(&self, metric: Metric) -> Metric {
        self.tables.lock().unwrap().metrics.push(metric.clone());
        metric
    }

    pub fn add_log(&self, metric_id: MetricId, value: f64) -> MetricLogId {
        self.add_log_at(metric_id, value, now())
    }

    pub fn add_log_at(&self, metric_id: MetricId, value: f64, at: Timestamp) -> MetricLogId {
        let log = MetricLog::at(metric_id, value, at);
        let id = log.id;
        self.tables.lock().unwrap().logs.push(log);
        id
    }

    pub fn add_trigger(&self, trigger: Trigger) -> Trigger {
        self.tables.lock().unwrap().triggers.push(trigger.clone());
        trigger
    }

    pub fn export_count(&self, exporter_id: DeviceId) -> usize {
        self.tables
            .lock()
            .unwrap()
            .exports
            .iter()
            .filter(|e| e.exporter_id == exporter_id)
            .count()
    }
}

impl DeviceRepository for InMemoryStore {
    async fn create(&self, device: Device) -> Result<Device, VerdantError> {
        Ok(self.add_device(device))
    }

    async fn get_by_id(&self, id: DeviceId) -> Result<Option<Device>, VerdantError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.devices.iter().find(|d| d.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Device>, VerdantError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.devices.iter().find(|d| d.name == name).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Device>, VerdantError> {
        Ok(self.tables.lock().unwrap().devices.clone())
    }

    async fn find_active(
        &self,
        role: DeviceRole,
        names: &[String],
    ) -> Result<Vec<Device>, VerdantError> {
        let tables = self.tables.lock().unwrap();
        let mut found: Vec<Device> = tables
            .devices
            .iter()
            .filter(|d| d.role == role && !d.disabled && names.contains(&d.name))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn update(&self, device: Device) -> Result<Device, VerdantError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables.devices.iter_mut().find(|d| d.id == device.id) {
            *existing = device.clone();
        }
        Ok(device)
    }
}

impl ScheduleRepository for InMemoryStore {
    async fn create(&self, schedule: Schedule) -> Result<Schedule, VerdantError> {
        Ok(self.add_schedule(schedule))
    }

    async fn get_enabled(&self) -> Result<Vec<Schedule>, VerdantError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .schedules
            .iter()
            .filter(|s| !s.disabled)
            .cloned()
            .collect())
    }

    async fn link(&self, link: DeviceSchedule) -> Result<DeviceSchedule, VerdantError> {
        self.add_link(link.clone());
        Ok(link)
    }

    async fn find_linked_devices(
        &self,
        schedule_id: ScheduleId,
    ) -> Result<Vec<(DeviceSchedule, Device)>, VerdantError> {
        Ok(self.links_of(schedule_id))
    }
}

impl MetricRepository for InMemoryStore {
    async fn create(&self, metric: Metric) -> Result<Metric, VerdantError> {
        Ok(self.add_metric(metric))
    }

    async fn get_by_id(&self, id: MetricId) -> Result<Option<Metric>, VerdantError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.metrics.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Metric>, VerdantError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.metrics.iter().find(|m| m.name == name).cloned())
    }

    async fn record_log(&self, log: MetricLog) -> Result<MetricLog, VerdantError> {
        self.tables.lock().unwrap().logs.push(log.clone());
        Ok(log)
    }

    async fn latest_log(
        &self,
        metric_id: MetricId,
        since: Option<Timestamp>,
    ) -> Result<Option<MetricLog>, VerdantError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .logs
            .iter()
            .filter(|log| log.metric_id == metric_id)
            .filter(|log| since.is_none_or(|since| log.recorded_at >= since))
            .max_by_key(|log| log.recorded_at)
            .cloned())
    }
}

impl TriggerRepository for InMemoryStore {
    async fn create(&self, trigger: Trigger) -> Result<Trigger, VerdantError> {
        Ok(self.add_trigger(trigger))
    }

    async fn get_enabled(&self) -> Result<Vec<Trigger>, VerdantError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .triggers
            .iter()
            .filter(|t| !t.disabled)
            .cloned()
            .collect())
    }
}

impl ExportLogRepository for InMemoryStore {
    async fn find_unexported(
        &self,
        exporter_id: DeviceId,
        filter: &ExportFilter,
    ) -> Result<Vec<MetricLog>, VerdantError> {
        let tables = self.tables.lock().unwrap();
        let kinds: HashMap<MetricId, &str> = tables
            .metrics
            .iter()
            .map(|m| (m.id, m.kind.as_str()))
            .collect();
        let mut logs: Vec<MetricLog> = tables
            .logs
            .iter()
            .filter(|log| {
                !tables
                    .exports
                    .iter()
                    .any(|e| e.exporter_id == exporter_id && e.metric_log_id == log.id)
            })
            .filter(|log| {
                kinds
                    .get(&log.metric_id)
                    .is_some_and(|kind| filter.accepts(kind))
            })
            .cloned()
            .collect();
        logs.sort_by_key(|log| log.recorded_at);
        Ok(logs)
    }

    async fn record(&self, exports: Vec<ExportLog>) -> Result<usize, VerdantError> {
        let count = exports.len();
        self.tables.lock().unwrap().exports.extend(exports);
        Ok(count)
    }

    async fn count_for(&self, exporter_id: DeviceId) -> Result<usize, VerdantError> {
        Ok(self.export_count(exporter_id))
    }
}

impl GrowRepository for InMemoryStore {
    async fn create(&self, grow: Grow) -> Result<Grow, VerdantError> {
        self.tables.lock().unwrap().grows.push(grow.clone());
        Ok(grow)
    }

    async fn get_active(&self) -> Result<Option<Grow>, VerdantError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.grows.iter().find(|g| g.is_active()).cloned())
    }

    async fn update(&self, grow: Grow) -> Result<Grow, VerdantError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables.grows.iter_mut().find(|g| g.id == grow.id) {
            *existing = grow.clone();
        }
        Ok(grow)
    }
}

/// Power driver counting its calls.
#[derive(Default)]
pub struct MockPower {
    on: AtomicUsize,
    off: AtomicUsize,
    fail: bool,
    journal: Tag,
}

impl MockPower {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn journaled(journal: &Journal, name: &str) -> Self {
        Self {
            journal: Some((Arc::clone(journal), name.to_string())),
            ..Self::default()
        }
    }

    pub fn on_count(&self) -> usize {
        self.on.load(Ordering::SeqCst)
    }

    pub fn off_count(&self) -> usize {
        self.off.load(Ordering::SeqCst)
    }

    fn call(&self, counter: &AtomicUsize, action: &'static str) -> Result<(), DeviceError> {
        counter.fetch_add(1, Ordering::SeqCst);
        note(&self.journal, action);
        if self.fail {
            Err(DeviceError::Rejected { action })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PowerDriver for MockPower {
    async fn on(&self) -> Result<(), DeviceError> {
        self.call(&self.on, "on")
    }

    async fn off(&self) -> Result<(), DeviceError> {
        self.call(&self.off, "off")
    }
}

/// Sensor driver returning a constant reading.
#[derive(Default)]
pub struct MockSensor {
    reads: AtomicUsize,
    fail: bool,
    journal: Tag,
}

impl MockSensor {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn journaled(journal: &Journal, name: &str) -> Self {
        Self {
            journal: Some((Arc::clone(journal), name.to_string())),
            ..Self::default()
        }
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SensorDriver for MockSensor {
    async fn read(&self) -> Result<MetricLog, DeviceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        note(&self.journal, "read");
        if self.fail {
            return Err(DeviceError::Unreachable);
        }
        Ok(MetricLog::new(MetricId::new(), 21.5))
    }
}

type OutcomeFn = Box<dyn Fn(&[MetricLog]) -> ExportOutcome + Send + Sync>;

/// Exporter driver recording every batch it receives.
pub struct MockExporter {
    outcome: OutcomeFn,
    filter: ExportFilter,
    batches: Mutex<Vec<Vec<MetricLogId>>>,
    journal: Tag,
}

impl MockExporter {
    pub fn complete() -> Self {
        Self::with_outcome(|_| ExportOutcome::Complete)
    }

    pub fn with_outcome<F>(outcome: F) -> Self
    where
        F: Fn(&[MetricLog]) -> ExportOutcome + Send + Sync + 'static,
    {
        Self {
            outcome: Box::new(outcome),
            filter: ExportFilter::All,
            batches: Mutex::new(Vec::new()),
            journal: None,
        }
    }

    pub fn journaled(journal: &Journal, name: &str) -> Self {
        Self {
            journal: Some((Arc::clone(journal), name.to_string())),
            ..Self::complete()
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: ExportFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Size of every batch received, in order.
    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    /// Every log id received, in order.
    pub fn exported(&self) -> Vec<MetricLogId> {
        self.batches.lock().unwrap().concat()
    }
}

#[async_trait]
impl ExporterDriver for MockExporter {
    fn filter(&self) -> ExportFilter {
        self.filter.clone()
    }

    async fn export(&self, logs: &[MetricLog]) -> ExportOutcome {
        self.batches
            .lock()
            .unwrap()
            .push(logs.iter().map(|log| log.id).collect());
        note(&self.journal, "export");
        (self.outcome)(logs)
    }
}

/// Recipe giving the same bound to every metric.
pub struct FixedRecipe(pub Option<MetricBound>);

impl RecipeSource for FixedRecipe {
    async fn metric_bound(
        &self,
        _topic: &str,
        _kind: &str,
        _grow_start: Timestamp,
    ) -> Result<Option<MetricBound>, VerdantError> {
        Ok(self.0)
    }
}

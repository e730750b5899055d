//! Job scheduler: cron jobs for schedules and the bound checker interval.
//!
//! Every registered job is its own tokio task. A cron job sleeps until the
//! next occurrence, runs the firing to completion, then computes the next
//! occurrence from there: firings of one schedule never overlap and
//! occurrences missed while a firing runs are skipped. Different jobs run
//! concurrently. Patterns are evaluated in the host's local time zone.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use verdant_domain::error::{ValidationError, VerdantError};
use verdant_domain::schedule::Schedule;

use crate::bound_controller::{BoundController, ControllerState};
use crate::device_loader::DeviceLoader;
use crate::dispatcher::TaskDispatcher;
use crate::ports::{DeviceFactory, DeviceRepository, ExportLogRepository, MetricRepository};
use crate::schedule_resolver::DispatchPlan;

/// Parse the five cron fields of `schedule`.
///
/// The cron engine wants a seconds field, so firings happen at second 0.
/// Day-of-week numbers follow the usual crontab convention (0 to 7, Sunday
/// being both 0 and 7) and are translated to the engine's numbering.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidCron`] when a field is rejected.
pub fn parse_cron(schedule: &Schedule) -> Result<cron::Schedule, VerdantError> {
    let invalid = |reason: String| -> VerdantError {
        ValidationError::InvalidCron {
            schedule: schedule.name.clone(),
            reason,
        }
        .into()
    };
    let day_of_week = engine_day_of_week(&schedule.day_of_week).map_err(invalid)?;
    let expression = format!(
        "0 {} {} {} {} {}",
        schedule.minute, schedule.hour, schedule.day_of_month, schedule.month, day_of_week
    );
    cron::Schedule::from_str(&expression).map_err(|err| invalid(err.to_string()))
}

/// Rewrite a day-of-week field from crontab numbering (Sunday = 0 or 7) to
/// the engine's (Sunday = 1, Saturday = 7). Names and wildcards are kept.
fn engine_day_of_week(field: &str) -> Result<String, String> {
    let mut items = Vec::new();
    for item in field.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (item, None),
        };
        let translated = match range.split_once('-') {
            Some((start, end)) => match (day_number(start)?, day_number(end)?) {
                (Some(start), Some(end)) => day_range(start, end, step.is_some())?,
                (None, None) => range.to_string(),
                _ => return Err(format!("day range `{range}` mixes names and numbers")),
            },
            None => match day_number(range)? {
                Some(day) => (day % 7 + 1).to_string(),
                None => range.to_string(),
            },
        };
        items.push(match step {
            Some(step) => format!("{translated}/{step}"),
            None => translated,
        });
    }
    Ok(items.join(","))
}

/// `Some` for a numeric day, `None` for anything the engine should judge.
fn day_number(value: &str) -> Result<Option<u32>, String> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Ok(None);
    }
    match value.parse::<u32>() {
        Ok(day) if day <= 7 => Ok(Some(day)),
        _ => Err(format!("day of week `{value}` is out of range 0-7")),
    }
}

fn day_range(start: u32, end: u32, stepped: bool) -> Result<String, String> {
    if start > end {
        return Err(format!("day of week range `{start}-{end}` is reversed"));
    }
    if start == 0 && end == 7 {
        return Ok("1-7".to_string());
    }
    if end < 7 {
        return Ok(format!("{}-{}", start + 1, end + 1));
    }
    // Ends on Sunday: wraps around to the engine's first day.
    if stepped {
        return Err(format!("stepped day of week range `{start}-7` is not supported"));
    }
    if start == 7 {
        return Ok("1".to_string());
    }
    Ok(format!("{}-7,1", start + 1))
}

/// Loads the devices of a plan and dispatches them in the fixed order.
pub struct ScheduleRunner<DR, F, XR> {
    loader: DeviceLoader<DR, F>,
    tasks: TaskDispatcher<XR>,
}

impl<DR, F, XR> ScheduleRunner<DR, F, XR>
where
    DR: DeviceRepository + Sync,
    F: DeviceFactory,
    XR: ExportLogRepository + Sync,
{
    pub fn new(loader: DeviceLoader<DR, F>, tasks: TaskDispatcher<XR>) -> Self {
        Self { loader, tasks }
    }

    /// Run one firing of `plan`: power on, power off, read, write.
    ///
    /// Empty groups are skipped.
    ///
    /// # Errors
    ///
    /// The first load or dispatch error ends the firing and is returned.
    #[tracing::instrument(skip_all, fields(schedule = %plan.schedule.name))]
    pub async fn fire(&self, plan: &DispatchPlan) -> Result<(), VerdantError> {
        if !plan.power_on.is_empty() {
            let devices = self.loader.load_power(&plan.power_on).await?;
            self.tasks.power_on(&devices).await?;
        }
        if !plan.power_off.is_empty() {
            let devices = self.loader.load_power(&plan.power_off).await?;
            self.tasks.power_off(&devices).await?;
        }
        if !plan.sensors.is_empty() {
            let sensors = self.loader.load_sensors(&plan.sensors).await?;
            self.tasks.read(&sensors).await?;
        }
        if !plan.exporters.is_empty() {
            let exporters = self.loader.load_exporters(&plan.exporters).await?;
            self.tasks.write(&exporters).await?;
        }
        Ok(())
    }
}

/// Owns the running jobs.
#[derive(Default)]
pub struct JobScheduler {
    jobs: Vec<JoinHandle<()>>,
    bound_checker: bool,
}

impl JobScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a cron job firing `plan` through `runner`.
    ///
    /// Disabled schedules are refused silently.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCron`] when the schedule's pattern
    /// cannot be parsed; nothing is started then.
    pub fn register_schedule<DR, F, XR>(
        &mut self,
        plan: DispatchPlan,
        runner: Arc<ScheduleRunner<DR, F, XR>>,
    ) -> Result<(), VerdantError>
    where
        DR: DeviceRepository + Send + Sync + 'static,
        F: DeviceFactory + 'static,
        XR: ExportLogRepository + Send + Sync + 'static,
    {
        if plan.schedule.disabled {
            tracing::debug!(schedule = %plan.schedule.name, "schedule disabled, not registered");
            return Ok(());
        }
        let cron = parse_cron(&plan.schedule)?;
        tracing::info!(
            schedule = %plan.schedule.name,
            crontab = %plan.schedule.crontab(),
            "schedule registered"
        );
        self.jobs.push(tokio::spawn(async move {
            let mut last = None;
            loop {
                let current = Local::now();
                let from = last.map_or(current, |prev| current.max(prev));
                let Some(next) = cron.after(&from).next() else {
                    tracing::info!(schedule = %plan.schedule.name, "no further occurrence");
                    return;
                };
                let wait = (next - current).to_std().unwrap_or(Duration::ZERO);
                tokio::time::sleep(wait).await;
                last = Some(next);

                tracing::debug!(schedule = %plan.schedule.name, "firing");
                if let Err(error) = runner.fire(&plan).await {
                    tracing::error!(schedule = %plan.schedule.name, %error, "firing failed");
                }
            }
        }));
        Ok(())
    }

    /// Start the interval job running the bound controller every `period`.
    ///
    /// The first pass happens one period after registration.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BoundCheckerAlreadyRegistered`] on a second
    /// call: the controller state must have a single writer.
    pub fn register_bound_checker<MR>(
        &mut self,
        period: Duration,
        controller: BoundController<MR>,
        mut state: ControllerState,
    ) -> Result<(), VerdantError>
    where
        MR: MetricRepository + Send + Sync + 'static,
    {
        if self.bound_checker {
            return Err(ValidationError::BoundCheckerAlreadyRegistered.into());
        }
        self.bound_checker = true;
        tracing::info!(
            period_secs = period.as_secs(),
            bounds = state.len(),
            "bound checker registered"
        );
        self.jobs.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let report = controller.evaluate(&mut state).await;
                tracing::debug!(
                    released = report.released,
                    tripped = report.tripped,
                    failures = report.failures,
                    watching = state.watching().len(),
                    "bounds evaluated"
                );
            }
        }));
        Ok(())
    }

    /// Number of running jobs.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.iter().filter(|job| !job.is_finished()).count()
    }

    /// Stop every job. A firing in progress is cancelled at its next await.
    pub fn shutdown(&mut self) {
        for job in self.jobs.drain(..) {
            job.abort();
        }
        self.bound_checker = false;
        tracing::info!("scheduler stopped");
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        for job in &self.jobs {
            job.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{Datelike, TimeZone, Timelike, Weekday};

    use verdant_domain::schedule::DeviceSchedule;
    use verdant_domain::trigger::Trigger;

    use super::*;
    use crate::bound_controller::TriggerBound;
    use crate::plugin_registry::PluginRegistry;
    use crate::ports::{Driver, Loaded};
    use crate::schedule_resolver::group_devices;
    use crate::testing::{
        InMemoryStore, Journal, MockExporter, MockPower, MockSensor, exporter, metric, power,
        schedule, sensor,
    };

    fn journaled_registry(journal: &Journal) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        let j = Arc::clone(journal);
        registry.register("test:power", move |device| {
            Ok(Driver::Power(Arc::new(MockPower::journaled(&j, &device.name))))
        });
        let j = Arc::clone(journal);
        registry.register("test:sensor", move |device| {
            Ok(Driver::Sensor(Arc::new(MockSensor::journaled(&j, &device.name))))
        });
        let j = Arc::clone(journal);
        registry.register("test:exporter", move |device| {
            Ok(Driver::Exporter(Arc::new(MockExporter::journaled(&j, &device.name))))
        });
        registry
    }

    type Runner = ScheduleRunner<Arc<InMemoryStore>, PluginRegistry, Arc<InMemoryStore>>;

    fn runner(store: &Arc<InMemoryStore>, journal: &Journal) -> Runner {
        ScheduleRunner::new(
            DeviceLoader::new(Arc::clone(store), journaled_registry(journal)),
            TaskDispatcher::new(Arc::clone(store)),
        )
    }

    fn plan(store: &InMemoryStore, schedule: &Schedule) -> DispatchPlan {
        let links = store.links_of(schedule.id);
        group_devices(schedule.clone(), &links)
    }

    fn seed(store: &InMemoryStore, s: &Schedule) {
        for (device, power_on) in [
            (exporter("sink"), None),
            (sensor("thermometer"), None),
            (power("heater"), Some(false)),
            (power("light"), Some(true)),
        ] {
            let device = store.add_device(device);
            store.add_link(DeviceSchedule::link(s.id, &device, power_on).unwrap());
        }
    }

    #[tokio::test]
    async fn should_fire_groups_in_fixed_order() {
        let store = Arc::new(InMemoryStore::default());
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let s = store.add_schedule(schedule("morning"));
        seed(&store, &s);
        let temp = store.add_metric(metric("temp", "temperature"));
        store.add_log(temp.id, 21.0);

        runner(&store, &journal).fire(&plan(&store, &s)).await.unwrap();

        assert_eq!(
            *journal.lock().unwrap(),
            vec!["light:on", "heater:off", "thermometer:read", "sink:export"]
        );
    }

    #[tokio::test]
    async fn should_end_firing_on_load_error() {
        let store = Arc::new(InMemoryStore::default());
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let s = store.add_schedule(schedule("morning"));
        let mut broken = power("light");
        broken.implementation = "test:missing".to_string();
        let broken = store.add_device(broken);
        store.add_link(DeviceSchedule::link(s.id, &broken, Some(true)).unwrap());
        let thermometer = store.add_device(sensor("thermometer"));
        store.add_link(DeviceSchedule::link(s.id, &thermometer, None).unwrap());

        let result = runner(&store, &journal).fire(&plan(&store, &s)).await;

        assert!(matches!(result, Err(VerdantError::Plugin(_))));
        assert!(journal.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_skip_disabled_devices_when_firing() {
        let store = Arc::new(InMemoryStore::default());
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let s = store.add_schedule(schedule("morning"));
        let mut light = power("light");
        light.disabled = true;
        let light = store.add_device(light);
        store.add_link(DeviceSchedule::link(s.id, &light, Some(true)).unwrap());

        runner(&store, &journal).fire(&plan(&store, &s)).await.unwrap();

        assert!(journal.lock().unwrap().is_empty());
    }

    #[test]
    fn should_reject_invalid_cron_pattern() {
        let s = Schedule::builder().name("bad").minute("61").build().unwrap();
        let result = parse_cron(&s);
        assert!(matches!(
            result,
            Err(VerdantError::Validation(ValidationError::InvalidCron { .. }))
        ));
    }

    #[test]
    fn should_accept_named_days() {
        let s = Schedule::builder()
            .name("weekdays")
            .minute("30")
            .hour("6")
            .day_of_week("Mon-Fri")
            .build()
            .unwrap();
        assert!(parse_cron(&s).is_ok());
    }

    fn next_after(day_of_week: &str, from: chrono::DateTime<Local>) -> Vec<chrono::Weekday> {
        let s = Schedule::builder()
            .name("days")
            .minute("0")
            .hour("6")
            .day_of_week(day_of_week)
            .build()
            .unwrap();
        parse_cron(&s)
            .unwrap()
            .after(&from)
            .take(7)
            .map(|at| at.weekday())
            .collect()
    }

    fn saturday_midnight() -> chrono::DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap()
    }

    #[test]
    fn should_read_day_zero_as_sunday() {
        let from = saturday_midnight();
        let s = Schedule::builder()
            .name("sunday")
            .minute("0")
            .hour("6")
            .day_of_week("0")
            .build()
            .unwrap();

        let next = parse_cron(&s).unwrap().after(&from).next().unwrap();

        assert_eq!(next.weekday(), Weekday::Sun);
        assert_eq!((next.hour(), next.minute()), (6, 0));
        assert_eq!(next_after("7", from)[0], Weekday::Sun);
    }

    #[test]
    fn should_read_day_one_as_monday() {
        assert!(
            next_after("1", saturday_midnight())
                .iter()
                .all(|day| *day == Weekday::Mon)
        );
    }

    #[test]
    fn should_skip_weekend_for_numeric_weekdays() {
        let days = next_after("1-5", saturday_midnight());
        assert_eq!(
            &days[..5],
            &[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
        );
        assert!(!days.contains(&Weekday::Sat) && !days.contains(&Weekday::Sun));
    }

    #[test]
    fn should_wrap_range_ending_on_sunday() {
        let days = next_after("5-7", saturday_midnight());
        assert_eq!(&days[..3], &[Weekday::Sat, Weekday::Sun, Weekday::Fri]);
    }

    #[test]
    fn should_reject_day_of_week_above_seven() {
        let s = Schedule::builder()
            .name("bad-day")
            .day_of_week("8")
            .build()
            .unwrap();
        assert!(matches!(
            parse_cron(&s),
            Err(VerdantError::Validation(ValidationError::InvalidCron { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn should_fire_registered_schedule() {
        let store = Arc::new(InMemoryStore::default());
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let s = store.add_schedule(schedule("every-minute"));
        let light = store.add_device(power("light"));
        store.add_link(DeviceSchedule::link(s.id, &light, Some(true)).unwrap());

        let mut scheduler = JobScheduler::new();
        scheduler
            .register_schedule(plan(&store, &s), Arc::new(runner(&store, &journal)))
            .unwrap();
        assert_eq!(scheduler.job_count(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(journal.lock().unwrap().iter().any(|entry| entry == "light:on"));
        scheduler.shutdown();
        assert_eq!(scheduler.job_count(), 0);
    }

    #[tokio::test]
    async fn should_not_register_disabled_schedule() {
        let store = Arc::new(InMemoryStore::default());
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let mut s = schedule("off");
        s.disabled = true;
        let s = store.add_schedule(s);

        let mut scheduler = JobScheduler::new();
        scheduler
            .register_schedule(plan(&store, &s), Arc::new(runner(&store, &journal)))
            .unwrap();

        assert_eq!(scheduler.job_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_run_bound_checker_every_period() {
        let store = Arc::new(InMemoryStore::default());
        let temp = store.add_metric(metric("temp", "temperature"));
        let pump = Arc::new(MockPower::default());
        let device = power("pump");
        let bound = TriggerBound {
            trigger: Trigger::new(temp.id, true, device.id, true),
            metric: temp.clone(),
            bound: 0.0,
            power: Loaded {
                device,
                driver: Arc::clone(&pump) as _,
            },
        };
        let period = Duration::from_secs(300);
        let controller = BoundController::new(Arc::clone(&store), period);

        let mut scheduler = JobScheduler::new();
        scheduler
            .register_bound_checker(period, controller, ControllerState::new(vec![bound]))
            .unwrap();

        store.add_log(temp.id, 1.0);
        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(pump.on_count(), 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(pump.on_count(), 1);
    }

    #[tokio::test]
    async fn should_refuse_second_bound_checker() {
        let store = Arc::new(InMemoryStore::default());
        let period = Duration::from_secs(60);
        let mut scheduler = JobScheduler::new();
        scheduler
            .register_bound_checker(
                period,
                BoundController::new(Arc::clone(&store), period),
                ControllerState::default(),
            )
            .unwrap();

        let result = scheduler.register_bound_checker(
            period,
            BoundController::new(store, period),
            ControllerState::default(),
        );

        assert!(matches!(
            result,
            Err(VerdantError::Validation(
                ValidationError::BoundCheckerAlreadyRegistered
            ))
        ));
    }
}

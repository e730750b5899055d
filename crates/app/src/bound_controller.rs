//! Bound controller: hysteresis loop keeping metrics inside their recipe range.
//!
//! Every loaded trigger bound lives in exactly one of two sequences:
//! `watching` (the metric is within range) or `tripped` (the metric went
//! past the bound and the trigger's power action was taken). Each pass first
//! releases tripped bounds whose metric came back, then trips watched bounds
//! whose metric went past, so no bound is switched twice in one pass.

use std::collections::HashSet;
use std::time::Duration;

use verdant_domain::error::VerdantError;
use verdant_domain::grow::Grow;
use verdant_domain::id::MetricId;
use verdant_domain::metric::Metric;
use verdant_domain::time::{Timestamp, now};
use verdant_domain::trigger::{PowerAction, Trigger};

use crate::device_loader::DeviceLoader;
use crate::ports::{
    DeviceFactory, DeviceRepository, MetricRepository, PowerDevice, RecipeSource,
    TriggerRepository,
};

/// A trigger loaded with its resolved bound and live power device.
#[derive(Debug, Clone)]
pub struct TriggerBound {
    pub trigger: Trigger,
    pub metric: Metric,
    pub bound: f64,
    pub power: PowerDevice,
}

impl TriggerBound {
    fn is_past(&self, value: f64) -> bool {
        self.trigger.is_past(self.bound, value)
    }
}

/// The controller's two sequences. Owned by whoever runs the passes.
#[derive(Debug, Default)]
pub struct ControllerState {
    watching: Vec<TriggerBound>,
    tripped: Vec<TriggerBound>,
}

impl ControllerState {
    /// Start with every bound watched.
    #[must_use]
    pub fn new(bounds: Vec<TriggerBound>) -> Self {
        Self {
            watching: bounds,
            tripped: Vec::new(),
        }
    }

    #[must_use]
    pub fn watching(&self) -> &[TriggerBound] {
        &self.watching
    }

    #[must_use]
    pub fn tripped(&self) -> &[TriggerBound] {
        &self.tripped
    }

    /// Number of loaded bounds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.watching.len() + self.tripped.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What one pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationReport {
    /// Bounds moved from tripped back to watching.
    pub released: usize,
    /// Bounds moved from watching to tripped.
    pub tripped: usize,
    /// Bounds left in place because a lookup or power action failed.
    pub failures: usize,
}

/// Evaluates trigger bounds against the latest metric logs.
pub struct BoundController<MR> {
    metrics: MR,
    window: Duration,
}

impl<MR: MetricRepository + Sync> BoundController<MR> {
    /// Logs older than `window` are considered stale and ignored.
    pub fn new(metrics: MR, window: Duration) -> Self {
        Self { metrics, window }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Load every enabled trigger that can act for the current grow.
    ///
    /// A trigger stays inert for the run when its metric is unknown or
    /// disabled, when the recipe has no value on the side it watches, or
    /// when its power device cannot be loaded. Only the first trigger per
    /// `(metric, upper_bound)` pair is kept.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the triggers cannot be listed.
    #[tracing::instrument(skip_all, fields(grow = %grow.id))]
    pub async fn load<TR, DR, F, R>(
        &self,
        triggers: &TR,
        loader: &DeviceLoader<DR, F>,
        recipe: &R,
        grow: &Grow,
    ) -> Result<ControllerState, VerdantError>
    where
        TR: TriggerRepository + Sync,
        DR: DeviceRepository + Sync,
        F: DeviceFactory,
        R: RecipeSource + Sync,
    {
        let mut seen: HashSet<(MetricId, bool)> = HashSet::new();
        let mut bounds = Vec::new();
        for trigger in triggers.get_enabled().await? {
            if seen.contains(&(trigger.metric_id, trigger.upper_bound)) {
                tracing::warn!(
                    trigger = %trigger.id,
                    metric = %trigger.metric_id,
                    direction = trigger.direction(),
                    "another trigger already watches this bound, ignoring"
                );
                continue;
            }
            let Some(bound) = self.resolve(&trigger, loader, recipe, grow).await else {
                continue;
            };
            seen.insert((trigger.metric_id, trigger.upper_bound));
            tracing::info!(
                metric = %bound.metric.name,
                direction = trigger.direction(),
                bound = bound.bound,
                device = %bound.power.device.name,
                "trigger loaded"
            );
            bounds.push(bound);
        }
        Ok(ControllerState::new(bounds))
    }

    async fn resolve<DR, F, R>(
        &self,
        trigger: &Trigger,
        loader: &DeviceLoader<DR, F>,
        recipe: &R,
        grow: &Grow,
    ) -> Option<TriggerBound>
    where
        DR: DeviceRepository + Sync,
        F: DeviceFactory,
        R: RecipeSource + Sync,
    {
        let metric = match self.metrics.get_by_id(trigger.metric_id).await {
            Ok(Some(metric)) if !metric.disabled => metric,
            Ok(Some(metric)) => {
                tracing::info!(metric = %metric.name, "metric disabled, trigger inert");
                return None;
            }
            Ok(None) => {
                tracing::warn!(trigger = %trigger.id, metric = %trigger.metric_id, "metric not found, trigger inert");
                return None;
            }
            Err(error) => {
                tracing::warn!(trigger = %trigger.id, %error, "metric lookup failed, trigger inert");
                return None;
            }
        };

        let bound = match recipe
            .metric_bound(&metric.topic, &metric.kind, grow.start)
            .await
        {
            Ok(range) => range.and_then(|range| range.side(trigger.upper_bound)),
            Err(error) => {
                tracing::warn!(metric = %metric.name, %error, "recipe lookup failed, trigger inert");
                return None;
            }
        };
        let Some(bound) = bound else {
            tracing::debug!(
                metric = %metric.name,
                direction = trigger.direction(),
                "recipe has no bound on this side, trigger inert"
            );
            return None;
        };

        match loader.load_power_by_id(trigger.power_device_id).await {
            Ok(power) => Some(TriggerBound {
                trigger: trigger.clone(),
                metric,
                bound,
                power,
            }),
            Err(error) => {
                tracing::warn!(metric = %metric.name, %error, "power device unavailable, trigger inert");
                None
            }
        }
    }

    /// Run one pass over `state`.
    pub async fn evaluate(&self, state: &mut ControllerState) -> EvaluationReport {
        let since = self.since();
        let mut report = EvaluationReport::default();

        let mut still_tripped = Vec::with_capacity(state.tripped.len());
        let mut released = Vec::new();
        for bound in std::mem::take(&mut state.tripped) {
            match self.latest_value(&bound, since).await {
                Ok(Some(value)) if !bound.is_past(value) => {
                    let action = bound.trigger.action().reverse();
                    if self.switch(&bound, action, value).await {
                        report.released += 1;
                        released.push(bound);
                    } else {
                        report.failures += 1;
                        still_tripped.push(bound);
                    }
                }
                Ok(_) => still_tripped.push(bound),
                Err(()) => {
                    report.failures += 1;
                    still_tripped.push(bound);
                }
            }
        }

        let mut still_watching = Vec::with_capacity(state.watching.len());
        for bound in std::mem::take(&mut state.watching) {
            match self.latest_value(&bound, since).await {
                Ok(Some(value)) if bound.is_past(value) => {
                    let action = bound.trigger.action();
                    if self.switch(&bound, action, value).await {
                        report.tripped += 1;
                        still_tripped.push(bound);
                    } else {
                        report.failures += 1;
                        still_watching.push(bound);
                    }
                }
                Ok(_) => still_watching.push(bound),
                Err(()) => {
                    report.failures += 1;
                    still_watching.push(bound);
                }
            }
        }

        still_watching.extend(released);
        state.watching = still_watching;
        state.tripped = still_tripped;
        report
    }

    fn since(&self) -> Option<Timestamp> {
        chrono::TimeDelta::from_std(self.window)
            .ok()
            .and_then(|window| now().checked_sub_signed(window))
    }

    async fn latest_value(
        &self,
        bound: &TriggerBound,
        since: Option<Timestamp>,
    ) -> Result<Option<f64>, ()> {
        match self.metrics.latest_log(bound.metric.id, since).await {
            Ok(log) => Ok(log.map(|log| log.value)),
            Err(error) => {
                tracing::error!(metric = %bound.metric.name, %error, "cannot fetch latest log");
                Err(())
            }
        }
    }

    async fn switch(&self, bound: &TriggerBound, action: PowerAction, value: f64) -> bool {
        let device = &bound.power.device.name;
        match bound.power.apply(action).await {
            Ok(()) => {
                tracing::info!(
                    metric = %bound.metric.name,
                    value,
                    bound = bound.bound,
                    direction = bound.trigger.direction(),
                    %device,
                    %action,
                    "bound switched power"
                );
                true
            }
            Err(error) => {
                tracing::error!(metric = %bound.metric.name, %device, %action, %error, "power switch failed");
                false
            }
        }
    }
}

//! Virtual sensor: records a fixed value for a configured metric.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use verdant_app::ports::{MetricRepository, SensorDriver};
use verdant_app::services::metric_service::MetricService;
use verdant_domain::error::DeviceError;
use verdant_domain::metric::MetricLog;

/// Device config overlay for [`VirtualSensor`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorConfig {
    /// Name of the metric the readings are recorded against.
    pub metric: String,
    /// Value reported on every read, in the configured temperature unit
    /// for temperature metrics.
    #[serde(default = "default_value")]
    pub value: f64,
}

fn default_value() -> f64 {
    21.5
}

/// A simulated sensor writing its readings through a [`MetricService`].
pub struct VirtualSensor<MR> {
    name: String,
    config: SensorConfig,
    metrics: Arc<MetricService<MR>>,
}

impl<MR> VirtualSensor<MR> {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        config: SensorConfig,
        metrics: Arc<MetricService<MR>>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            metrics,
        }
    }
}

#[async_trait]
impl<MR> SensorDriver for VirtualSensor<MR>
where
    MR: MetricRepository + Send + Sync,
{
    async fn read(&self) -> Result<MetricLog, DeviceError> {
        let log = self
            .metrics
            .record(&self.config.metric, self.config.value)
            .await
            .map_err(|err| DeviceError::Driver(Box::new(err)))?;

        tracing::debug!(
            device = %self.name,
            metric = %self.config.metric,
            value = log.value,
            "virtual reading recorded"
        );
        Ok(log)
    }
}

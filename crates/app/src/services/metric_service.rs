//! Metric service: recording readings against named metrics.

use verdant_domain::error::{NotFoundError, VerdantError};
use verdant_domain::metric::{MetricLog, TemperatureUnit};

use crate::ports::MetricRepository;

/// Application service turning raw readings into stored metric logs.
pub struct MetricService<MR> {
    metrics: MR,
    unit: TemperatureUnit,
}

impl<MR> MetricService<MR>
where
    MR: MetricRepository + Sync,
{
    /// A service reading temperatures in `unit`.
    pub fn new(metrics: MR, unit: TemperatureUnit) -> Self {
        Self { metrics, unit }
    }

    #[must_use]
    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Record `value` for the metric called `metric_name`.
    ///
    /// Temperatures are converted to Celsius first, then the value is
    /// checked against the metric's kind.
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::NotFound`] for an unknown metric,
    /// [`verdant_domain::error::ValidationError::ValueOutOfRange`] for a
    /// value the metric cannot hold, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn record(&self, metric_name: &str, value: f64) -> Result<MetricLog, VerdantError> {
        let metric = self
            .metrics
            .find_by_name(metric_name)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Metric",
                id: metric_name.to_string(),
            })?;
        let value = metric.standardize(value, self.unit);
        metric.check_value(value)?;

        let log = self
            .metrics
            .record_log(MetricLog::new(metric.id, value))
            .await?;
        tracing::debug!(metric = %metric.name, value = log.value, "metric log recorded");
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use verdant_domain::error::ValidationError;

    use super::*;
    use crate::testing::{InMemoryStore, metric};

    #[tokio::test]
    async fn should_store_fahrenheit_reading_in_celsius() {
        let store = Arc::new(InMemoryStore::default());
        let temp = store.add_metric(metric("tent-temp", "temperature"));
        let service = MetricService::new(Arc::clone(&store), TemperatureUnit::Fahrenheit);

        let log = service.record("tent-temp", 212.0).await.unwrap();

        assert_eq!(log.metric_id, temp.id);
        assert!((log.value - 100.0).abs() < 1e-9);
        let stored = store.latest_log(temp.id, None).await.unwrap().unwrap();
        assert_eq!(stored, log);
    }

    #[tokio::test]
    async fn should_keep_celsius_reading_unchanged() {
        let store = Arc::new(InMemoryStore::default());
        store.add_metric(metric("tent-temp", "temperature"));
        let service = MetricService::new(Arc::clone(&store), TemperatureUnit::default());

        let log = service.record("tent-temp", 24.5).await.unwrap();

        assert!((log.value - 24.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_refuse_humidity_above_one() {
        let store = Arc::new(InMemoryStore::default());
        let hum = store.add_metric(metric("tent-hum", "humidity"));
        let service = MetricService::new(Arc::clone(&store), TemperatureUnit::Celsius);

        let result = service.record("tent-hum", 1.2).await;

        assert!(matches!(
            result,
            Err(VerdantError::Validation(ValidationError::ValueOutOfRange { .. }))
        ));
        assert!(store.latest_log(hum.id, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_report_unknown_metric() {
        let store = Arc::new(InMemoryStore::default());
        let service = MetricService::new(Arc::clone(&store), TemperatureUnit::Celsius);

        let result = service.record("ghost", 1.0).await;

        assert!(matches!(result, Err(VerdantError::NotFound(_))));
    }
}

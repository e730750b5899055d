//! Trigger service: creating bound rules between metrics and power devices.

use verdant_domain::device::DeviceRole;
use verdant_domain::error::{NotFoundError, ValidationError, VerdantError};
use verdant_domain::trigger::Trigger;

use crate::ports::{DeviceRepository, MetricRepository, TriggerRepository};

/// Application service for trigger management.
pub struct TriggerService<TR, MR, DR> {
    triggers: TR,
    metrics: MR,
    devices: DR,
}

impl<TR, MR, DR> TriggerService<TR, MR, DR>
where
    TR: TriggerRepository + Sync,
    MR: MetricRepository + Sync,
    DR: DeviceRepository + Sync,
{
    pub fn new(triggers: TR, metrics: MR, devices: DR) -> Self {
        Self {
            triggers,
            metrics,
            devices,
        }
    }

    /// Create a trigger switching `device_name` when `metric_name` goes past
    /// its ceiling (`upper_bound`) or floor.
    ///
    /// Several enabled triggers may watch the same side of a metric; only the
    /// first one is loaded by the bound controller.
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::NotFound`] for an unknown metric or device,
    /// [`ValidationError::NotAPowerDevice`] when the device cannot be
    /// switched, or a storage error from the repositories.
    #[tracing::instrument(skip(self))]
    pub async fn create_trigger(
        &self,
        metric_name: &str,
        upper_bound: bool,
        device_name: &str,
        power_on: bool,
    ) -> Result<Trigger, VerdantError> {
        let metric = self
            .metrics
            .find_by_name(metric_name)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Metric",
                id: metric_name.to_string(),
            })?;
        let device = self
            .devices
            .find_by_name(device_name)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Device",
                id: device_name.to_string(),
            })?;
        if device.role != DeviceRole::Power {
            return Err(ValidationError::NotAPowerDevice {
                device: device.name,
                role: device.role,
            }
            .into());
        }
        self.triggers
            .create(Trigger::new(metric.id, upper_bound, device.id, power_on))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{InMemoryStore, metric, power, sensor};

    type Service = TriggerService<Arc<InMemoryStore>, Arc<InMemoryStore>, Arc<InMemoryStore>>;

    fn service(store: &Arc<InMemoryStore>) -> Service {
        TriggerService::new(Arc::clone(store), Arc::clone(store), Arc::clone(store))
    }

    #[tokio::test]
    async fn should_create_trigger_for_power_device() {
        let store = Arc::new(InMemoryStore::default());
        let temp = store.add_metric(metric("temp", "temperature"));
        let fan = store.add_device(power("fan"));

        let trigger = service(&store)
            .create_trigger("temp", true, "fan", true)
            .await
            .unwrap();

        assert_eq!(trigger.metric_id, temp.id);
        assert_eq!(trigger.power_device_id, fan.id);
        assert!(trigger.upper_bound);
    }

    #[tokio::test]
    async fn should_refuse_non_power_device() {
        let store = Arc::new(InMemoryStore::default());
        store.add_metric(metric("temp", "temperature"));
        store.add_device(sensor("thermometer"));

        let result = service(&store)
            .create_trigger("temp", true, "thermometer", true)
            .await;

        assert!(matches!(
            result,
            Err(VerdantError::Validation(ValidationError::NotAPowerDevice {
                role: DeviceRole::Sensor,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn should_report_unknown_metric() {
        let store = Arc::new(InMemoryStore::default());
        store.add_device(power("fan"));

        let result = service(&store)
            .create_trigger("ghost", false, "fan", true)
            .await;

        assert!(matches!(result, Err(VerdantError::NotFound(_))));
    }
}

//! Task dispatcher: runs one role's action over a batch of loaded devices.

use verdant_domain::error::{DispatchError, VerdantError};
use verdant_domain::export::ExportLog;
use verdant_domain::trigger::PowerAction;

use crate::ports::{ExportLogRepository, ExporterDevice, PowerDevice, SensorDevice};

/// Executes power, read and write tasks.
///
/// Holds no state besides the export log store used to remember what each
/// exporter already shipped.
pub struct TaskDispatcher<XR> {
    exports: XR,
}

impl<XR: ExportLogRepository + Sync> TaskDispatcher<XR> {
    pub fn new(exports: XR) -> Self {
        Self { exports }
    }

    /// Switch every device on.
    ///
    /// # Errors
    ///
    /// See [`power`](Self::power).
    pub async fn power_on(&self, devices: &[PowerDevice]) -> Result<(), VerdantError> {
        self.power(devices, PowerAction::On).await
    }

    /// Switch every device off.
    ///
    /// # Errors
    ///
    /// See [`power`](Self::power).
    pub async fn power_off(&self, devices: &[PowerDevice]) -> Result<(), VerdantError> {
        self.power(devices, PowerAction::Off).await
    }

    /// Apply `action` to every device in sequence.
    ///
    /// A failing device does not stop the rest of the batch.
    ///
    /// # Errors
    ///
    /// Returns [`VerdantError::Dispatch`] naming every device that failed.
    pub async fn power(
        &self,
        devices: &[PowerDevice],
        action: PowerAction,
    ) -> Result<(), VerdantError> {
        let mut failures = Vec::new();
        for device in devices {
            match device.apply(action).await {
                Ok(()) => tracing::info!(device = %device.device.name, %action, "power switched"),
                Err(error) => {
                    tracing::error!(device = %device.device.name, %action, %error, "power switch failed");
                    failures.push((device.device.name.clone(), error));
                }
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError {
                action: match action {
                    PowerAction::On => "power on",
                    PowerAction::Off => "power off",
                },
                attempted: devices.len(),
                failures,
            }
            .into())
        }
    }

    /// Take a reading from every sensor in sequence.
    ///
    /// # Errors
    ///
    /// Stops at the first failing sensor and returns
    /// [`VerdantError::Dispatch`] naming it.
    pub async fn read(&self, sensors: &[SensorDevice]) -> Result<(), VerdantError> {
        for sensor in sensors {
            match sensor.driver.read().await {
                Ok(log) => {
                    tracing::debug!(device = %sensor.device.name, value = log.value, "sensor read");
                }
                Err(error) => {
                    return Err(DispatchError {
                        action: "read",
                        attempted: sensors.len(),
                        failures: vec![(sensor.device.name.clone(), error)],
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Ship unexported logs through every exporter.
    ///
    /// Delivery failures are logged and never returned: what was not
    /// delivered stays a candidate for the next pass. Returns the number of
    /// export records created.
    ///
    /// # Errors
    ///
    /// Returns a storage error when candidates cannot be fetched or export
    /// records cannot be stored.
    pub async fn write(&self, exporters: &[ExporterDevice]) -> Result<usize, VerdantError> {
        let mut recorded = 0;
        for exporter in exporters {
            let name = &exporter.device.name;
            let filter = exporter.driver.filter();
            let candidates = self
                .exports
                .find_unexported(exporter.device.id, &filter)
                .await?;
            if candidates.is_empty() {
                tracing::debug!(device = %name, "nothing to export");
                continue;
            }

            let outcome = exporter.driver.export(&candidates).await;
            let delivered = outcome.delivered(&candidates);
            if let Some(error) = outcome.error() {
                tracing::warn!(
                    device = %name,
                    candidates = candidates.len(),
                    delivered = delivered.len(),
                    %error,
                    "export incomplete"
                );
            }
            if delivered.is_empty() {
                continue;
            }

            let records = delivered
                .into_iter()
                .map(|log_id| ExportLog::new(log_id, exporter.device.id))
                .collect();
            let count = self.exports.record(records).await?;
            tracing::info!(device = %name, count, "logs exported");
            recorded += count;
        }
        Ok(recorded)
    }
}

//! # verdant-adapter-virtual
//!
//! Virtual integration providing simulated drivers for testing and
//! demonstration purposes.
//!
//! ## Provided plugins
//!
//! | Key | Role | Config | Behaviour |
//! |-----|------|--------|-----------|
//! | `virtual:power` | power | `unreachable` | Tracks an on/off flag |
//! | `virtual:sensor` | sensor | `metric`, `value` | Records `value` for `metric` through the metric service on every read |
//! | `virtual:exporter` | exporter | `whitelist`, `blacklist` | Writes logs to the diagnostic log |
//!
//! ## Dependency rule
//!
//! Depends on `verdant-app` (port traits) and `verdant-domain` only.

mod devices;

use std::sync::Arc;

use verdant_app::plugin_registry::{PluginRegistry, device_config};
use verdant_app::ports::{Driver, MetricRepository};
use verdant_app::services::metric_service::MetricService;

pub use devices::{
    ExporterConfig, LogExporter, PowerConfig, SensorConfig, VirtualPower, VirtualSensor,
};

pub const POWER_KEY: &str = "virtual:power";
pub const SENSOR_KEY: &str = "virtual:sensor";
pub const EXPORTER_KEY: &str = "virtual:exporter";

/// Register the virtual plugins. Sensors record their readings through
/// `metrics`.
pub fn register<MR>(registry: &mut PluginRegistry, metrics: Arc<MetricService<MR>>)
where
    MR: MetricRepository + Send + Sync + 'static,
{
    registry.register(POWER_KEY, |device| {
        let config: PowerConfig = device_config(device)?;
        Ok(Driver::Power(Arc::new(VirtualPower::new(
            device.name.clone(),
            config,
        ))))
    });

    registry.register(SENSOR_KEY, move |device| {
        let config: SensorConfig = device_config(device)?;
        Ok(Driver::Sensor(Arc::new(VirtualSensor::new(
            device.name.clone(),
            config,
            Arc::clone(&metrics),
        ))))
    });

    registry.register(EXPORTER_KEY, |device| {
        let config: ExporterConfig = device_config(device)?;
        Ok(Driver::Exporter(Arc::new(LogExporter::new(
            device.name.clone(),
            config,
        ))))
    });
}

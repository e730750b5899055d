//! Simulated device drivers.

mod exporter;
mod power;
mod sensor;

pub use exporter::{ExporterConfig, LogExporter};
pub use power::{PowerConfig, VirtualPower};
pub use sensor::{SensorConfig, VirtualSensor};

//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod driver;
pub mod recipe;
pub mod storage;

pub use driver::{
    DeviceFactory, Driver, ExporterDevice, ExporterDriver, Loaded, PowerDevice, PowerDriver,
    SensorDevice, SensorDriver,
};
pub use recipe::RecipeSource;
pub use storage::{
    DeviceRepository, ExportLogRepository, GrowRepository, MetricRepository, ScheduleRepository,
    TriggerRepository,
};

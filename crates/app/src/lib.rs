//! # verdant-app
//!
//! Application layer for use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DeviceRepository`, `ScheduleRepository`, `MetricRepository`,
//!     `TriggerRepository`, `ExportLogRepository`, `GrowRepository`
//!   - `PowerDriver`, `SensorDriver`, `ExporterDriver`: device plugin contracts
//!   - `DeviceFactory`: turns a device record into a live driver
//!   - `RecipeSource`: time-varying metric bounds
//! - Provide the **core loop**:
//!   - `PluginRegistry` / `DeviceLoader`: string-keyed plugin construction
//!   - `TaskDispatcher`: power, read and write tasks over device batches
//!   - `ScheduleResolver`: groups scheduled devices per action
//!   - `JobScheduler`: cron and interval jobs on the tokio runtime
//!   - `BoundController`: trip/release hysteresis over recipe bounds
//! - Provide management **services** (grows, schedules, triggers)
//!
//! ## Dependency rule
//! Depends on `verdant-domain` only (plus `tokio` for timers and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod bound_controller;
pub mod device_loader;
pub mod dispatcher;
pub mod job_scheduler;
pub mod plugin_registry;
pub mod ports;
pub mod schedule_resolver;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

//! # verdant-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `verdant-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `verdant-app` (for port traits) and `verdant-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod decode;
mod device_repo;
mod error;
mod export_log_repo;
mod grow_repo;
mod metric_repo;
mod pool;
mod schedule_repo;
mod trigger_repo;

pub use device_repo::SqliteDeviceRepository;
pub use error::StorageError;
pub use export_log_repo::SqliteExportLogRepository;
pub use grow_repo::SqliteGrowRepository;
pub use metric_repo::SqliteMetricRepository;
pub use pool::{Config, Database};
pub use schedule_repo::SqliteScheduleRepository;
pub use trigger_repo::SqliteTriggerRepository;

//! `SQLite` implementation of [`ScheduleRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use verdant_app::ports::ScheduleRepository;
use verdant_domain::device::Device;
use verdant_domain::error::VerdantError;
use verdant_domain::id::ScheduleId;
use verdant_domain::schedule::{DeviceSchedule, Schedule};

use crate::decode;
use crate::error::StorageError;

struct Wrapper(Schedule);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Schedule {
            id: decode::parsed(row, "id")?,
            name: row.try_get("name")?,
            minute: row.try_get("minute")?,
            hour: row.try_get("hour")?,
            day_of_month: row.try_get("day_of_month")?,
            month: row.try_get("month")?,
            day_of_week: row.try_get("day_of_week")?,
            disabled: row.try_get("disabled")?,
        }))
    }
}

/// A link row joined with the device it points to.
struct LinkedDevice(DeviceSchedule, Device);

impl<'r> FromRow<'r, SqliteRow> for LinkedDevice {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let link = DeviceSchedule {
            schedule_id: decode::parsed(row, "schedule_id")?,
            device_id: decode::parsed(row, "device_id")?,
            power_on: row.try_get("power_on")?,
        };
        let device = Device {
            id: link.device_id,
            name: row.try_get("name")?,
            role: decode::parsed(row, "role")?,
            implementation: row.try_get("implementation")?,
            config: decode::json(row, "config")?,
            disabled: row.try_get("disabled")?,
        };
        Ok(Self(link, device))
    }
}

const INSERT: &str = r"
    INSERT INTO schedules (id, name, minute, hour, day_of_month, month, day_of_week, disabled)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";
const SELECT_ENABLED: &str = "SELECT * FROM schedules WHERE disabled = 0 ORDER BY name";
const UPSERT_LINK: &str = r"
    INSERT INTO device_schedules (schedule_id, device_id, power_on) VALUES (?, ?, ?)
    ON CONFLICT (schedule_id, device_id) DO UPDATE SET power_on = excluded.power_on
";
const SELECT_LINKED: &str = r"
    SELECT ds.schedule_id, ds.device_id, ds.power_on,
           d.name, d.role, d.implementation, d.config, d.disabled
    FROM device_schedules ds
    JOIN devices d ON d.id = ds.device_id
    WHERE ds.schedule_id = ?
    ORDER BY d.name
";

/// `SQLite`-backed schedule repository.
#[derive(Clone)]
pub struct SqliteScheduleRepository {
    pool: SqlitePool,
}

impl SqliteScheduleRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ScheduleRepository for SqliteScheduleRepository {
    fn create(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(schedule.id.to_string())
                .bind(&schedule.name)
                .bind(&schedule.minute)
                .bind(&schedule.hour)
                .bind(&schedule.day_of_month)
                .bind(&schedule.month)
                .bind(&schedule.day_of_week)
                .bind(schedule.disabled)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(schedule)
        }
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Schedule>, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ENABLED)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn link(
        &self,
        link: DeviceSchedule,
    ) -> impl Future<Output = Result<DeviceSchedule, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPSERT_LINK)
                .bind(link.schedule_id.to_string())
                .bind(link.device_id.to_string())
                .bind(link.power_on)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(link)
        }
    }

    fn find_linked_devices(
        &self,
        schedule_id: ScheduleId,
    ) -> impl Future<Output = Result<Vec<(DeviceSchedule, Device)>, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<LinkedDevice> = sqlx::query_as(SELECT_LINKED)
                .bind(schedule_id.to_string())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|row| (row.0, row.1)).collect())
        }
    }
}

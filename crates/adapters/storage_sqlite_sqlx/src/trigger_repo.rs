//! `SQLite` implementation of [`TriggerRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use verdant_app::ports::TriggerRepository;
use verdant_domain::error::VerdantError;
use verdant_domain::trigger::Trigger;

use crate::decode;
use crate::error::StorageError;

struct Wrapper(Trigger);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Trigger {
            id: decode::parsed(row, "id")?,
            metric_id: decode::parsed(row, "metric_id")?,
            upper_bound: row.try_get("upper_bound")?,
            power_device_id: decode::parsed(row, "power_device_id")?,
            power_on: row.try_get("power_on")?,
            disabled: row.try_get("disabled")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO triggers (id, metric_id, upper_bound, power_device_id, power_on, disabled)
    VALUES (?, ?, ?, ?, ?, ?)
";
const SELECT_ENABLED: &str = "SELECT * FROM triggers WHERE disabled = 0 ORDER BY rowid";

/// `SQLite`-backed trigger repository.
#[derive(Clone)]
pub struct SqliteTriggerRepository {
    pool: SqlitePool,
}

impl SqliteTriggerRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TriggerRepository for SqliteTriggerRepository {
    fn create(
        &self,
        trigger: Trigger,
    ) -> impl Future<Output = Result<Trigger, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(trigger.id.to_string())
                .bind(trigger.metric_id.to_string())
                .bind(trigger.upper_bound)
                .bind(trigger.power_device_id.to_string())
                .bind(trigger.power_on)
                .bind(trigger.disabled)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(trigger)
        }
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Trigger>, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ENABLED)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }
}

//! `SQLite` implementation of [`MetricRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use verdant_app::ports::MetricRepository;
use verdant_domain::error::VerdantError;
use verdant_domain::id::MetricId;
use verdant_domain::metric::{Metric, MetricLog};
use verdant_domain::time::{Timestamp, to_sortable};

use crate::decode;
use crate::error::StorageError;

struct Wrapper(Metric);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Metric {
            id: decode::parsed(row, "id")?,
            name: row.try_get("name")?,
            topic: row.try_get("topic")?,
            kind: row.try_get("type")?,
            manual: row.try_get("manual")?,
            disabled: row.try_get("disabled")?,
        }))
    }
}

/// Row wrapper for [`MetricLog`], shared with the export log repository.
pub(crate) struct LogWrapper(pub(crate) MetricLog);

impl<'r> FromRow<'r, SqliteRow> for LogWrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(MetricLog {
            id: decode::parsed(row, "id")?,
            metric_id: decode::parsed(row, "metric_id")?,
            value: row.try_get("value")?,
            recorded_at: decode::timestamp(row, "recorded_at")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO metrics (id, name, topic, type, manual, disabled)
    VALUES (?, ?, ?, ?, ?, ?)
";
const SELECT_BY_ID: &str = "SELECT * FROM metrics WHERE id = ?";
const SELECT_BY_NAME: &str = "SELECT * FROM metrics WHERE name = ?";
const INSERT_LOG: &str = r"
    INSERT INTO metric_logs (id, metric_id, value, recorded_at) VALUES (?, ?, ?, ?)
";
const SELECT_LATEST_LOG: &str = r"
    SELECT * FROM metric_logs
    WHERE metric_id = ? AND (? IS NULL OR recorded_at >= ?)
    ORDER BY recorded_at DESC, rowid DESC
    LIMIT 1
";

/// `SQLite`-backed metric and metric log repository.
#[derive(Clone)]
pub struct SqliteMetricRepository {
    pool: SqlitePool,
}

impl SqliteMetricRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MetricRepository for SqliteMetricRepository {
    fn create(&self, metric: Metric) -> impl Future<Output = Result<Metric, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(metric.id.to_string())
                .bind(&metric.name)
                .bind(&metric.topic)
                .bind(&metric.kind)
                .bind(metric.manual)
                .bind(metric.disabled)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(metric)
        }
    }

    fn get_by_id(
        &self,
        id: MetricId,
    ) -> impl Future<Output = Result<Option<Metric>, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|w| w.0))
        }
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Metric>, VerdantError>> + Send {
        let pool = self.pool.clone();
        let name = name.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_NAME)
                .bind(name)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|w| w.0))
        }
    }

    fn record_log(
        &self,
        log: MetricLog,
    ) -> impl Future<Output = Result<MetricLog, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT_LOG)
                .bind(log.id.to_string())
                .bind(log.metric_id.to_string())
                .bind(log.value)
                .bind(to_sortable(log.recorded_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(log)
        }
    }

    fn latest_log(
        &self,
        metric_id: MetricId,
        since: Option<Timestamp>,
    ) -> impl Future<Output = Result<Option<MetricLog>, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            let since = since.map(to_sortable);
            let row: Option<LogWrapper> = sqlx::query_as(SELECT_LATEST_LOG)
                .bind(metric_id.to_string())
                .bind(since.clone())
                .bind(since)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|w| w.0))
        }
    }
}

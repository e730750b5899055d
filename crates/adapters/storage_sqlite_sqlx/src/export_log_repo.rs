//! `SQLite` implementation of [`ExportLogRepository`].

use std::future::Future;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use verdant_app::ports::ExportLogRepository;
use verdant_domain::error::VerdantError;
use verdant_domain::export::{ExportFilter, ExportLog};
use verdant_domain::id::DeviceId;
use verdant_domain::metric::MetricLog;
use verdant_domain::time::to_sortable;

use crate::error::StorageError;
use crate::metric_repo::LogWrapper;

const INSERT: &str = r"
    INSERT OR IGNORE INTO export_logs (metric_log_id, exporter_id, exported_at)
    VALUES (?, ?, ?)
";
const COUNT_FOR: &str = "SELECT COUNT(*) FROM export_logs WHERE exporter_id = ?";

/// `SQLite`-backed export log repository.
#[derive(Clone)]
pub struct SqliteExportLogRepository {
    pool: SqlitePool,
}

impl SqliteExportLogRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Candidates of `exporter_id`: logs it has not exported that pass `filter`.
fn unexported_query(exporter_id: DeviceId, filter: &ExportFilter) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::new(
        r"SELECT l.id, l.metric_id, l.value, l.recorded_at
        FROM metric_logs l
        JOIN metrics m ON m.id = l.metric_id
        WHERE NOT EXISTS (
            SELECT 1 FROM export_logs e
            WHERE e.metric_log_id = l.id AND e.exporter_id = ",
    );
    query.push_bind(exporter_id.to_string());
    query.push(")");

    let (operator, kinds) = match filter.clone().normalized() {
        ExportFilter::All => ("", Vec::new()),
        ExportFilter::Whitelist(kinds) => (" AND m.type IN (", kinds),
        ExportFilter::Blacklist(kinds) => (" AND m.type NOT IN (", kinds),
    };
    if !kinds.is_empty() {
        query.push(operator);
        let mut separated = query.separated(", ");
        for kind in kinds {
            separated.push_bind(kind);
        }
        separated.push_unseparated(")");
    }

    query.push(" ORDER BY l.recorded_at, l.rowid");
    query
}

impl ExportLogRepository for SqliteExportLogRepository {
    fn find_unexported(
        &self,
        exporter_id: DeviceId,
        filter: &ExportFilter,
    ) -> impl Future<Output = Result<Vec<MetricLog>, VerdantError>> + Send {
        let pool = self.pool.clone();
        let mut query = unexported_query(exporter_id, filter);
        async move {
            let rows: Vec<LogWrapper> = query
                .build_query_as()
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn record(
        &self,
        exports: Vec<ExportLog>,
    ) -> impl Future<Output = Result<usize, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            let mut stored: u64 = 0;
            for export in &exports {
                let result = sqlx::query(INSERT)
                    .bind(export.metric_log_id.to_string())
                    .bind(export.exporter_id.to_string())
                    .bind(to_sortable(export.exported_at))
                    .execute(&mut *tx)
                    .await
                    .map_err(StorageError::from)?;
                stored += result.rows_affected();
            }
            tx.commit().await.map_err(StorageError::from)?;

            Ok(usize::try_from(stored).unwrap_or(usize::MAX))
        }
    }

    fn count_for(
        &self,
        exporter_id: DeviceId,
    ) -> impl Future<Output = Result<usize, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            let (count,): (i64,) = sqlx::query_as(COUNT_FOR)
                .bind(exporter_id.to_string())
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(usize::try_from(count).unwrap_or_default())
        }
    }
}

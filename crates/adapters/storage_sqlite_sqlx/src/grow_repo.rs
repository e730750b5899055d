//! `SQLite` implementation of [`GrowRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};

use verdant_app::ports::GrowRepository;
use verdant_domain::error::{NotFoundError, VerdantError};
use verdant_domain::grow::Grow;
use verdant_domain::time::to_sortable;

use crate::decode;
use crate::error::StorageError;

struct Wrapper(Grow);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Grow {
            id: decode::parsed(row, "id")?,
            start: decode::timestamp(row, "started_at")?,
            end: decode::maybe_timestamp(row, "ended_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO grows (id, started_at, ended_at) VALUES (?, ?, ?)";
const SELECT_ACTIVE: &str = r"
    SELECT * FROM grows WHERE ended_at IS NULL
    ORDER BY started_at DESC
    LIMIT 1
";
const UPDATE: &str = "UPDATE grows SET started_at = ?, ended_at = ? WHERE id = ?";

/// `SQLite`-backed grow repository.
#[derive(Clone)]
pub struct SqliteGrowRepository {
    pool: SqlitePool,
}

impl SqliteGrowRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl GrowRepository for SqliteGrowRepository {
    fn create(&self, grow: Grow) -> impl Future<Output = Result<Grow, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(grow.id.to_string())
                .bind(to_sortable(grow.start))
                .bind(grow.end.map(to_sortable))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(grow)
        }
    }

    fn get_active(&self) -> impl Future<Output = Result<Option<Grow>, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_ACTIVE)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|w| w.0))
        }
    }

    fn update(&self, grow: Grow) -> impl Future<Output = Result<Grow, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(UPDATE)
                .bind(to_sortable(grow.start))
                .bind(grow.end.map(to_sortable))
                .bind(grow.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 0 {
                return Err(NotFoundError {
                    entity: "Grow",
                    id: grow.id.to_string(),
                }
                .into());
            }

            Ok(grow)
        }
    }
}

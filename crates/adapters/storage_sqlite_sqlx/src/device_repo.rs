//! `SQLite` implementation of [`DeviceRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use verdant_app::ports::DeviceRepository;
use verdant_domain::device::{Device, DeviceRole};
use verdant_domain::error::VerdantError;
use verdant_domain::id::DeviceId;

use crate::decode;
use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`Device`].
struct Wrapper(Device);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Device> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Device {
            id: decode::parsed(row, "id")?,
            name: row.try_get("name")?,
            role: decode::parsed(row, "role")?,
            implementation: row.try_get("implementation")?,
            config: decode::json(row, "config")?,
            disabled: row.try_get("disabled")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO devices (id, name, role, implementation, config, disabled)
    VALUES (?, ?, ?, ?, ?, ?)
";
const SELECT_BY_ID: &str = "SELECT * FROM devices WHERE id = ?";
const SELECT_BY_NAME: &str = "SELECT * FROM devices WHERE name = ?";
const SELECT_ALL: &str = "SELECT * FROM devices ORDER BY name";
const UPDATE: &str = r"
    UPDATE devices SET name = ?, role = ?, implementation = ?, config = ?, disabled = ?
    WHERE id = ?
";

/// `SQLite`-backed device repository.
#[derive(Clone)]
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            let config = serde_json::to_string(&device.config).map_err(StorageError::from)?;
            sqlx::query(INSERT)
                .bind(device.id.to_string())
                .bind(&device.name)
                .bind(device.role.as_str())
                .bind(&device.implementation)
                .bind(config)
                .bind(device.disabled)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(device)
        }
    }

    fn get_by_id(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Device>, VerdantError>> + Send {
        let pool = self.pool.clone();
        let name = name.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_NAME)
                .bind(name)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn find_active(
        &self,
        role: DeviceRole,
        names: &[String],
    ) -> impl Future<Output = Result<Vec<Device>, VerdantError>> + Send {
        let pool = self.pool.clone();
        let names = names.to_vec();
        async move {
            if names.is_empty() {
                return Ok(Vec::new());
            }
            let mut query: QueryBuilder<Sqlite> =
                QueryBuilder::new("SELECT * FROM devices WHERE disabled = 0 AND role = ");
            query.push_bind(role.as_str());
            query.push(" AND name IN (");
            let mut separated = query.separated(", ");
            for name in names {
                separated.push_bind(name);
            }
            separated.push_unseparated(") ORDER BY name");

            let rows: Vec<Wrapper> = query
                .build_query_as()
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn update(&self, device: Device) -> impl Future<Output = Result<Device, VerdantError>> + Send {
        let pool = self.pool.clone();
        async move {
            let config = serde_json::to_string(&device.config).map_err(StorageError::from)?;
            sqlx::query(UPDATE)
                .bind(&device.name)
                .bind(device.role.as_str())
                .bind(&device.implementation)
                .bind(config)
                .bind(device.disabled)
                .bind(device.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(device)
        }
    }
}

//! SQLite-backed session storage for native builds.

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tokio::runtime::Runtime;

use hrportal_auth::{KeyValueBackend, StoreError};

/// Key-value table holding the persisted session pair.
///
/// The session layer's API is synchronous, so the backend owns a
/// current-thread runtime and blocks on each query. Do not call it from
/// inside another tokio runtime.
pub struct SqliteSessionBackend {
    runtime: Runtime,
    pool: SqlitePool,
}

impl SqliteSessionBackend {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create session directory at {:?}", parent))?;
        }
        let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        Self::connect(options).with_context(|| format!("failed to open session database at {:?}", path))
    }

    /// Private in-memory database (tests/dev).
    pub fn in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").context("invalid in-memory SQLite URL")?;
        Self::connect(options)
    }

    fn connect(options: SqliteConnectOptions) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to create runtime for session database")?;

        // One connection: every query sees the same database, including `:memory:`.
        let pool = runtime.block_on(async {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(options)
                .await
                .context("failed to create SQLite pool")?;

            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS session_store (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                )
                "#,
            )
            .execute(&pool)
            .await
            .context("failed to create session_store table")?;

            Ok::<_, anyhow::Error>(pool)
        })?;

        Ok(Self { runtime, pool })
    }
}

impl core::fmt::Debug for SqliteSessionBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SqliteSessionBackend").finish_non_exhaustive()
    }
}

fn backend_error(context: &str, err: sqlx::Error) -> StoreError {
    StoreError::backend(format!("{context}: {err}"))
}

impl KeyValueBackend for SqliteSessionBackend {
    fn read(&self, keys: [&str; 2]) -> Result<[Option<String>; 2], StoreError> {
        let rows = self
            .runtime
            .block_on(
                sqlx::query(
                    r#"
                    SELECT key, value
                    FROM session_store
                    WHERE key IN (?1, ?2)
                    "#,
                )
                .bind(keys[0])
                .bind(keys[1])
                .fetch_all(&self.pool),
            )
            .map_err(|err| backend_error("failed to read session entries", err))?;

        let mut values: [Option<String>; 2] = [None, None];
        for row in rows {
            let key: String = row
                .try_get("key")
                .map_err(|err| backend_error("malformed session row", err))?;
            let value: String = row
                .try_get("value")
                .map_err(|err| backend_error("malformed session row", err))?;
            if let Some(slot) = keys.iter().position(|candidate| *candidate == key) {
                values[slot] = Some(value);
            }
        }
        Ok(values)
    }

    fn write(&self, entries: [(&str, String); 2]) -> Result<(), StoreError> {
        self.runtime
            .block_on(async {
                let mut tx = self.pool.begin().await?;
                for (key, value) in &entries {
                    sqlx::query(
                        r#"
                        INSERT INTO session_store (key, value)
                        VALUES (?1, ?2)
                        ON CONFLICT(key)
                        DO UPDATE SET value = excluded.value
                        "#,
                    )
                    .bind(*key)
                    .bind(value.as_str())
                    .execute(&mut *tx)
                    .await?;
                }
                tx.commit().await
            })
            .map_err(|err| backend_error("failed to write session entries", err))
    }

    fn remove(&self, keys: [&str; 2]) -> Result<(), StoreError> {
        self.runtime
            .block_on(
                sqlx::query(
                    r#"
                    DELETE FROM session_store
                    WHERE key IN (?1, ?2)
                    "#,
                )
                .bind(keys[0])
                .bind(keys[1])
                .execute(&self.pool),
            )
            .map(|_| ())
            .map_err(|err| backend_error("failed to remove session entries", err))
    }
}

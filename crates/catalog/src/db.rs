//! Database connection and pool management.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Embedded migrations that are run automatically on connect.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
/// Sample inserts from concurrent transfers are the only parallel writers.
const FILE_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_millis(1500);

/// Where the catalog lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    File(PathBuf),
    /// Every connection to `:memory:` opens its own empty database, so the
    /// pool is limited to one.
    Memory,
}

impl Location {
    fn options(&self) -> SqliteConnectOptions {
        let options = SqliteConnectOptions::new()
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);
        match self {
            Self::File(path) => options.filename(path).create_if_missing(true).journal_mode(SqliteJournalMode::Wal),
            Self::Memory => options.filename(":memory:"),
        }
    }

    fn max_connections(&self) -> u32 {
        match self {
            Self::File(_) => FILE_CONNECTIONS,
            Self::Memory => 1,
        }
    }
}

/// Connection pool for the catalog database.
///
/// Wrap it in a [`Repository`](crate::Repository) to read and write entities.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the catalog file at `path` and bring its schema up
    /// to date. Missing parent directories are created.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Database)?;
        }
        tracing::debug!(path = %path.display(), "Opening catalog database");
        Self::open(Location::File(path.to_path_buf())).await
    }

    /// Open a private in-memory catalog.
    ///
    /// Not gated behind `#[cfg(test)]` so that other crates can use it in
    /// their tests. The database is gone once the pool is closed.
    pub async fn connect_in_memory() -> Result<Self> {
        Self::open(Location::Memory).await
    }

    async fn open(location: Location) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(location.max_connections())
            // Runs for every pooled connection, not only the first.
            .after_connect(|conn, meta| Box::pin(async move { Self::tune(conn, meta).await }))
            .connect_with(location.options())
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Per-connection PRAGMAs that `SqliteConnectOptions` does not expose.
    async fn tune(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query("PRAGMA wal_autocheckpoint = 800; PRAGMA temp_store = MEMORY;").execute(conn).await?;
        Ok(())
    }

    #[tracing::instrument("migrating catalog schema", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for borrowed connections to come back, then close the pool.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_in_memory() {
        let db = Database::connect_in_memory().await.unwrap();
        assert!(!db.pool().is_closed());
        db.close().await;
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::connect_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db.close().await;
    }

    #[tokio::test]
    async fn test_pragmas_are_applied() {
        let db = Database::connect_in_memory().await.unwrap();
        let row: (i64,) = sqlx::query_as("PRAGMA foreign_keys").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, 1, "foreign_keys should be ON");
        let row: (i64,) = sqlx::query_as("PRAGMA wal_autocheckpoint").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, 800);
        db.close().await;
    }

    #[tokio::test]
    async fn test_connect_creates_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("senas.db");
        let db = Database::connect(&path).await.unwrap();
        assert!(path.exists());
        let row: (String,) = sqlx::query_as("PRAGMA journal_mode").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, "wal");
        db.close().await;
    }

    #[test]
    fn test_memory_uses_single_connection() {
        assert_eq!(Location::Memory.max_connections(), 1);
        assert_eq!(Location::File("x.db".into()).max_connections(), FILE_CONNECTIONS);
    }
}

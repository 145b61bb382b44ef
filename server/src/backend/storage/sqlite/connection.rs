use anyhow::Result;
use log::info;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// How long a writer waits for another writer's transaction to finish
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// DbConnection manages the SQLite pool and schema
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("Creating database at {}", url);
            Sqlite::create_database(url).await?
        }

        let options = SqliteConnectOptions::from_str(url)?.busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePool::connect_with(options).await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS persons (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                kind TEXT NOT NULL CHECK (kind IN ('GESTOR', 'PROMOTOR')),
                active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_persons_name
            ON persons(name);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS housing_units (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                portal TEXT,
                floor TEXT,
                letter TEXT,
                typology TEXT,
                orientation TEXT,
                bedrooms INTEGER,
                surface_with_terrace REAL,
                surface_interior REAL,
                surface_terraces REAL,
                final_price REAL,
                notes TEXT,
                estado TEXT NOT NULL DEFAULT 'LIBRE'
                    CHECK (estado IN ('LIBRE', 'BLOQUEADA', 'RESERVADA')),
                manager_id TEXT REFERENCES persons (id) ON DELETE SET NULL,
                responsible_id TEXT REFERENCES persons (id) ON DELETE SET NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS state_changes (
                id TEXT PRIMARY KEY,
                unit_id TEXT NOT NULL REFERENCES housing_units (id) ON DELETE CASCADE,
                from_estado TEXT
                    CHECK (from_estado IS NULL OR from_estado IN ('LIBRE', 'BLOQUEADA', 'RESERVADA')),
                to_estado TEXT NOT NULL
                    CHECK (to_estado IN ('LIBRE', 'BLOQUEADA', 'RESERVADA')),
                manager_id TEXT REFERENCES persons (id) ON DELETE SET NULL,
                responsible_id TEXT REFERENCES persons (id) ON DELETE SET NULL,
                reason TEXT,
                actor_user_id TEXT,
                actor_name TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // History is always read newest first
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_state_changes_created_at
            ON state_changes(created_at DESC);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS import_jobs (
                id TEXT PRIMARY KEY,
                filename TEXT,
                status TEXT NOT NULL CHECK (status IN ('PENDIENTE', 'OK', 'ERROR')),
                total_rows INTEGER NOT NULL DEFAULT 0,
                ok_rows INTEGER NOT NULL DEFAULT 0,
                error_rows INTEGER NOT NULL DEFAULT 0,
                log TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

//! SQLite storage for the book store: pool factory, module migrations and the
//! `db` core module that owns the pool lifecycle.

use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use bookstore_kernel::{settings::DatabaseSettings, InitCtx, Migration, Module};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _module_migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    )
"#;

/// Open a connection pool for the configured database.
///
/// In-memory databases live as long as their connection, so they get a single
/// connection that is never recycled.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if settings.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(settings.max_connections.max(1))
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to database '{}'", settings.url))?;

    tracing::info!(target: "bookstore-db", url = %settings.url, "database pool ready");

    Ok(pool)
}

/// Apply every migration not yet recorded, each in its own transaction.
///
/// Returns the number of migrations applied by this call.
pub async fn migrate(pool: &SqlitePool, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
    sqlx::raw_sql(MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .context("failed to create migrations table")?;

    let mut applied = 0;

    for (module, migration) in migrations {
        let recorded: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM _module_migrations WHERE module = ? AND id = ?",
        )
        .bind(module.as_str())
        .bind(migration.id)
        .fetch_one(pool)
        .await
        .context("failed to read migration history")?;

        if recorded > 0 {
            tracing::debug!(target: "bookstore-db", module = %module, id = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await.context("failed to open migration transaction")?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;

        sqlx::query("INSERT INTO _module_migrations (module, id) VALUES (?, ?)")
            .bind(module.as_str())
            .bind(migration.id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to record migration {}/{}", module, migration.id))?;

        tx.commit()
            .await
            .with_context(|| format!("failed to commit migration {}/{}", module, migration.id))?;

        tracing::info!(target: "bookstore-db", module = %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

/// Core module owning the connection pool.
pub struct DatabaseModule {
    pool: SqlitePool,
}

impl DatabaseModule {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Module for DatabaseModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("database did not answer a ping")?;
        tracing::info!(module = self.name(), "database reachable");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.pool.close().await;
        tracing::info!(module = self.name(), "database pool closed");
        Ok(())
    }
}

/// Create the `db` core module for registration
pub fn create_module(pool: SqlitePool) -> Arc<dyn Module> {
    Arc::new(DatabaseModule::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_kernel::settings::Settings;

    fn migration(id: &'static str, up: &'static str) -> (String, Migration) {
        ("shelves".to_string(), Migration { id, up })
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();
        let migrations = vec![
            migration("001_init", "CREATE TABLE shelves (id INTEGER PRIMARY KEY, label TEXT);"),
            migration("002_seed", "INSERT INTO shelves (label) VALUES ('a'); INSERT INTO shelves (label) VALUES ('b');"),
        ];

        assert_eq!(migrate(&pool, &migrations).await.unwrap(), 2);
        assert_eq!(migrate(&pool, &migrations).await.unwrap(), 0);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shelves")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() {
        let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();
        let broken = vec![migration("001_broken", "CREATE TABLE nope (")];

        assert!(migrate(&pool, &broken).await.is_err());

        let recorded: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _module_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(recorded, 0);
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();
        sqlx::raw_sql(
            "CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (id INTEGER PRIMARY KEY, parent_id INTEGER REFERENCES parent(id));",
        )
        .execute(&pool)
        .await
        .unwrap();

        let orphan = sqlx::query("INSERT INTO child (parent_id) VALUES (42)")
            .execute(&pool)
            .await;
        assert!(orphan.is_err());
    }

    #[tokio::test]
    async fn module_pings_and_closes_pool() {
        let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();
        let module = DatabaseModule::new(pool.clone());
        let settings = Settings::default();

        module.init(&InitCtx { settings: &settings }).await.unwrap();
        module.stop().await.unwrap();

        assert!(pool.is_closed());
    }
}

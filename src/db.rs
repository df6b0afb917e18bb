use std::sync::Arc;

use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, SqlxPostgresConnector};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::{AppConfig, StoreBackend};
use crate::store::{DocumentStore, MemoryStore, PgDocumentStore};

pub type DbPool = PgPool;
pub type OrmConn = DatabaseConnection;

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// SeaORM connection sharing the sqlx pool.
pub fn orm_from_pool(pool: DbPool) -> OrmConn {
    SqlxPostgresConnector::from_sqlx_postgres_pool(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Opens the configured backend. Postgres is migrated before use.
pub async fn connect_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory document store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is not set")?;
            let pool = create_pool(url).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(PgDocumentStore::new(orm_from_pool(pool))))
        }
    }
}

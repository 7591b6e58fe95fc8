// budget_backend/src/db.rs
use crate::store::{StoreError, StoreResult};
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

// an R2D2 connection pool
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type PgPooled = PooledConnection<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Initialize the database pool.
pub fn init_pool(database_url: &str) -> StoreResult<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    r2d2::Pool::builder()
        .build(manager)
        .map_err(|e| StoreError::Backend(format!("Failed to create database pool: {}", e)))
}

/// Applies any migration under `migrations/` that the database has not seen yet.
pub fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    let mut pooled = pool
        .get()
        .map_err(|e| StoreError::Backend(format!("DB Connection error: {}", e)))?;
    let conn: &mut PgConnection = &mut pooled;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StoreError::Backend(format!("Failed to run migrations: {}", e)))?;
    for version in applied {
        tracing::info!(%version, "applied migration");
    }
    Ok(())
}

//! Embedded schema migrations.
//!
//! The `sqlx::migrate!()` macro embeds every SQL file under
//! `migrations/sqlite/` into the binary at compile time; nothing is read
//! from disk at runtime. Applied migrations are tracked in the
//! `_sqlx_migrations` table, so running them again is a no-op.
//!
//! Adding a migration: create `migrations/sqlite/NNN_description.sql` with
//! the next sequence number. Never edit an applied migration file; its
//! checksum is recorded.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::StoreResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending migrations in filename order. Each migration runs in
/// its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)` for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> StoreResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // The tracking table may not exist yet on a fresh database.
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}

//! Bookshelf application library
//!
//! Wires the resource modules to the database and the HTTP server.

pub mod modules;

use anyhow::Context;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

/// Registry holding every project module bound to `pool`
pub fn build_registry(pool: &SqlitePool) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, pool);
    registry
}

/// Apply pending migrations of every module; returns how many ran
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let pool = bookshelf_db::connect(&settings.database).await?;
    let registry = build_registry(&pool);
    let applied = apply_migrations(&registry, &pool).await?;
    pool.close().await;
    Ok(applied)
}

/// Run the service until a shutdown signal arrives
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "bookshelf bootstrap starting"
    );

    let pool = bookshelf_db::connect(&settings.database).await?;
    let registry = build_registry(&pool);
    apply_migrations(&registry, &pool).await?;

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!("bookshelf bootstrap complete");
    let served = bookshelf_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    pool.close().await;
    served
}

async fn apply_migrations(registry: &ModuleRegistry, pool: &SqlitePool) -> anyhow::Result<usize> {
    let applied = bookshelf_db::run_migrations(pool, &registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, "migrations up to date");
    Ok(applied)
}

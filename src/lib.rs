//! Bookshelf application library
//!
//! Project modules plus the bootstrap shared by the server binary and the CLI.

pub mod modules;
pub mod utils;

use anyhow::Context;
use bookshelf_kernel::settings::Settings;
use bookshelf_kernel::{InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

/// Re-export commonly used types
pub use modules::*;

/// Open the database, register every module, and apply pending migrations.
pub async fn prepare(settings: &Settings) -> anyhow::Result<(SqlitePool, ModuleRegistry)> {
    let pool = bookshelf_db::connect(&settings.database)
        .await
        .context("failed to connect to database")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &pool);

    let applied = bookshelf_db::run_migrations(&pool, &registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, "migrations up to date");

    Ok((pool, registry))
}

/// Run the HTTP service until Ctrl-C, then stop modules and close the pool.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let (pool, registry) = prepare(&settings).await?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings, shutdown_signal()).await;

    registry.stop_all().await?;
    pool.close().await;
    tracing::info!("bookshelf shut down");

    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

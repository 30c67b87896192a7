//! Operator binary: applies migrations and seeds the system vocabulary.

mod config;
mod seed;

use anyhow::Context;
use forkful_db::{PgStore, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::AdminConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "forkful_admin=debug,forkful_recipes=debug,forkful_db=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = AdminConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        max_connections = config.db.max_connections,
        seed_tags = config.global_tags.len(),
        seed_ingredients = config.ingredients.len(),
        "Loaded admin configuration"
    );

    // --- Database ---
    let pool = forkful_db::create_pool(&config.db)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    forkful_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    forkful_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Seed ---
    let store = PgStore::new(pool);
    let mut tx = store.begin().await.context("Failed to open transaction")?;
    let report = seed::seed_all(tx.as_mut(), &config.global_tags, &config.ingredients)
        .await
        .map_err(|e| anyhow::anyhow!("Seeding failed ({}): {e}", e.code()))?;
    tx.commit().await.context("Failed to commit seed data")?;

    tracing::info!(
        tags_created = report.tags_created,
        ingredients_created = report.ingredients_created,
        "Seeding complete"
    );
    Ok(())
}

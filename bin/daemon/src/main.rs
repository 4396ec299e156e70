mod config;
mod db;

use crate::config::DaemonConfig;
use crate::db::PgFlowStore;
use crosswire_engine::Engine;
use crosswire_social::InstagramClient;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load configuration from environment
    let config = DaemonConfig::from_env().expect("failed to load configuration");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    let store = Arc::new(PgFlowStore::new(db_pool));
    let client = Arc::new(
        InstagramClient::with_base_url(
            config.instagram.base_url.as_str(),
            Duration::from_secs(config.instagram.timeout_seconds),
        )
        .expect("failed to build instagram client"),
    );

    let engine = Arc::new(Engine::new(store, client));
    engine
        .load_active_flows()
        .await
        .expect("failed to load active flows");

    let handle = engine.start();

    // Spawn periodic active-flow reload task so the registry picks up
    // flows edited by other services sharing the database
    let reload_engine = Arc::clone(&engine);
    let reload_interval_secs = config.reload_interval_seconds;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(reload_interval_secs));
        loop {
            interval.tick().await;
            match reload_engine.load_active_flows().await {
                Ok(count) => {
                    tracing::debug!(count, "Periodic flow reload");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to reload active flows");
                }
            }
        }
    });

    tracing::info!("crosswire daemon running");

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");

    tracing::info!("Shutdown signal received, stopping engine");
    handle.shutdown().await;
    tracing::info!("Engine stopped");
}

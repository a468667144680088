//! Bux recurring sweeper
//!
//! Fires every user's due recurring transactions once, up to now. Meant to be
//! run from cron; the HTTP sweep only reaches the caller's own rules.

use anyhow::Context;
use chrono::Utc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bux_db::connect;
use bux_db::repositories::RecurringRepository;
use bux_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bux=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = connect(&config.database)
        .await
        .context("failed to connect to database")?;

    let processed = RecurringRepository::new(db)
        .process_due(Utc::now(), None)
        .await
        .context("failed to list due recurring transactions")?;
    info!(processed, "Sweep finished");

    Ok(())
}

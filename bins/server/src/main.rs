//! Budget API server.
//!
//! Main entry point for the backend service.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orcamento_api::{AppState, create_router};
use orcamento_db::{TokenBlacklistRepository, connect};
use orcamento_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orcamento=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database).await?;
    info!("Connected to database");

    let expiry = chrono::Duration::seconds(i64::try_from(config.jwt.access_token_expiry_secs)?);
    let purged = TokenBlacklistRepository::new(db.clone())
        .purge_before(chrono::Utc::now() - expiry)
        .await?;
    info!(purged, "Purged expired token revocations");

    info!(
        business_days = config.workflow.realizado_edit_business_days,
        holidays = config.workflow.holidays.len(),
        timezone = %config.workflow.timezone,
        "Edit window configured"
    );
    let state = AppState::new(db, &config)?;

    let app = create_router(state, &config.cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use vansales_api::{
    config::{init_tracing, load_config},
    db,
    events::{process_events, EventSender},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    init_tracing(config.log_level(), config.log_json);

    info!(environment = %config.environment, "Starting vansales-api");

    let db = db::establish_connection_from_app_config(&config)
        .await
        .context("Failed to connect to the database")?;

    if config.auto_migrate {
        db::run_migrations(&db)
            .await
            .context("Failed to run migrations")?;
        info!("Database migrations applied");
    }

    let (tx, rx) = mpsc::channel(1024);
    tokio::spawn(process_events(rx));

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(
        Arc::new(db),
        Arc::new(config),
        Arc::new(EventSender::new(tx)),
    );
    let app = vansales_api::app_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

use std::sync::Arc;

use anyhow::Result;
use log::info;

use wifi_locator::{
    config::Settings, db::Database, diag::DiagnosticLog, ingest::IngestPipeline,
    positioning::PositioningConfig, server, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let settings = Settings::from_env()?;
    let database = Database::new(settings.db_path.clone())?;

    let diag = DiagnosticLog::new();
    diag.push("server started, database connection OK");

    let positioning = PositioningConfig::default();
    let pipeline = IngestPipeline::new(database.clone(), diag.clone(), positioning.clone());

    let state = Arc::new(AppState {
        db: database,
        diag,
        pipeline,
        positioning,
    });

    let app = server::router(state);
    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

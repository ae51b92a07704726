use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use class_tracker::server::create_router;
use class_tracker::settings::Settings;
use class_tracker::types::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::new(settings).context("invalid schedule settings")?;
    let config = state
        .store
        .ensure(&state.settings.schedule.default_timezone)
        .with_context(|| format!("failed to prepare {}", state.store.config_path().display()))?;
    info!(
        courses = config.courses.len(),
        data_dir = %state.store.data_dir().display(),
        "Loaded configuration"
    );

    let addr = state.settings.server.bind_addr();
    let app = create_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

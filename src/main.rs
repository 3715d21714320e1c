use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use memo::{config::Settings, create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;

    let db = db::init_db(&settings.database)
        .with_context(|| format!("initializing database {}", settings.database.display()))?;
    tokio::fs::create_dir_all(settings.public_dir.join(memo::upload::IMAGE_DIR))
        .await
        .with_context(|| format!("creating {}", settings.public_dir.display()))?;

    let state = AppState {
        db,
        base_path: Arc::new(settings.base_path.clone()),
        public_dir: Arc::new(settings.public_dir.clone()),
        cors_origin: Arc::new(settings.cors_origin.clone()),
    };
    let app = create_app(state);
    let addr = (settings.host, settings.port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}:{}", settings.host, settings.port))?;

    info!("running on {addr:?}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("failed serving")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(%err, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

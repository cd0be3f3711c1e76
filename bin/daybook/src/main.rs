//! # Daybook Binary
//!
//! Loads settings, builds the storage, media and session adapters, and serves
//! the application until Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use dj_api::{AppState, MediaRoutes};
use dj_auth_jwt::JwtSessionProvider;
use dj_config::{LogFormat, Settings};
use dj_core::EntryService;
use dj_db_sqlite::SqliteEntryRepo;
use dj_storage_local::LocalMediaStore;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,daybook=debug,dj_api=debug,dj_core=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(settings.log.format);

    let repo = SqliteEntryRepo::connect(&settings.database.url, settings.database.max_connections)
        .await
        .with_context(|| format!("opening {}", settings.database.url))?;
    let entries = EntryService::new(Arc::new(repo)).with_streak_mode(settings.stats.streak_mode);

    tokio::fs::create_dir_all(&settings.media.root)
        .await
        .with_context(|| format!("creating {}", settings.media.root.display()))?;
    let media_routes = MediaRoutes {
        root: settings.media.root.clone(),
        url_prefix: settings.media.url_prefix.clone(),
        max_upload_bytes: settings.media.max_upload_bytes,
    };
    let media = LocalMediaStore::new(
        media_routes.root.clone(),
        media_routes.url_prefix.clone(),
        media_routes.max_upload_bytes,
    );

    let sessions = JwtSessionProvider::new(&settings.auth.jwt_secret);

    let state = AppState::new(
        entries,
        Arc::new(sessions),
        Arc::new(media),
        &settings.auth.cookie_name,
    );
    let app = dj_api::router(state, &media_routes);

    let address = settings.bind_addr()?;
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, streak_mode = ?settings.stats.streak_mode, "daybook listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("daybook stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
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

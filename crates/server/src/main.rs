//! coursedesk server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use coursedesk_api::{AppState, auth_middleware, router as api_router};
use coursedesk_common::{Config, StorageConfig, build_storage};
use coursedesk_core::SessionStore;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursedesk=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting coursedesk server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = coursedesk_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    coursedesk_db::migrate(&db).await?;
    info!("Migrations completed");

    // Blob storage for attachments
    let storage = build_storage(&config.storage).await?;
    info!("Blob storage ready");

    let sessions = SessionStore::from_config(&config.session);
    let state = AppState::new(Arc::new(db), storage, sessions.clone());

    // Sweep idle navigation sessions in the background
    let idle = Duration::from_secs(config.session.idle_timeout_secs);
    let sweep_every = Duration::from_secs(config.session.cleanup_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_every);
        loop {
            ticker.tick().await;
            let removed = sessions.cleanup(idle).await;
            if removed > 0 {
                debug!(removed, "Dropped idle navigation sessions");
            }
        }
    });

    let mut app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state);

    // Locally stored attachments are served straight from disk
    if let StorageConfig::Local {
        base_path,
        base_url,
    } = &config.storage
        && base_url.starts_with('/')
        && base_url.trim_end_matches('/').len() > 1
    {
        app = app.nest_service(base_url.trim_end_matches('/'), ServeDir::new(base_path));
    }

    let app = app
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(config.server.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

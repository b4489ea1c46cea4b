use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    config::Config,
    handlers::{self, metrics_handler::MetricsState, AppState},
    session::{self, InMemorySessionStore, SessionLayerConfig, SessionStore},
    signals::setup_signal_handlers,
    static_files,
};

/// Entries are small JSON objects
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Start the server
///
/// This function:
/// 1. Installs the metrics recorder (when enabled)
/// 2. Creates the session store and its cleanup task
/// 3. Sets up signal handlers for graceful shutdown
/// 4. Serves requests until a shutdown signal arrives
pub async fn start_server(config: Config) -> Result<()> {
    info!("ns-costing starting...");

    let metrics_handle = if config.metrics.enabled {
        let handle = crate::metrics::init_metrics()?;
        info!(endpoint = %config.metrics.endpoint, "Prometheus metrics enabled");
        Some(Arc::new(handle))
    } else {
        None
    };

    let sessions: Arc<dyn SessionStore> =
        Arc::new(InMemorySessionStore::from_config(&config.session));

    tokio::spawn(session::session_cleanup_loop(
        sessions.clone(),
        Duration::from_secs(config.session.cleanup_interval_seconds),
    ));

    static_files::check_asset_dirs(&config.assets);

    let (shutdown_tx, signal_handle) = setup_signal_handlers();
    let mut shutdown_rx = shutdown_tx.subscribe();

    let app = create_router(&config, AppState::new(sessions), metrics_handle);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Listening on {}", addr);
    info!(
        static_dir = %config.assets.static_dir,
        config_dir = %config.assets.config_dir,
        session_ttl_seconds = config.session.ttl_seconds,
        "Configuration loaded"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    signal_handle.await?;
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(
    config: &Config,
    app_state: AppState,
    metrics_handle: Option<Arc<PrometheusHandle>>,
) -> Router {
    let sessions = app_state.sessions.clone();

    // Routes that read or write the caller's entry store
    let session_routes = Router::new()
        .route("/results", get(handlers::entries::get_results))
        .route("/add", post(handlers::entries::add_entry))
        .route("/summary", get(handlers::entries::get_summary))
        .layer(middleware::from_fn_with_state(
            SessionLayerConfig::from(&config.session),
            session::session_middleware,
        ))
        .with_state(app_state.clone());

    // Stateless, no session cookie issued
    let catalogue_routes = Router::new()
        .route("/pricing", get(handlers::pricing::list_pricing))
        .route("/defaults", get(handlers::pricing::list_defaults))
        .route("/defaults/:env", get(handlers::pricing::get_defaults))
        .route("/estimate", post(handlers::pricing::estimate));

    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .with_state(app_state)
        .nest("/api", session_routes.merge(catalogue_routes));

    if let Some(handle) = metrics_handle {
        app = app.route(
            &config.metrics.endpoint,
            get(handlers::metrics_handler::metrics).with_state(MetricsState { handle, sessions }),
        );
    }

    app.nest_service(
        "/assets/config",
        static_files::config_files_service(&config.assets),
    )
    .fallback_service(static_files::frontend_service(&config.assets))
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .layer(TraceLayer::new_for_http())
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use gosafe_engine::config;
use gosafe_engine::location;
use gosafe_engine::routes::{self, AppState};
use gosafe_engine::routing::RoutingClient;
use gosafe_engine::session::SessionController;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("GoSafe session engine starting");

    // Load configuration; fail loudly on misconfiguration.
    let config_dir = std::env::var("GOSAFE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let engine_config = match config::load_config(&config_dir) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration, refusing to start");
            std::process::exit(1);
        }
    };
    let system = &engine_config.system;

    let metrics_handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus metrics recorder");
            std::process::exit(1);
        }
    };

    let router = match RoutingClient::new(&system.routing) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build routing client");
            std::process::exit(1);
        }
    };

    let locator: Arc<dyn location::LocationProvider> =
        Arc::from(location::provider_from_config(&system.location));

    let controller = Arc::new(SessionController::new(
        locator,
        router,
        Duration::from_secs(system.routing.timeout_seconds),
        system.map.initial_region(),
        system.map.fit_padding,
    ));

    controller.start().await;

    let state = Arc::new(AppState {
        controller,
        metrics_handle,
    });

    let app = routes::router(state);

    let port: u16 = std::env::var("ENGINE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, port = port, "Failed to bind TCP listener");
            std::process::exit(1);
        }
    };

    tracing::info!(port = port, "GoSafe session engine listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "HTTP server error");
        std::process::exit(1);
    }
}

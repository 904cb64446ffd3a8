//! Driver Safety Monitor Service
//!
//! Wires sensors, the fusion engine, alert outputs and notifiers into one
//! process, and exposes status and manual controls over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod calibrate;
pub mod driver;
pub mod hardware;
pub mod replay;
mod routes;
pub mod settings;
pub mod speech;

pub use driver::{ControlMessage, Driver, DriverHandle, DriverPorts, GasProbe};
pub use settings::Settings;

use settings::{LoggingSettings, MetricsSettings};

/// Application state shared across handlers
pub struct AppState {
    pub driver: DriverHandle,
    pub version: String,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(driver: DriverHandle) -> Self {
        Self {
            driver,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub engine: ComponentHealth,
    pub face: ComponentHealth,
    pub gps: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
}

impl ComponentHealth {
    fn from_flag(ok: bool, degraded: &str) -> Self {
        Self {
            status: if ok { "ok" } else { degraded }.to_string(),
        }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/status", get(routes::status::get_status))
        .route("/api/v1/reset", post(routes::control::post_reset))
        .route("/api/v1/sobriety/capture", post(routes::control::post_capture))
        .route("/api/v1/sobriety/probe", get(routes::control::get_probe))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let running = !state.driver.control.is_closed();
    let (face_detected, gps_fix) = {
        let snapshot = state.driver.snapshot.borrow();
        (snapshot.face_detected, snapshot.gps.coordinates().is_some())
    };

    Json(HealthResponse {
        status: if running { "healthy" } else { "stopped" }.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            engine: ComponentHealth::from_flag(running, "stopped"),
            face: ComponentHealth::from_flag(face_detected, "no_face"),
            gps: ComponentHealth::from_flag(gps_fix, "no_fix"),
        },
    })
}

/// Initialize logging; `RUST_LOG` overrides the configured level
pub fn init_logging(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}

/// Install the Prometheus recorder and its scrape listener
pub fn install_metrics(settings: &MetricsSettings) -> anyhow::Result<()> {
    if !settings.enabled {
        return Ok(());
    }
    PrometheusBuilder::new()
        .with_http_listener(settings.listen)
        .install()?;
    info!("Prometheus metrics exporter listening on {}/metrics", settings.listen);
    Ok(())
}

/// Run the server
pub async fn run_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

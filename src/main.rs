// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::simulation::SimulationContext;
use crate::infrastructure::config::load_simulation_config;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    acknowledge_fire, clear_resolved_alerts, get_detections, get_history, get_status,
    get_telemetry, health_check, issue_command, list_alerts, resolve_alert,
    set_detection_mode, set_flight_mode, set_flight_parameter, set_link, start_simulation,
    step_simulation, stop_simulation, stream_snapshots,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_simulation_config().context("Failed to load simulation config")?;

    // Create the simulation context (application layer) and start ticking
    let simulation = SimulationContext::new(&config);
    simulation.start().await;

    let state = Arc::new(AppState {
        simulation: simulation.clone(),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/telemetry", get(get_telemetry))
        .route("/history", get(get_history))
        .route("/status", get(get_status))
        .route("/stream", get(stream_snapshots))
        .route("/alerts", get(list_alerts))
        .route("/alerts/clear-resolved", post(clear_resolved_alerts))
        .route("/alerts/:id/resolve", post(resolve_alert))
        .route("/fire/acknowledge", post(acknowledge_fire))
        .route("/commands", post(issue_command))
        .route("/flight-parameters", put(set_flight_parameter))
        .route("/flight-mode", put(set_flight_mode))
        .route("/link", put(set_link))
        .route("/detections", get(get_detections))
        .route("/detection-mode", put(set_detection_mode))
        .route("/simulation/start", post(start_simulation))
        .route("/simulation/stop", post(stop_simulation))
        .route("/simulation/tick", post(step_simulation))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting forest-watch simulation service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    simulation.shutdown().await;
    tracing::info!("Simulation shut down");

    Ok(())
}

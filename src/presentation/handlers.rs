// HTTP request handlers
use crate::application::vehicle_control::ControllerView;
use crate::domain::alert::{AlertId, AlertLevel};
use crate::domain::command::{CommandError, FlightMode, FlightParameter, VehicleCommand};
use crate::domain::vehicle::VehicleStatus;
use crate::infrastructure::chunked_stream::stream_from_broadcast;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: VehicleCommand,
}

#[derive(Debug, Deserialize)]
pub struct FlightParameterRequest {
    pub parameter: FlightParameter,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub struct FlightModeRequest {
    pub mode: FlightMode,
}

#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct DetectionModeRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub alert_level: AlertLevel,
    pub headline: &'static str,
    pub description: String,
    pub fire_detected: bool,
    pub vehicle_status: VehicleStatus,
    pub controller: ControllerView,
    pub running: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

async fn respond<T: Serialize>(status: StatusCode, data: &T, headers: &HeaderMap) -> Response {
    match json_response(status, data, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

async fn rejected(error: CommandError, headers: &HeaderMap) -> Response {
    let body = ErrorBody {
        error: error.to_string(),
    };
    respond(StatusCode::UNPROCESSABLE_ENTITY, &body, headers).await
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Latest telemetry with derived grades
pub async fn get_telemetry(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.simulation.snapshot().await;
    respond(StatusCode::OK, &snapshot, &headers).await
}

pub async fn list_alerts(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let alerts = state.simulation.alerts().await;
    respond(StatusCode::OK, &alerts, &headers).await
}

pub async fn resolve_alert(
    Path(id): Path<u64>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    // Unknown ids are not an error: the alert may have been evicted meanwhile.
    let resolved = state.simulation.resolve_alert(AlertId(id)).await;
    respond(StatusCode::OK, &serde_json::json!({ "resolved": resolved }), &headers).await
}

pub async fn clear_resolved_alerts(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let removed = state.simulation.clear_resolved_alerts().await;
    respond(StatusCode::OK, &serde_json::json!({ "removed": removed }), &headers).await
}

pub async fn get_history(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let history = state.simulation.history().await;
    respond(StatusCode::OK, &history, &headers).await
}

pub async fn get_status(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let simulation = &state.simulation;
    let alert_level = simulation.alert_level().await;
    let controller = simulation.controller().await;

    let view = StatusView {
        alert_level,
        headline: alert_level.headline(),
        description: alert_level.description(simulation.fire_location()),
        fire_detected: simulation.fire_detected().await,
        vehicle_status: controller.status,
        controller,
        running: simulation.is_running().await,
    };
    respond(StatusCode::OK, &view, &headers).await
}

pub async fn acknowledge_fire(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let acknowledged = state.simulation.acknowledge_fire().await;
    respond(StatusCode::OK, &serde_json::json!({ "acknowledged": acknowledged }), &headers).await
}

pub async fn issue_command(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CommandRequest>,
) -> Response {
    match state.simulation.issue_command(request.command).await {
        Ok(view) => respond(StatusCode::OK, &view, &headers).await,
        Err(e) => rejected(e, &headers).await,
    }
}

pub async fn set_flight_parameter(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<FlightParameterRequest>,
) -> Response {
    match state
        .simulation
        .set_flight_parameter(request.parameter, request.value)
        .await
    {
        Ok(value) => {
            let body = serde_json::json!({ "parameter": request.parameter, "value": value });
            respond(StatusCode::OK, &body, &headers).await
        }
        Err(e) => rejected(e, &headers).await,
    }
}

pub async fn set_flight_mode(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<FlightModeRequest>,
) -> Response {
    let view = state.simulation.set_flight_mode(request.mode).await;
    respond(StatusCode::OK, &view, &headers).await
}

pub async fn set_link(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<LinkRequest>,
) -> Response {
    let changed = state.simulation.set_link(request.connected).await;
    respond(StatusCode::OK, &serde_json::json!({ "changed": changed }), &headers).await
}

/// Objects on the camera overlay from the latest scan
pub async fn get_detections(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let detections = state.simulation.detections().await;
    respond(StatusCode::OK, &detections, &headers).await
}

pub async fn set_detection_mode(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<DetectionModeRequest>,
) -> Response {
    let view = state.simulation.set_detection_mode(request.enabled).await;
    respond(StatusCode::OK, &view, &headers).await
}

pub async fn start_simulation(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let started = state.simulation.start().await;
    respond(StatusCode::OK, &serde_json::json!({ "started": started }), &headers).await
}

pub async fn stop_simulation(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let stopped = state.simulation.stop().await;
    respond(StatusCode::OK, &serde_json::json!({ "stopped": stopped }), &headers).await
}

/// Advance one combined step by hand, independent of the clock
pub async fn step_simulation(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.simulation.tick().await;
    respond(StatusCode::OK, &snapshot, &headers).await
}

/// Stream a snapshot frame on every telemetry tick
pub async fn stream_snapshots(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    stream_from_broadcast(state.simulation.subscribe(), accepts_brotli(&headers))
}

// Simulation context - single owner of vehicle state, alerts, history and timers
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;

use crate::application::alert_log::AlertLog;
use crate::application::clock::{ClockIntervals, EpochToken, SimulationClock, TickTarget};
use crate::application::detector::{EventDetector, fire_alert};
use crate::application::history_buffer::HistoryBuffer;
use crate::application::object_detector::ObjectDetector;
use crate::application::sampler::{SyntheticSampler, TelemetrySource};
use crate::application::vehicle_control::{ControllerView, Deferred, DeferredKind, VehicleController};
use crate::domain::alert::{Alert, AlertDraft, AlertId, AlertLevel};
use crate::domain::command::{CommandError, FlightMode, FlightParameter, VehicleCommand};
use crate::domain::dashboard::DashboardSnapshot;
use crate::domain::detection::{DetectedObject, DetectionView};
use crate::domain::history::HistorySample;
use crate::domain::vehicle::{VehicleState, VehicleStatus};
use crate::infrastructure::config::SimulationConfig;

#[derive(Debug, Clone, Default)]
struct Escalation {
    fire_detected: bool,
    level: AlertLevel,
    fire_alert: Option<AlertId>,
}

pub struct SimulationContext {
    fire_location: String,
    source: Arc<dyn TelemetrySource>,
    detector: EventDetector,
    objects: ObjectDetector,
    // Held for the whole of a tick, which also serialises ticks.
    rng: Mutex<StdRng>,
    // Write order when more than one is held: vehicle, history, escalation, alerts.
    vehicle: RwLock<VehicleState>,
    alerts: RwLock<AlertLog>,
    history: RwLock<HistoryBuffer>,
    escalation: RwLock<Escalation>,
    detections: RwLock<DetectionView>,
    controller: RwLock<VehicleController>,
    deferred: Mutex<HashMap<DeferredKind, JoinHandle<()>>>,
    clock: Mutex<SimulationClock>,
    updates: broadcast::Sender<DashboardSnapshot>,
}

impl SimulationContext {
    pub fn new(config: &SimulationConfig) -> Arc<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_source(config, Arc::new(SyntheticSampler::new(config)), rng)
    }

    pub fn with_source(
        config: &SimulationConfig,
        source: Arc<dyn TelemetrySource>,
        rng: StdRng,
    ) -> Arc<Self> {
        let mut alerts = AlertLog::new(config.alert_retention_cap);
        if config.seed_alerts {
            alerts.seed_defaults(Utc::now());
        }
        let (updates, _) = broadcast::channel(config.stream_capacity.max(1));

        Arc::new(Self {
            fire_location: config.fire_location.clone(),
            source,
            detector: EventDetector::new(config.fire_probability, config.alert_probability),
            objects: ObjectDetector::new(&config.detection),
            rng: Mutex::new(rng),
            vehicle: RwLock::new(SyntheticSampler::initial_state(&config.initial)),
            alerts: RwLock::new(alerts),
            history: RwLock::new(HistoryBuffer::new(config.history_window_size)),
            escalation: RwLock::new(Escalation::default()),
            detections: RwLock::new(DetectionView {
                enabled: config.detection.enabled,
                objects: Vec::new(),
            }),
            controller: RwLock::new(VehicleController::new(config)),
            deferred: Mutex::new(HashMap::new()),
            clock: Mutex::new(SimulationClock::new(ClockIntervals {
                telemetry: Duration::from_millis(config.tick_interval_ms),
                alert: Duration::from_millis(config.alert_interval_ms),
                detection: Duration::from_millis(config.detection.interval_ms),
            })),
            updates,
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────

    pub async fn start(self: &Arc<Self>) -> bool {
        let target: Arc<dyn TickTarget> = self.clone();
        self.clock.lock().await.start(target)
    }

    pub async fn stop(&self) -> bool {
        self.clock.lock().await.stop()
    }

    pub async fn is_running(&self) -> bool {
        self.clock.lock().await.is_running()
    }

    /// Stop the clock and cancel every pending deferred transition.
    pub async fn shutdown(&self) {
        self.stop().await;
        for (_, task) in self.deferred.lock().await.drain() {
            task.abort();
        }
    }

    // ── Ticks ────────────────────────────────────────────────────

    /// Advance telemetry one step and run the fire trial.
    pub async fn tick_telemetry(&self) -> DashboardSnapshot {
        let mut rng = self.rng.lock().await;
        self.advance_telemetry(&mut rng).await
    }

    /// Run the informational-alert trial once.
    pub async fn tick_alerts(&self) -> Option<AlertId> {
        let mut rng = self.rng.lock().await;
        let draft = self.detector.alert_trial(&mut *rng)?;
        Some(self.record_alert(draft).await)
    }

    /// Rescan the camera frame. Empty while detection is switched off.
    pub async fn tick_detections(&self) -> Vec<DetectedObject> {
        let mut rng = self.rng.lock().await;
        self.scan_objects(&mut rng).await
    }

    /// Advance telemetry and run every trial in a single step.
    pub async fn tick(&self) -> DashboardSnapshot {
        let mut rng = self.rng.lock().await;

        let previous = self.vehicle.read().await.clone();
        let next = self.source.advance(&previous, &mut *rng);
        let fire_active = self.escalation.read().await.fire_detected;
        let detection = self.detector.detect(&next, fire_active, &mut *rng);

        self.commit(&next, detection.fire_detected, detection.new_alerts)
            .await;
        self.scan_objects(&mut rng).await;
        self.publish(next).await
    }

    async fn advance_telemetry(&self, rng: &mut StdRng) -> DashboardSnapshot {
        let previous = self.vehicle.read().await.clone();
        let next = self.source.advance(&previous, &mut *rng);
        let fire_active = self.escalation.read().await.fire_detected;
        let fire = !fire_active && self.detector.fire_trial(&mut *rng);

        self.commit(&next, fire, Vec::new()).await;
        self.publish(next).await
    }

    /// Apply one tick's results. Every guard is taken before the first write,
    /// so a caller dropped mid-way leaves the tick either whole or not applied.
    async fn commit(&self, next: &VehicleState, fire: bool, drafts: Vec<AlertDraft>) {
        let mut vehicle = self.vehicle.write().await;
        let mut history = self.history.write().await;
        let mut escalation = self.escalation.write().await;
        let mut alerts = self.alerts.write().await;

        let now = Utc::now();
        *vehicle = next.clone();
        history.push(HistorySample::from_state(next, now));

        if fire && !escalation.fire_detected {
            let id = alerts.append(fire_alert(&self.fire_location), now);
            escalation.fire_detected = true;
            escalation.level = AlertLevel::Emergency;
            escalation.fire_alert = Some(id);
            tracing::warn!(location = %self.fire_location, alert_id = %id, "Fire detected, escalating to emergency");
        }
        for draft in drafts {
            let kind = draft.kind;
            let id = alerts.append(draft, now);
            tracing::info!(alert_id = %id, ?kind, "Alert raised");
        }

        tracing::debug!(
            tick = next.tick,
            battery = next.battery,
            altitude = next.altitude,
            gps = next.gps_signal,
            "Telemetry tick"
        );
    }

    async fn scan_objects(&self, rng: &mut StdRng) -> Vec<DetectedObject> {
        let mut detections = self.detections.write().await;
        if !detections.enabled {
            return Vec::new();
        }

        detections.objects = self.objects.scan(&mut *rng);
        for object in &detections.objects {
            tracing::debug!(kind = %object.kind, confidence = object.confidence, "Object detected");
        }
        detections.objects.clone()
    }

    async fn publish(&self, vehicle: VehicleState) -> DashboardSnapshot {
        let snapshot = self.snapshot_of(vehicle).await;
        // No subscribers is not an error.
        let _ = self.updates.send(snapshot.clone());
        snapshot
    }

    async fn record_alert(&self, draft: AlertDraft) -> AlertId {
        let kind = draft.kind;
        let id = self.alerts.write().await.append(draft, Utc::now());
        tracing::info!(alert_id = %id, ?kind, "Alert raised");
        id
    }

    // ── Read accessors ───────────────────────────────────────────

    pub async fn vehicle(&self) -> VehicleState {
        self.vehicle.read().await.clone()
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.alerts.read().await.list().cloned().collect()
    }

    pub async fn history(&self) -> Vec<HistorySample> {
        self.history.read().await.snapshot()
    }

    pub async fn alert_level(&self) -> AlertLevel {
        self.escalation.read().await.level
    }

    pub async fn fire_detected(&self) -> bool {
        self.escalation.read().await.fire_detected
    }

    pub async fn detections(&self) -> DetectionView {
        self.detections.read().await.clone()
    }

    pub async fn vehicle_status(&self) -> VehicleStatus {
        self.controller.read().await.status()
    }

    pub async fn controller(&self) -> ControllerView {
        self.controller.read().await.view()
    }

    pub fn fire_location(&self) -> &str {
        &self.fire_location
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let vehicle = self.vehicle().await;
        self.snapshot_of(vehicle).await
    }

    async fn snapshot_of(&self, vehicle: VehicleState) -> DashboardSnapshot {
        let escalation = self.escalation.read().await.clone();
        let unresolved = self.alerts.read().await.unresolved();
        let detections = self.detections().await;
        let status = self.vehicle_status().await;
        DashboardSnapshot::new(
            vehicle,
            status,
            escalation.level,
            escalation.fire_detected,
            unresolved,
            detections,
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardSnapshot> {
        self.updates.subscribe()
    }

    // ── Acknowledgements ─────────────────────────────────────────

    /// Clear the fire condition and return to normal. Returns false if no fire was active.
    pub async fn acknowledge_fire(&self) -> bool {
        let mut escalation = self.escalation.write().await;
        if !escalation.fire_detected {
            return false;
        }

        escalation.fire_detected = false;
        escalation.level = AlertLevel::Normal;
        if let Some(id) = escalation.fire_alert.take() {
            self.alerts.write().await.resolve(id);
        }

        tracing::info!("Fire alert acknowledged");
        true
    }

    pub async fn resolve_alert(&self, id: AlertId) -> bool {
        let found = self.alerts.write().await.resolve(id);
        if !found {
            tracing::debug!(alert_id = %id, "Resolve ignored, alert not in log");
        }
        found
    }

    pub async fn clear_resolved_alerts(&self) -> usize {
        let removed = self.alerts.write().await.clear_resolved();
        tracing::debug!(removed, "Cleared resolved alerts");
        removed
    }

    // ── Detection overlay ────────────────────────────────────────

    /// Switch object detection on or off. Switching off clears the overlay.
    pub async fn set_detection_mode(&self, enabled: bool) -> DetectionView {
        let mut detections = self.detections.write().await;
        if detections.enabled != enabled {
            tracing::info!(enabled, "Object detection toggled");
        }
        detections.enabled = enabled;
        if !enabled {
            detections.objects.clear();
        }
        detections.clone()
    }

    // ── Commands ─────────────────────────────────────────────────

    pub async fn issue_command(
        self: &Arc<Self>,
        command: VehicleCommand,
    ) -> Result<ControllerView, CommandError> {
        let mut controller = self.controller.write().await;
        let follow_ups = match controller.issue(command, Utc::now()) {
            Ok(follow_ups) => follow_ups,
            Err(e) => {
                tracing::warn!(%command, "Command rejected: {}", e);
                return Err(e);
            }
        };

        // Registered under the controller guard so tasks land in command order.
        for deferred in follow_ups {
            self.schedule(deferred).await;
        }
        let view = controller.view();
        drop(controller);

        tracing::info!(%command, status = %view.status, "Command accepted");
        Ok(view)
    }

    pub async fn set_flight_parameter(
        &self,
        parameter: FlightParameter,
        value: f64,
    ) -> Result<f64, CommandError> {
        let result = self
            .controller
            .write()
            .await
            .set_flight_parameter(parameter, value);
        match &result {
            Ok(value) => tracing::info!(%parameter, value, "Flight parameter set"),
            Err(e) => tracing::warn!(%parameter, "Flight parameter rejected: {}", e),
        }
        result
    }

    pub async fn set_flight_mode(&self, mode: FlightMode) -> ControllerView {
        let mut controller = self.controller.write().await;
        controller.set_flight_mode(mode);
        tracing::info!(?mode, "Flight mode set");
        controller.view()
    }

    /// Mark the vehicle link up or down.
    pub async fn set_link(&self, connected: bool) -> bool {
        let changed = self.controller.write().await.set_link(connected);
        if changed && !connected {
            if let Some(task) = self.deferred.lock().await.remove(&DeferredKind::LandingComplete) {
                task.abort();
            }
            tracing::warn!("Vehicle link lost");
        }
        changed
    }

    /// Run `deferred` after its delay, replacing any pending task of the same kind.
    async fn schedule(self: &Arc<Self>, deferred: Deferred) {
        let ctx = Arc::clone(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(deferred.delay).await;
            if ctx.controller.write().await.complete(&deferred) {
                tracing::debug!(kind = ?deferred.kind, "Deferred transition applied");
            }
        });

        if let Some(previous) = self.deferred.lock().await.insert(deferred.kind, task) {
            previous.abort();
        }
    }
}

#[async_trait]
impl TickTarget for SimulationContext {
    async fn telemetry_tick(&self, token: &EpochToken) {
        let mut rng = self.rng.lock().await;
        if !token.is_current() {
            return;
        }
        self.advance_telemetry(&mut rng).await;
    }

    async fn alert_tick(&self, token: &EpochToken) {
        let mut rng = self.rng.lock().await;
        if !token.is_current() {
            return;
        }
        if let Some(draft) = self.detector.alert_trial(&mut *rng) {
            self.record_alert(draft).await;
        }
    }

    async fn detection_tick(&self, token: &EpochToken) {
        let mut rng = self.rng.lock().await;
        if !token.is_current() {
            return;
        }
        self.scan_objects(&mut rng).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::AlertKind;
    use crate::domain::command::CommandProgress;
    use crate::domain::detection::ObjectKind;

    fn config() -> SimulationConfig {
        SimulationConfig {
            seed: Some(17),
            fire_probability: 0.0,
            alert_probability: 0.0,
            ..SimulationConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_fills_history_window() {
        let ctx = SimulationContext::new(&SimulationConfig {
            history_window_size: 5,
            tick_interval_ms: 100,
            ..config()
        });
        assert!(ctx.start().await);
        assert!(!ctx.start().await);

        tokio::time::sleep(Duration::from_millis(750)).await;
        ctx.stop().await;

        let ticks: Vec<u64> = ctx.history().await.iter().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![3, 4, 5, 6, 7]);
        assert_eq!(ctx.vehicle().await.tick, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_further_ticks() {
        let ctx = SimulationContext::new(&SimulationConfig {
            tick_interval_ms: 100,
            ..config()
        });
        ctx.start().await;
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(ctx.stop().await);
        assert!(!ctx.stop().await);
        assert!(!ctx.is_running().await);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(ctx.vehicle().await.tick, 2);
        assert_eq!(ctx.history().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_blocked_tick_keeps_state_consistent() {
        let ctx = SimulationContext::new(&SimulationConfig {
            tick_interval_ms: 100,
            fire_probability: 1.0,
            ..config()
        });
        // Keep the first tick parked on the history lock.
        let reader = ctx.history.read().await;
        ctx.start().await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(ctx.stop().await);
        drop(reader);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let vehicle = ctx.vehicle().await;
        let history = ctx.history().await;
        assert_eq!(vehicle.tick, 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].tick, 1);
        assert!(ctx.fire_detected().await);
        assert_eq!(ctx.alerts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_history_length_tracks_ticks() {
        let ctx = SimulationContext::new(&config());
        for n in 1..=25usize {
            ctx.tick_telemetry().await;
            assert_eq!(ctx.history().await.len(), n.min(20));
        }
    }

    #[tokio::test]
    async fn test_certain_fire_escalates_on_next_tick() {
        let ctx = SimulationContext::new(&SimulationConfig {
            fire_probability: 1.0,
            ..config()
        });
        assert!(!ctx.fire_detected().await);

        let snapshot = ctx.tick_telemetry().await;
        assert!(snapshot.fire_detected);
        assert_eq!(snapshot.alert_level, AlertLevel::Emergency);

        let alerts = ctx.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Error);
        assert!(alerts[0].message.contains(ctx.fire_location()));

        // A second detection while active raises nothing new.
        ctx.tick_telemetry().await;
        assert_eq!(ctx.alerts().await.len(), 1);

        assert!(ctx.acknowledge_fire().await);
        assert!(!ctx.fire_detected().await);
        assert_eq!(ctx.alert_level().await, AlertLevel::Normal);
        assert!(ctx.alerts().await[0].resolved);
        assert!(!ctx.acknowledge_fire().await);
    }

    #[tokio::test]
    async fn test_alert_retention_through_ticks() {
        let ctx = SimulationContext::new(&SimulationConfig {
            alert_probability: 1.0,
            alert_retention_cap: 10,
            ..config()
        });
        let mut ids = Vec::new();
        for _ in 0..12 {
            ids.push(ctx.tick_alerts().await.unwrap());
        }

        let alerts = ctx.alerts().await;
        assert_eq!(alerts.len(), 10);
        assert_eq!(alerts[0].id, ids[11]);
        assert!(alerts.iter().all(|a| a.id != ids[0] && a.id != ids[1]));
    }

    #[tokio::test]
    async fn test_resolve_and_clear() {
        let ctx = SimulationContext::new(&SimulationConfig {
            alert_probability: 1.0,
            ..config()
        });
        let first = ctx.tick_alerts().await.unwrap();
        ctx.tick_alerts().await.unwrap();

        assert!(ctx.resolve_alert(first).await);
        assert!(ctx.resolve_alert(first).await);
        assert!(!ctx.resolve_alert(AlertId(10_000)).await);
        assert_eq!(ctx.clear_resolved_alerts().await, 1);
        assert!(ctx.alerts().await.iter().all(|a| !a.resolved));
    }

    #[tokio::test]
    async fn test_combined_tick_runs_both_trials() {
        let ctx = SimulationContext::new(&SimulationConfig {
            fire_probability: 1.0,
            alert_probability: 1.0,
            ..config()
        });
        let snapshot = ctx.tick().await;
        assert!(snapshot.fire_detected);
        assert_eq!(snapshot.vehicle.tick, 1);
        assert_eq!(ctx.alerts().await.len(), 2);
        assert_eq!(snapshot.unresolved_alerts, 2);
    }

    #[tokio::test]
    async fn test_subscribers_receive_snapshots() {
        let ctx = SimulationContext::new(&config());
        let mut rx = ctx.subscribe();

        ctx.tick_telemetry().await;
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.vehicle.tick, 1);
        assert_eq!(snapshot.status, VehicleStatus::Connected);
    }

    #[tokio::test]
    async fn test_seeded_alerts() {
        let ctx = SimulationContext::new(&SimulationConfig {
            seed_alerts: true,
            ..config()
        });
        assert_eq!(ctx.alerts().await.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_landing_completes_after_delay() {
        let ctx = SimulationContext::new(&config());
        ctx.issue_command(VehicleCommand::Takeoff).await.unwrap();
        let view = ctx.issue_command(VehicleCommand::Land).await.unwrap();
        assert_eq!(view.status, VehicleStatus::Landing);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(ctx.vehicle_status().await, VehicleStatus::Landing);
        let record = ctx.controller().await.last_command.unwrap();
        assert_eq!(record.command, VehicleCommand::Land);
        assert_eq!(record.progress, CommandProgress::Completed);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(ctx.vehicle_status().await, VehicleStatus::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_landing_never_applies() {
        let ctx = SimulationContext::new(&config());
        ctx.issue_command(VehicleCommand::Takeoff).await.unwrap();
        ctx.issue_command(VehicleCommand::Land).await.unwrap();

        tokio::time::sleep(Duration::from_millis(2000)).await;
        ctx.issue_command(VehicleCommand::EmergencyStop).await.unwrap();
        ctx.issue_command(VehicleCommand::Takeoff).await.unwrap();
        ctx.issue_command(VehicleCommand::Land).await.unwrap();

        // The first landing would have completed at 3s.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(ctx.vehicle_status().await, VehicleStatus::Landing);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(ctx.vehicle_status().await, VehicleStatus::Connected);
        assert!(!ctx.controller().await.emergency_mode);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_commands_leave_latest_ack_pending() {
        let ctx = SimulationContext::new(&SimulationConfig {
            command_ack_ms: 50,
            ..config()
        });
        ctx.issue_command(VehicleCommand::Takeoff).await.unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let ctx = ctx.clone();
                tokio::spawn(async move { ctx.issue_command(VehicleCommand::ReturnToHome).await })
            })
            .collect();
        for result in futures::future::join_all(tasks).await {
            assert!(result.unwrap().is_ok());
        }

        tokio::time::sleep(Duration::from_millis(300)).await;
        let record = ctx.controller().await.last_command.unwrap();
        assert_eq!(record.command, VehicleCommand::ReturnToHome);
        assert_eq!(record.progress, CommandProgress::Completed);
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_detection_mode_gates_scans() {
        let mut config = config();
        config.detection.smoke.probability = 1.0;
        config.detection.fire.probability = 1.0;
        config.detection.vehicle.probability = 1.0;
        let ctx = SimulationContext::new(&config);

        assert!(ctx.tick_detections().await.is_empty());
        assert!(!ctx.detections().await.enabled);

        assert!(ctx.set_detection_mode(true).await.enabled);
        let objects = ctx.tick_detections().await;
        assert_eq!(objects.len(), 3);
        assert_eq!(ctx.snapshot().await.detections.objects, objects);

        let view = ctx.set_detection_mode(false).await;
        assert!(!view.enabled);
        assert!(view.objects.is_empty());
        assert!(ctx.tick_detections().await.is_empty());
    }

    #[tokio::test]
    async fn test_same_seed_gives_same_detections() {
        let mut config = config();
        config.detection.enabled = true;
        let a = SimulationContext::new(&config);
        let b = SimulationContext::new(&config);

        for _ in 0..20 {
            assert_eq!(a.tick().await.detections, b.tick().await.detections);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_rescans_on_detection_cadence() {
        let mut config = SimulationConfig {
            tick_interval_ms: 10_000,
            ..config()
        };
        config.detection.enabled = true;
        config.detection.interval_ms = 100;
        config.detection.vehicle.probability = 1.0;
        let ctx = SimulationContext::new(&config);

        ctx.start().await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        ctx.stop().await;

        let view = ctx.detections().await;
        assert!(view.objects.iter().any(|o| o.kind == ObjectKind::Vehicle));
        assert_eq!(ctx.vehicle().await.tick, 0);
    }

    #[tokio::test]
    async fn test_snapshot_carries_health() {
        let ctx = SimulationContext::new(&config());
        let snapshot = ctx.snapshot().await;
        assert_eq!(snapshot.health.camera, 98.0);
        assert_eq!(snapshot.health.communication, 94.0);

        ctx.set_link(false).await;
        assert_eq!(ctx.snapshot().await.health.communication, 0.0);
    }

    #[tokio::test]
    async fn test_rejected_command_leaves_state() {
        let ctx = SimulationContext::new(&config());
        let before = ctx.controller().await;

        let err = ctx.issue_command(VehicleCommand::Land).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidTransition { .. }));
        assert_eq!(ctx.controller().await, before);

        assert!(ctx.set_flight_parameter(FlightParameter::Altitude, 400.0).await.is_err());
        assert_eq!(ctx.controller().await, before);
        assert_eq!(ctx.set_flight_parameter(FlightParameter::Altitude, 200.0).await, Ok(200.0));
        assert_eq!(ctx.controller().await.altitude_setting, 200.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_loss_cancels_landing() {
        let ctx = SimulationContext::new(&config());
        ctx.issue_command(VehicleCommand::Takeoff).await.unwrap();
        ctx.issue_command(VehicleCommand::Land).await.unwrap();
        assert!(ctx.set_link(false).await);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ctx.vehicle_status().await, VehicleStatus::Disconnected);
        ctx.shutdown().await;
    }
}

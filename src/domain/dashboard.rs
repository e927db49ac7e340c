// Dashboard domain model - what a view renders on each telemetry tick
use serde::Serialize;

use super::alert::AlertLevel;
use super::detection::DetectionView;
use super::vehicle::{BatteryBand, HealthGrade, SystemHealth, VehicleState, VehicleStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub vehicle: VehicleState,
    pub status: VehicleStatus,
    pub alert_level: AlertLevel,
    pub fire_detected: bool,
    pub unresolved_alerts: usize,
    pub battery_band: BatteryBand,
    pub gps_grade: HealthGrade,
    pub health: SystemHealth,
    pub health_grade: HealthGrade,
    pub detections: DetectionView,
}

impl DashboardSnapshot {
    pub fn new(
        vehicle: VehicleState,
        status: VehicleStatus,
        alert_level: AlertLevel,
        fire_detected: bool,
        unresolved_alerts: usize,
        detections: DetectionView,
    ) -> Self {
        let health = SystemHealth::assess(&vehicle, status);
        Self {
            battery_band: vehicle.battery_band(),
            gps_grade: vehicle.gps_grade(),
            health_grade: health.grade(),
            health,
            vehicle,
            status,
            alert_level,
            fire_detected,
            unresolved_alerts,
            detections,
        }
    }
}

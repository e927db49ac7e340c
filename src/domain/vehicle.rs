// Vehicle domain model - telemetry state, connectivity and health grading
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Active,
    Inactive,
}

/// One sample of the vehicle's telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleState {
    /// Number of sampler advances applied since the simulation started.
    pub tick: u64,
    pub battery: f64,
    pub altitude: f64,
    pub speed: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub gps_signal: f64,
    pub coordinates: Coordinates,
    pub camera_status: DeviceStatus,
    pub thermal_status: DeviceStatus,
}

impl VehicleState {
    pub fn battery_band(&self) -> BatteryBand {
        BatteryBand::from_level(self.battery)
    }

    pub fn gps_grade(&self) -> HealthGrade {
        HealthGrade::from_score(self.gps_signal)
    }
}

/// Link/flight status of the vehicle as seen by the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Connected,
    Disconnected,
    Flying,
    Landing,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Connected => "connected",
            VehicleStatus::Disconnected => "disconnected",
            VehicleStatus::Flying => "flying",
            VehicleStatus::Landing => "landing",
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthGrade {
    Good,
    Fair,
    Poor,
}

impl HealthGrade {
    pub fn from_score(score: f64) -> Self {
        if score >= 95.0 {
            HealthGrade::Good
        } else if score >= 85.0 {
            HealthGrade::Fair
        } else {
            HealthGrade::Poor
        }
    }
}

/// Nominal scores of the onboard subsystems while they are up.
const CAMERA_NOMINAL: f64 = 98.0;
const THERMAL_NOMINAL: f64 = 97.0;
const LINK_NOMINAL: f64 = 94.0;

/// Per-subsystem health scores on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemHealth {
    pub overall: f64,
    pub camera: f64,
    pub thermal: f64,
    pub gps: f64,
    pub communication: f64,
    pub battery: f64,
}

impl SystemHealth {
    /// Score each subsystem from the latest sample and link status.
    /// `overall` is the mean of the five subsystem scores.
    pub fn assess(state: &VehicleState, status: VehicleStatus) -> Self {
        let device = |status: DeviceStatus, nominal: f64| match status {
            DeviceStatus::Active => nominal,
            DeviceStatus::Inactive => 0.0,
        };
        let camera = device(state.camera_status, CAMERA_NOMINAL);
        let thermal = device(state.thermal_status, THERMAL_NOMINAL);
        let gps = state.gps_signal.clamp(0.0, 100.0);
        let communication = match status {
            VehicleStatus::Disconnected => 0.0,
            _ => LINK_NOMINAL,
        };
        let battery = state.battery.clamp(0.0, 100.0);

        Self {
            overall: (camera + thermal + gps + communication + battery) / 5.0,
            camera,
            thermal,
            gps,
            communication,
            battery,
        }
    }

    pub fn grade(&self) -> HealthGrade {
        HealthGrade::from_score(self.overall)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryBand {
    Ample,
    Moderate,
    Low,
    Critical,
}

impl BatteryBand {
    pub fn from_level(level: f64) -> Self {
        if level > 60.0 {
            BatteryBand::Ample
        } else if level > 30.0 {
            BatteryBand::Moderate
        } else if level > 15.0 {
            BatteryBand::Low
        } else {
            BatteryBand::Critical
        }
    }
}

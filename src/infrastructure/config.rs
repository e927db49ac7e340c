use serde::Deserialize;
use thiserror::Error;

use crate::domain::vehicle::{Coordinates, DeviceStatus};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_interval_ms: u64,
    pub alert_interval_ms: u64,
    pub fire_probability: f64,
    pub alert_probability: f64,
    pub alert_retention_cap: usize,
    pub history_window_size: usize,
    pub battery_decay_per_tick: f64,
    pub battery_floor: f64,
    /// Fixed RNG seed; entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Populate the alert log with the startup entries on launch.
    pub seed_alerts: bool,
    pub fire_location: String,
    pub landing_delay_ms: u64,
    pub emergency_hold_ms: u64,
    pub command_ack_ms: u64,
    pub stream_capacity: usize,
    pub limits: FlightLimits,
    pub noise: NoiseConfig,
    pub detection: DetectionConfig,
    pub initial: InitialVehicle,
    pub server: ServerSettings,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            alert_interval_ms: 5000,
            fire_probability: 0.001,
            alert_probability: 0.1,
            alert_retention_cap: 10,
            history_window_size: 20,
            battery_decay_per_tick: 0.1,
            battery_floor: 10.0,
            seed: None,
            seed_alerts: false,
            fire_location: "Changping Forest Park, Beijing".to_string(),
            landing_delay_ms: 3000,
            emergency_hold_ms: 3000,
            command_ack_ms: 2000,
            stream_capacity: 64,
            limits: FlightLimits::default(),
            noise: NoiseConfig::default(),
            detection: DetectionConfig::default(),
            initial: InitialVehicle::default(),
            server: ServerSettings::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FlightLimits {
    pub speed: Range,
    pub altitude: Range,
}

impl Default for FlightLimits {
    fn default() -> Self {
        Self {
            speed: Range::new(5.0, 50.0),
            altitude: Range::new(50.0, 300.0),
        }
    }
}

/// Parameters of one bounded mean-reverting random walk.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct WalkConfig {
    pub center: f64,
    pub spread: f64,
    pub reversion: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct GpsNoise {
    pub baseline: f64,
    pub spread: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NoiseConfig {
    pub altitude: WalkConfig,
    pub speed: WalkConfig,
    pub temperature: WalkConfig,
    pub humidity: WalkConfig,
    pub gps: GpsNoise,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            altitude: WalkConfig {
                center: 120.0,
                spread: 2.5,
                reversion: 0.05,
                min: 0.0,
                max: 400.0,
            },
            speed: WalkConfig {
                center: 15.0,
                spread: 1.0,
                reversion: 0.1,
                min: 0.0,
                max: 60.0,
            },
            temperature: WalkConfig {
                center: 25.0,
                spread: 1.0,
                reversion: 0.2,
                min: -30.0,
                max: 60.0,
            },
            humidity: WalkConfig {
                center: 60.0,
                spread: 2.0,
                reversion: 0.2,
                min: 0.0,
                max: 100.0,
            },
            gps: GpsNoise {
                baseline: 90.0,
                spread: 10.0,
            },
        }
    }
}

/// One object class the camera overlay may report.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ObjectTrial {
    pub probability: f64,
    pub confidence: Range,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DetectionConfig {
    /// Whether the overlay is switched on at launch.
    pub enabled: bool,
    pub interval_ms: u64,
    pub smoke: ObjectTrial,
    pub fire: ObjectTrial,
    pub vehicle: ObjectTrial,
    /// Marker position bounds, in percent of the frame.
    pub x: Range,
    pub y: Range,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: 2000,
            smoke: ObjectTrial {
                probability: 0.3,
                confidence: Range::new(85.0, 95.0),
            },
            fire: ObjectTrial {
                probability: 0.2,
                confidence: Range::new(75.0, 95.0),
            },
            vehicle: ObjectTrial {
                probability: 0.4,
                confidence: Range::new(90.0, 100.0),
            },
            x: Range::new(10.0, 90.0),
            y: Range::new(20.0, 80.0),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InitialVehicle {
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

impl Default for InitialVehicle {
    fn default() -> Self {
        Self {
            battery: 85.0,
            altitude: 120.0,
            speed: 15.0,
            temperature: 25.0,
            humidity: 60.0,
            gps_signal: 95.0,
            coordinates: Coordinates {
                lat: 39.9042,
                lng: 116.4074,
            },
            camera_status: DeviceStatus::Active,
            thermal_status: DeviceStatus::Active,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must be a probability in [0, 1], got {value}")]
    Probability { field: &'static str, value: f64 },

    #[error("{field} is out of range: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("tick_interval_ms", self.tick_interval_ms),
            ("alert_interval_ms", self.alert_interval_ms),
            ("detection.interval_ms", self.detection.interval_ms),
            ("alert_retention_cap", self.alert_retention_cap as u64),
            ("history_window_size", self.history_window_size as u64),
            ("stream_capacity", self.stream_capacity as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }

        for (field, value) in [
            ("fire_probability", self.fire_probability),
            ("alert_probability", self.alert_probability),
            ("detection.smoke.probability", self.detection.smoke.probability),
            ("detection.fire.probability", self.detection.fire.probability),
            ("detection.vehicle.probability", self.detection.vehicle.probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { field, value });
            }
        }

        if !(self.battery_decay_per_tick.is_finite() && self.battery_decay_per_tick >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "battery_decay_per_tick",
                reason: format!("expected a non-negative number, got {}", self.battery_decay_per_tick),
            });
        }
        if !(0.0..=100.0).contains(&self.battery_floor) {
            return Err(ConfigError::Invalid {
                field: "battery_floor",
                reason: format!("expected [0, 100], got {}", self.battery_floor),
            });
        }
        if !(self.battery_floor..=100.0).contains(&self.initial.battery) {
            return Err(ConfigError::Invalid {
                field: "initial.battery",
                reason: format!(
                    "expected [{}, 100] (battery_floor to full), got {}",
                    self.battery_floor, self.initial.battery
                ),
            });
        }

        for (field, range) in [
            ("limits.speed", self.limits.speed),
            ("limits.altitude", self.limits.altitude),
            ("detection.smoke.confidence", self.detection.smoke.confidence),
            ("detection.fire.confidence", self.detection.fire.confidence),
            ("detection.vehicle.confidence", self.detection.vehicle.confidence),
            ("detection.x", self.detection.x),
            ("detection.y", self.detection.y),
        ] {
            if !range.is_valid() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("expected finite min <= max, got [{}, {}]", range.min, range.max),
                });
            }
        }

        for (field, walk) in [
            ("noise.altitude", &self.noise.altitude),
            ("noise.speed", &self.noise.speed),
            ("noise.temperature", &self.noise.temperature),
            ("noise.humidity", &self.noise.humidity),
        ] {
            let finite = [walk.center, walk.spread, walk.min, walk.max]
                .iter()
                .all(|v| v.is_finite());
            if !(finite && walk.min <= walk.max && walk.spread >= 0.0 && (0.0..=1.0).contains(&walk.reversion)) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "expected finite values, min <= max, spread >= 0 and reversion in [0, 1]"
                        .to_string(),
                });
            }
        }
        let gps = self.noise.gps;
        if !(gps.baseline.is_finite() && gps.spread.is_finite() && gps.spread >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "noise.gps",
                reason: format!(
                    "expected a finite baseline and non-negative spread, got {} and {}",
                    gps.baseline, gps.spread
                ),
            });
        }

        Ok(())
    }
}

/// Load the simulation config from `config/simulation.*` and `FOREST_WATCH__*` env vars.
pub fn load_simulation_config() -> anyhow::Result<SimulationConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/simulation").required(false))
        .add_source(
            config::Environment::with_prefix("FOREST_WATCH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: SimulationConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> SimulationConfig {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history_window_size, 20);
        assert_eq!(config.alert_retention_cap, 10);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = from_toml(
            r#"
            tick_interval_ms = 100
            fire_probability = 1.0
            seed = 7

            [limits.speed]
            min = 1.0
            max = 20.0
            "#,
        );

        assert_eq!(config.tick_interval_ms, 100);
        assert_eq!(config.fire_probability, 1.0);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.limits.speed, Range::new(1.0, 20.0));
        assert_eq!(config.limits.altitude, Range::new(50.0, 300.0));
        assert_eq!(config.alert_interval_ms, 5000);
        assert_eq!(config.detection.interval_ms, 2000);
        assert!(!config.detection.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = SimulationConfig {
            history_window_size: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero {
                field: "history_window_size"
            })
        );

        let config = SimulationConfig {
            alert_probability: 1.5,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Probability {
                field: "alert_probability",
                ..
            })
        ));

        let config = SimulationConfig {
            battery_floor: 120.0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    fn invalid_field(config: &SimulationConfig) -> Option<&'static str> {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_rejects_non_finite_noise() {
        let mut config = SimulationConfig::default();
        config.noise.gps.spread = f64::INFINITY;
        assert_eq!(invalid_field(&config), Some("noise.gps"));

        let mut config = SimulationConfig::default();
        config.noise.gps.baseline = f64::NAN;
        assert_eq!(invalid_field(&config), Some("noise.gps"));

        let mut config = SimulationConfig::default();
        config.noise.altitude.spread = f64::INFINITY;
        assert_eq!(invalid_field(&config), Some("noise.altitude"));

        let mut config = SimulationConfig::default();
        config.noise.humidity.center = f64::NAN;
        assert_eq!(invalid_field(&config), Some("noise.humidity"));

        let mut config = SimulationConfig::default();
        config.noise.temperature.max = f64::INFINITY;
        assert_eq!(invalid_field(&config), Some("noise.temperature"));
    }

    #[test]
    fn test_rejects_initial_battery_below_floor() {
        let config = SimulationConfig {
            battery_floor: 30.0,
            initial: InitialVehicle {
                battery: 20.0,
                ..InitialVehicle::default()
            },
            ..SimulationConfig::default()
        };
        assert_eq!(invalid_field(&config), Some("initial.battery"));

        let config = SimulationConfig {
            battery_floor: 20.0,
            initial: InitialVehicle {
                battery: 20.0,
                ..InitialVehicle::default()
            },
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_detection_settings() {
        let mut config = SimulationConfig::default();
        config.detection.fire.probability = 1.2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Probability {
                field: "detection.fire.probability",
                ..
            })
        ));

        let mut config = SimulationConfig::default();
        config.detection.smoke.confidence = Range::new(95.0, 85.0);
        assert_eq!(invalid_field(&config), Some("detection.smoke.confidence"));

        let mut config = SimulationConfig::default();
        config.detection.interval_ms = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero {
                field: "detection.interval_ms"
            })
        );
    }

    #[test]
    fn test_range_contains_rejects_nan() {
        let range = Range::new(5.0, 50.0);
        assert!(range.contains(5.0));
        assert!(range.contains(50.0));
        assert!(!range.contains(50.1));
        assert!(!range.contains(f64::NAN));
    }
}

// Command domain model - vehicle command intents and their rejections
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::vehicle::VehicleStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCommand {
    Takeoff,
    Land,
    ReturnToHome,
    EmergencyStop,
}

impl VehicleCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCommand::Takeoff => "takeoff",
            VehicleCommand::Land => "land",
            VehicleCommand::ReturnToHome => "return_to_home",
            VehicleCommand::EmergencyStop => "emergency_stop",
        }
    }
}

impl std::fmt::Display for VehicleCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightParameter {
    Speed,
    Altitude,
}

impl std::fmt::Display for FlightParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightParameter::Speed => f.write_str("speed"),
            FlightParameter::Altitude => f.write_str("altitude"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightMode {
    #[default]
    Hover,
    Follow,
    Patrol,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandProgress {
    Executing,
    Completed,
}

/// The most recently accepted command, as shown on the control panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandRecord {
    pub command: VehicleCommand,
    pub issued_at: DateTime<Utc>,
    pub progress: CommandProgress,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("cannot {command} while vehicle is {status}")]
    InvalidTransition {
        command: VehicleCommand,
        status: VehicleStatus,
    },

    #[error("{parameter} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        parameter: FlightParameter,
        value: f64,
        min: f64,
        max: f64,
    },
}

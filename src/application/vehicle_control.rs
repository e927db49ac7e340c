// Vehicle controller - command state machine with deferred auto-transitions
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::command::{
    CommandError, CommandProgress, CommandRecord, FlightMode, FlightParameter, VehicleCommand,
};
use crate::domain::vehicle::VehicleStatus;
use crate::infrastructure::config::{FlightLimits, SimulationConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeferredKind {
    LandingComplete,
    EmergencyCleared,
    CommandCompleted,
}

/// A transition the controller wants applied later.
///
/// It only takes effect if `epoch` still matches when it comes due; any
/// superseding command bumps the epoch for its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deferred {
    pub kind: DeferredKind,
    pub epoch: u64,
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerTimings {
    pub landing_delay: Duration,
    pub emergency_hold: Duration,
    pub command_ack: Duration,
}

impl ControllerTimings {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            landing_delay: Duration::from_millis(config.landing_delay_ms),
            emergency_hold: Duration::from_millis(config.emergency_hold_ms),
            command_ack: Duration::from_millis(config.command_ack_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerView {
    pub status: VehicleStatus,
    pub flight_mode: FlightMode,
    pub speed_setting: f64,
    pub altitude_setting: f64,
    pub emergency_mode: bool,
    pub last_command: Option<CommandRecord>,
}

#[derive(Debug, Clone)]
pub struct VehicleController {
    status: VehicleStatus,
    flight_mode: FlightMode,
    speed_setting: f64,
    altitude_setting: f64,
    emergency_mode: bool,
    last_command: Option<CommandRecord>,
    limits: FlightLimits,
    timings: ControllerTimings,
    landing_epoch: u64,
    emergency_epoch: u64,
    ack_epoch: u64,
}

impl VehicleController {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            status: VehicleStatus::Connected,
            flight_mode: FlightMode::default(),
            speed_setting: config.initial.speed,
            altitude_setting: config.initial.altitude,
            emergency_mode: false,
            last_command: None,
            limits: config.limits.clone(),
            timings: ControllerTimings::from_config(config),
            landing_epoch: 0,
            emergency_epoch: 0,
            ack_epoch: 0,
        }
    }

    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    pub fn view(&self) -> ControllerView {
        ControllerView {
            status: self.status,
            flight_mode: self.flight_mode,
            speed_setting: self.speed_setting,
            altitude_setting: self.altitude_setting,
            emergency_mode: self.emergency_mode,
            last_command: self.last_command.clone(),
        }
    }

    /// Apply a command. Rejected commands leave every field untouched.
    pub fn issue(
        &mut self,
        command: VehicleCommand,
        now: DateTime<Utc>,
    ) -> Result<Vec<Deferred>, CommandError> {
        let allowed = match command {
            VehicleCommand::Takeoff => self.status == VehicleStatus::Connected,
            VehicleCommand::Land | VehicleCommand::ReturnToHome => {
                self.status == VehicleStatus::Flying
            }
            VehicleCommand::EmergencyStop => self.status != VehicleStatus::Disconnected,
        };
        if !allowed {
            return Err(CommandError::InvalidTransition {
                command,
                status: self.status,
            });
        }

        let mut follow_ups = Vec::with_capacity(2);
        match command {
            VehicleCommand::Takeoff => {
                self.status = VehicleStatus::Flying;
            }
            VehicleCommand::Land => {
                self.status = VehicleStatus::Landing;
                self.landing_epoch += 1;
                follow_ups.push(Deferred {
                    kind: DeferredKind::LandingComplete,
                    epoch: self.landing_epoch,
                    delay: self.timings.landing_delay,
                });
            }
            VehicleCommand::ReturnToHome => {
                self.flight_mode = FlightMode::Return;
            }
            VehicleCommand::EmergencyStop => {
                self.status = VehicleStatus::Connected;
                self.landing_epoch += 1;
                self.emergency_mode = true;
                self.emergency_epoch += 1;
                follow_ups.push(Deferred {
                    kind: DeferredKind::EmergencyCleared,
                    epoch: self.emergency_epoch,
                    delay: self.timings.emergency_hold,
                });
            }
        }

        self.ack_epoch += 1;
        self.last_command = Some(CommandRecord {
            command,
            issued_at: now,
            progress: CommandProgress::Executing,
        });
        follow_ups.push(Deferred {
            kind: DeferredKind::CommandCompleted,
            epoch: self.ack_epoch,
            delay: self.timings.command_ack,
        });

        Ok(follow_ups)
    }

    /// Apply a deferred transition if nothing has superseded it.
    pub fn complete(&mut self, deferred: &Deferred) -> bool {
        match deferred.kind {
            DeferredKind::LandingComplete => {
                if deferred.epoch != self.landing_epoch || self.status != VehicleStatus::Landing {
                    return false;
                }
                self.status = VehicleStatus::Connected;
            }
            DeferredKind::EmergencyCleared => {
                if deferred.epoch != self.emergency_epoch || !self.emergency_mode {
                    return false;
                }
                self.emergency_mode = false;
            }
            DeferredKind::CommandCompleted => {
                if deferred.epoch != self.ack_epoch {
                    return false;
                }
                match self.last_command.as_mut() {
                    Some(record) => record.progress = CommandProgress::Completed,
                    None => return false,
                }
            }
        }
        true
    }

    pub fn set_flight_parameter(
        &mut self,
        parameter: FlightParameter,
        value: f64,
    ) -> Result<f64, CommandError> {
        let range = match parameter {
            FlightParameter::Speed => self.limits.speed,
            FlightParameter::Altitude => self.limits.altitude,
        };
        if !range.contains(value) {
            return Err(CommandError::OutOfRange {
                parameter,
                value,
                min: range.min,
                max: range.max,
            });
        }

        match parameter {
            FlightParameter::Speed => self.speed_setting = value,
            FlightParameter::Altitude => self.altitude_setting = value,
        }
        Ok(value)
    }

    pub fn set_flight_mode(&mut self, mode: FlightMode) {
        self.flight_mode = mode;
    }

    /// Record the link going up or down. Losing the link cancels a pending landing.
    pub fn set_link(&mut self, connected: bool) -> bool {
        match (connected, self.status) {
            (false, VehicleStatus::Disconnected) | (true, VehicleStatus::Connected) => false,
            (false, _) => {
                self.status = VehicleStatus::Disconnected;
                self.landing_epoch += 1;
                true
            }
            (true, VehicleStatus::Disconnected) => {
                self.status = VehicleStatus::Connected;
                true
            }
            (true, _) => false,
        }
    }
}

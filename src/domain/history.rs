// History domain model - trend samples for charting
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::vehicle::VehicleState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySample {
    pub tick: u64,
    pub time: DateTime<Utc>,
    pub battery: f64,
    pub altitude: f64,
    pub temperature: f64,
    pub humidity: f64,
}

impl HistorySample {
    pub fn from_state(state: &VehicleState, time: DateTime<Utc>) -> Self {
        Self {
            tick: state.tick,
            time,
            battery: state.battery,
            altitude: state.altitude,
            temperature: state.temperature,
            humidity: state.humidity,
        }
    }
}

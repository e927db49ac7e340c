// Event detector - per-tick Bernoulli trials for fire and informational alerts
use rand::Rng;
use rand::RngCore;
use rand::seq::SliceRandom;

use crate::domain::alert::{AlertDraft, AlertKind};
use crate::domain::vehicle::VehicleState;

const ALERT_KINDS: [AlertKind; 3] = [AlertKind::Info, AlertKind::Warning, AlertKind::Error];

const ALERT_MESSAGES: [&str; 5] = [
    "Possible smoke detected, confirming",
    "Strong wind, fly with caution",
    "Minor GPS signal fluctuation",
    "Camera autofocus complete",
    "Entered preset patrol area",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub fire_detected: bool,
    pub new_alerts: Vec<AlertDraft>,
}

#[derive(Debug, Clone)]
pub struct EventDetector {
    fire_probability: f64,
    alert_probability: f64,
}

impl EventDetector {
    pub fn new(fire_probability: f64, alert_probability: f64) -> Self {
        Self {
            fire_probability: fire_probability.clamp(0.0, 1.0),
            alert_probability: alert_probability.clamp(0.0, 1.0),
        }
    }

    /// Run both trials against the current state.
    ///
    /// The fire trial is skipped while a fire condition is already active so
    /// that at most one can be raised at a time.
    pub fn detect(&self, _state: &VehicleState, fire_active: bool, rng: &mut dyn RngCore) -> Detection {
        Detection {
            fire_detected: !fire_active && self.fire_trial(&mut *rng),
            new_alerts: self.alert_trial(&mut *rng).into_iter().collect(),
        }
    }

    pub fn fire_trial(&self, rng: &mut dyn RngCore) -> bool {
        rng.gen_bool(self.fire_probability)
    }

    pub fn alert_trial(&self, rng: &mut dyn RngCore) -> Option<AlertDraft> {
        if !rng.gen_bool(self.alert_probability) {
            return None;
        }

        let kind = *ALERT_KINDS.choose(&mut *rng)?;
        let message = *ALERT_MESSAGES.choose(&mut *rng)?;
        Some(AlertDraft::new(kind, message))
    }
}

/// Alert appended when a fire is detected.
pub fn fire_alert(location: &str) -> AlertDraft {
    AlertDraft::new(
        AlertKind::Error,
        format!("Forest fire detected at {}", location),
    )
}

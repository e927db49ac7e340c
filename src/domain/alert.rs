// Alert domain model - per-alert entries and the global alert level
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub u64);

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: AlertId,
    pub time: DateTime<Utc>,
    pub kind: AlertKind,
    pub message: String,
    pub resolved: bool,
}

/// An alert that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub kind: AlertKind,
    pub message: String,
}

impl AlertDraft {
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Coarse whole-screen severity, independent of the alert list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    #[default]
    Normal,
    Warning,
    Danger,
    Emergency,
}

impl AlertLevel {
    pub fn headline(&self) -> &'static str {
        match self {
            AlertLevel::Normal => "All systems nominal",
            AlertLevel::Warning => "Abnormal temperature rise",
            AlertLevel::Danger => "Hazard zone alert",
            AlertLevel::Emergency => "Forest fire emergency",
        }
    }

    pub fn description(&self, fire_location: &str) -> String {
        match self {
            AlertLevel::Normal => "No abnormal conditions detected".to_string(),
            AlertLevel::Warning => {
                "Temperature in the monitored area is rising, increase patrol coverage".to_string()
            }
            AlertLevel::Danger => {
                "Suspicious heat source found, dispatch a drone for close reconnaissance"
                    .to_string()
            }
            AlertLevel::Emergency => format!(
                "Forest fire detected, start the emergency response. Location: {}",
                fire_location
            ),
        }
    }
}

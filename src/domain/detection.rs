// Detection domain model - objects picked out of the camera feed
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Smoke,
    Fire,
    Vehicle,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 3] = [ObjectKind::Smoke, ObjectKind::Fire, ObjectKind::Vehicle];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Smoke => "smoke",
            ObjectKind::Fire => "fire",
            ObjectKind::Vehicle => "vehicle",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bounding-box marker. `x` and `y` are percentages of the frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedObject {
    pub kind: ObjectKind,
    pub confidence: f64,
    pub x: f64,
    pub y: f64,
}

/// What the detection overlay currently shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionView {
    pub enabled: bool,
    pub objects: Vec<DetectedObject>,
}

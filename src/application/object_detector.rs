// Object detector - synthetic camera overlay with one independent trial per object class
use rand::Rng;
use rand::RngCore;

use crate::domain::detection::{DetectedObject, ObjectKind};
use crate::infrastructure::config::{DetectionConfig, ObjectTrial, Range};

#[derive(Debug, Clone)]
pub struct ObjectDetector {
    config: DetectionConfig,
}

impl ObjectDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn trial(&self, kind: ObjectKind) -> &ObjectTrial {
        match kind {
            ObjectKind::Smoke => &self.config.smoke,
            ObjectKind::Fire => &self.config.fire,
            ObjectKind::Vehicle => &self.config.vehicle,
        }
    }

    /// One scan of the frame. Each class appears at most once, in
    /// smoke, fire, vehicle order.
    pub fn scan(&self, rng: &mut dyn RngCore) -> Vec<DetectedObject> {
        let mut objects = Vec::new();
        for kind in ObjectKind::ALL {
            let trial = self.trial(kind);
            if !rng.gen_bool(trial.probability.clamp(0.0, 1.0)) {
                continue;
            }
            objects.push(DetectedObject {
                kind,
                confidence: sample(&trial.confidence, &mut *rng),
                x: sample(&self.config.x, &mut *rng),
                y: sample(&self.config.y, &mut *rng),
            });
        }
        objects
    }
}

fn sample(range: &Range, rng: &mut dyn RngCore) -> f64 {
    if range.max > range.min {
        rng.gen_range(range.min..=range.max)
    } else {
        range.min
    }
}

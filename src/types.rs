use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub piste: PisteConfig,
    pub tracking: TrackingConfig,
    pub framing: FramingConfig,
    pub io: IoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PisteConfig {
    /// Physical piste length in meters (regulation: 14m)
    pub length_m: f32,
    /// Optional initial piste area [x1, y1, x2, y2] in pixels.
    /// When absent the pipeline waits for an area from the control surface.
    pub area: Option<[f32; 4]>,
    /// Pixel tolerance for a detection to count as "on" a guard line
    pub line_tolerance_px: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Max centroid distance to match a detection to a track
    pub max_tracking_distance: f32,
    /// Consecutive unmatched frames before the loss policy triggers
    pub dropout_tolerance: u32,
    pub loss_policy: LossPolicy,
    /// Minimum horizontal separation kept between the two fencers while tracking
    pub min_separation_px: f32,
    /// Minimum horizontal separation required between the two candidates at lock time
    pub min_initial_separation_px: f32,
}

/// What happens to the session once a track stays unmatched past tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossPolicy {
    /// Hold the last known position, flag the track as lost, keep the session alive
    Freeze,
    /// Clear the session and require both fencers to lock again
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramingConfig {
    /// Padding around the enclosing box, as a ratio of its own size per side
    pub margin_ratio: f32,
    /// Exponential smoothing factor in (0, 1]; 1.0 disables smoothing
    pub smoothing_alpha: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoConfig {
    pub detections_path: String,
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            piste: PisteConfig {
                length_m: 14.0,
                area: None,
                line_tolerance_px: 20.0,
            },
            tracking: TrackingConfig {
                max_tracking_distance: 100.0,
                dropout_tolerance: 30, // 1 second @ 30fps
                loss_policy: LossPolicy::Reset,
                min_separation_px: 50.0,
                min_initial_separation_px: 80.0,
            },
            framing: FramingConfig {
                margin_ratio: 0.10,
                smoothing_alpha: 0.30,
            },
            io: IoConfig {
                detections_path: "data/detections.jsonl".to_string(),
                output_dir: "output".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

/// Axis-aligned pixel bounding box, x2 > x1 and y2 > y1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) * 0.5, (self.y1 + self.y2) * 0.5)
    }

    pub fn center_x(&self) -> f32 {
        (self.x1 + self.x2) * 0.5
    }

    /// Minimal box enclosing both `self` and `other`
    pub fn enclosing(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }
}

/// One raw person detection for a single frame. No identity attached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl Detection {
    pub fn centroid(&self) -> (f32, f32) {
        self.bbox.center()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclosing_box() {
        let a = BoundingBox::new(10.0, 10.0, 50.0, 80.0);
        let b = BoundingBox::new(40.0, 0.0, 120.0, 60.0);
        let e = a.enclosing(&b);
        assert_eq!(e, BoundingBox::new(10.0, 0.0, 120.0, 80.0));
    }

    #[test]
    fn test_centroid() {
        let d = Detection {
            bbox: BoundingBox::new(100.0, 0.0, 200.0, 50.0),
            confidence: 0.9,
        };
        assert_eq!(d.centroid(), (150.0, 25.0));
    }

    #[test]
    fn test_loss_policy_from_yaml() {
        let policy: LossPolicy = serde_yaml::from_str("freeze").unwrap();
        assert_eq!(policy, LossPolicy::Freeze);
        let policy: LossPolicy = serde_yaml::from_str("reset").unwrap();
        assert_eq!(policy, LossPolicy::Reset);
    }
}

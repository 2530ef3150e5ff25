// src/tracking/framing.rs
//
// Auto-framing for the broadcast crop: the minimal box around both fencers,
// padded for composition, then exponentially smoothed against the previous
// output so small lunges and bounces do not shake the virtual camera.

use crate::tracking::types::{FencerId, TrackingSession};
use crate::types::{BoundingBox, FramingConfig};

pub struct FrameAggregator {
    margin_ratio: f32,
    alpha: f32,
    previous: Option<BoundingBox>,
}

impl FrameAggregator {
    pub fn new(config: &FramingConfig) -> Self {
        Self {
            margin_ratio: config.margin_ratio,
            // Alpha outside (0, 1] would stall or overshoot the blend
            alpha: config.smoothing_alpha.clamp(f32::EPSILON, 1.0),
            previous: None,
        }
    }

    /// Smoothed framing box covering both fencers, or `None` until the pair
    /// is tracked. The first frame after (re)initialization is unsmoothed.
    pub fn compute(&mut self, session: &TrackingSession) -> Option<BoundingBox> {
        let near = session.fencer(FencerId::Near)?;
        let far = session.fencer(FencerId::Far)?;

        let enclosing = near.bbox.enclosing(&far.bbox);
        let margin_x = enclosing.width() * self.margin_ratio;
        let margin_y = enclosing.height() * self.margin_ratio;
        let raw = BoundingBox::new(
            (enclosing.x1 - margin_x).max(0.0),
            (enclosing.y1 - margin_y).max(0.0),
            enclosing.x2 + margin_x,
            enclosing.y2 + margin_y,
        );

        let smoothed = match self.previous {
            None => raw,
            Some(prev) => BoundingBox::new(
                blend(self.alpha, raw.x1, prev.x1),
                blend(self.alpha, raw.y1, prev.y1),
                blend(self.alpha, raw.x2, prev.x2),
                blend(self.alpha, raw.y2, prev.y2),
            ),
        };

        self.previous = Some(smoothed);
        Some(smoothed)
    }

    /// Drop the smoothing history (piste redefined, session reset).
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

fn blend(alpha: f32, raw: f32, prev: f32) -> f32 {
    alpha * raw + (1.0 - alpha) * prev
}

// src/tracking/assigner.rs
//
// Geometric identity assignment. While the session is uninitialized, each
// frame's detections are partitioned against the calibrated guard lines:
// centroids on the near side of the near line are near candidates, centroids
// on the far side of the far line are far candidates. A fencer coming on
// guard stands on the line itself, so each line's tolerance band counts
// toward its side; anything between the two bands is mid-piste and never
// seeds a track. One candidate per side is selected and the pair is locked
// in a single frame, no multi-frame accumulation.

use crate::calibration::PisteCalibration;
use crate::tracking::types::{FencerId, TrackedFencer};
use crate::types::Detection;
use std::cmp::Ordering;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct AssignerConfig {
    /// Minimum horizontal distance between the two chosen candidates;
    /// closer pairs are treated as not ready
    pub min_initial_separation: f32,
}

impl Default for AssignerConfig {
    fn default() -> Self {
        Self {
            min_initial_separation: 80.0,
        }
    }
}

pub struct IdentityAssigner {
    config: AssignerConfig,
}

impl IdentityAssigner {
    pub fn new(config: AssignerConfig) -> Self {
        Self { config }
    }

    /// Attempt the one-shot lock. Returns `None` while either side has no
    /// candidate — an expected steady state, not an error.
    pub fn try_initialize(
        &self,
        detections: &[Detection],
        calibration: &PisteCalibration,
    ) -> Option<(TrackedFencer, TrackedFencer)> {
        let lines = calibration.current_positions();
        let near_bound = lines.near_x + calibration.line_tolerance_px();
        let far_bound = lines.far_x - calibration.line_tolerance_px();

        let mut near_candidates: Vec<&Detection> = Vec::new();
        let mut far_candidates: Vec<&Detection> = Vec::new();
        for detection in detections {
            let (cx, _) = detection.centroid();
            if cx < near_bound {
                near_candidates.push(detection);
            } else if cx > far_bound {
                far_candidates.push(detection);
            }
            // Between the bands: neither near nor far, never seeds a track
        }

        if near_candidates.is_empty() || far_candidates.is_empty() {
            debug!(
                "Lock not ready: {} near-side, {} far-side candidate(s)",
                near_candidates.len(),
                far_candidates.len()
            );
            return None;
        }

        let near = select_candidate(&near_candidates, FencerId::Near);
        let far = select_candidate(&far_candidates, FencerId::Far);

        let near_cx = near.bbox.center_x();
        let far_cx = far.bbox.center_x();
        let separation = (far_cx - near_cx).abs();
        if separation < self.config.min_initial_separation {
            debug!(
                "Lock not ready: candidates only {:.0}px apart (min {:.0}px)",
                separation, self.config.min_initial_separation
            );
            return None;
        }

        info!(
            "🤺 Fencers locked: near at x={:.0}, far at x={:.0} ({:.0}px apart)",
            near_cx, far_cx, separation
        );

        Some((
            TrackedFencer::new(FencerId::Near, near.bbox),
            TrackedFencer::new(FencerId::Far, far.bbox),
        ))
    }
}

/// Pick one candidate per side: highest confidence, then larger box, then
/// the outermost centroid for the side. Total order, so the result does not
/// depend on detection input order.
fn select_candidate<'a>(candidates: &[&'a Detection], side: FencerId) -> &'a Detection {
    candidates
        .iter()
        .copied()
        .max_by(|a, b| compare_candidates(a, b, side))
        .expect("candidate list checked non-empty")
}

fn compare_candidates(a: &Detection, b: &Detection, side: FencerId) -> Ordering {
    a.confidence
        .total_cmp(&b.confidence)
        .then_with(|| a.bbox.area().total_cmp(&b.bbox.area()))
        .then_with(|| match side {
            // Leftmost wins on the near side, rightmost on the far side
            FencerId::Near => b.bbox.center_x().total_cmp(&a.bbox.center_x()),
            FencerId::Far => a.bbox.center_x().total_cmp(&b.bbox.center_x()),
        })
}

// src/tracking/validator.rs
//
// Guard line compliance. Every frame, independently of the tracker, the raw
// detections are scanned for whoever is actually standing on each guard
// line; that detection is then compared against the tracked box for the
// matching identity via IoU. A tracked box coasting on a stale position
// while the real fencer walked off the line fails this check even though
// the tracker still reports it alive.

use crate::calibration::{LineId, PisteCalibration};
use crate::tracking::types::{FencerId, TrackingSession, ValidationResult};
use crate::types::{BoundingBox, Detection};

/// Minimum overlap for a tracked box and an on-line detection to count as
/// the same physical fencer.
const ON_GUARD_MIN_IOU: f32 = 0.5;

/// Intersection-over-union of two boxes. Zero when disjoint; the union is
/// always computed from the actual areas, never short-circuited.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);
    let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);

    let union = a.area() + b.area() - intersection;
    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[derive(Default)]
pub struct GuardLineValidator;

impl GuardLineValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(
        &self,
        session: &TrackingSession,
        detections: &[Detection],
        calibration: &PisteCalibration,
    ) -> ValidationResult {
        if !session.initialized {
            return ValidationResult::not_ready("Fencers not locked yet");
        }

        let near_on_guard = self.identity_on_guard(
            session,
            FencerId::Near,
            LineId::Near,
            detections,
            calibration,
        );
        let far_on_guard =
            self.identity_on_guard(session, FencerId::Far, LineId::Far, detections, calibration);

        let status = match (near_on_guard, far_on_guard) {
            (true, true) => "Both fencers on guard lines - ready",
            (true, false) => "Near fencer on guard line, far fencer off",
            (false, true) => "Far fencer on guard line, near fencer off",
            (false, false) => "Neither fencer on their guard line",
        };

        ValidationResult::new(near_on_guard, far_on_guard, status)
    }

    /// One side: find the detection standing on the line (nearest within
    /// the tolerance band), then require it to be the tracked fencer.
    fn identity_on_guard(
        &self,
        session: &TrackingSession,
        identity: FencerId,
        line: LineId,
        detections: &[Detection],
        calibration: &PisteCalibration,
    ) -> bool {
        let Some(track) = session.fencer(identity) else {
            return false;
        };
        let Some(on_line) = best_on_line(detections, line, calibration) else {
            // Nobody on the line this frame: expected while fencers move
            return false;
        };
        iou(&track.bbox, &on_line.bbox) >= ON_GUARD_MIN_IOU
    }
}

fn best_on_line<'a>(
    detections: &'a [Detection],
    line: LineId,
    calibration: &PisteCalibration,
) -> Option<&'a Detection> {
    detections
        .iter()
        .filter(|d| calibration.on_line(line, d.bbox.center_x()))
        .min_by(|a, b| {
            calibration
                .distance_to_line(line, a.bbox.center_x())
                .total_cmp(&calibration.distance_to_line(line, b.bbox.center_x()))
        })
}

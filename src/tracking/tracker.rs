// src/tracking/tracker.rs
//
// Frame-to-frame track maintenance for the locked pair. Matching is greedy
// nearest-centroid: all (identity, detection) pairs within the distance gate
// are ranked by distance and consumed nearest-first, each detection at most
// once. Unmatched tracks hold their last known position until the dropout
// tolerance runs out, then the configured loss policy decides between
// freezing in place and resetting the whole session.

use crate::tracking::types::{FencerId, TrackingSession};
use crate::types::{Detection, LossPolicy};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub max_tracking_distance: f32,
    pub dropout_tolerance: u32,
    pub loss_policy: LossPolicy,
    pub min_separation: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_tracking_distance: 100.0,
            dropout_tolerance: 30,
            loss_policy: LossPolicy::Reset,
            min_separation: 50.0,
        }
    }
}

pub struct TrackMaintainer {
    config: TrackerConfig,
}

/// Outcome of one maintenance pass, surfaced so callers never have to
/// infer a loss from session state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackUpdate {
    Tracking,
    /// A track ran past the dropout tolerance and was frozen in place
    Frozen(FencerId),
    /// A track ran past the dropout tolerance and the session was reset
    SessionReset(FencerId),
}

const IDENTITIES: [FencerId; 2] = [FencerId::Near, FencerId::Far];

impl TrackMaintainer {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    pub fn update(&self, session: &mut TrackingSession, detections: &[Detection]) -> TrackUpdate {
        // Rank all candidate pairs nearest-first. Pairs are generated Near
        // before Far and the sort is stable, so exact distance ties resolve
        // to the near identity deterministically.
        let mut pairs: Vec<(usize, usize, f32)> = Vec::new();
        for (ii, id) in IDENTITIES.iter().enumerate() {
            let Some(track) = session.fencer(*id) else {
                continue;
            };
            for (di, detection) in detections.iter().enumerate() {
                let (cx, cy) = detection.centroid();
                let dist = ((track.centroid.0 - cx).powi(2) + (track.centroid.1 - cy).powi(2))
                    .sqrt();
                if dist <= self.config.max_tracking_distance {
                    pairs.push((ii, di, dist));
                }
            }
        }
        pairs.sort_by(|a, b| a.2.total_cmp(&b.2));

        let mut detection_used = vec![false; detections.len()];
        let mut matched: [Option<usize>; 2] = [None, None];
        for (ii, di, dist) in pairs {
            if matched[ii].is_some() || detection_used[di] {
                continue;
            }

            // Keep the pair physically apart: a match that would pull this
            // fencer within the separation guard of the other is treated as
            // a mis-detection and skipped.
            let other = IDENTITIES[1 - ii];
            if let Some(other_track) = session.fencer(other) {
                let separation = (detections[di].bbox.center_x() - other_track.centroid.0).abs();
                if separation < self.config.min_separation {
                    debug!(
                        "{} match at {:.0}px rejected: would leave {:.0}px separation (min {:.0})",
                        IDENTITIES[ii].as_str(),
                        dist,
                        separation,
                        self.config.min_separation
                    );
                    continue;
                }
            }

            matched[ii] = Some(di);
            detection_used[di] = true;
        }

        let mut outcome = TrackUpdate::Tracking;
        for (ii, id) in IDENTITIES.iter().enumerate() {
            let Some(track) = session.fencer_mut(*id) else {
                continue;
            };
            match matched[ii] {
                Some(di) => track.apply_match(detections[di].bbox),
                None => {
                    track.mark_missed();
                    if track.frames_since_last_match > self.config.dropout_tolerance {
                        match self.config.loss_policy {
                            LossPolicy::Freeze => {
                                if !track.lost {
                                    warn!(
                                        "{} fencer unmatched for {} frames - freezing at last position",
                                        id.as_str(),
                                        track.frames_since_last_match
                                    );
                                    track.lost = true;
                                    outcome = TrackUpdate::Frozen(*id);
                                }
                            }
                            LossPolicy::Reset => {
                                outcome = TrackUpdate::SessionReset(*id);
                            }
                        }
                    }
                }
            }
        }

        if let TrackUpdate::SessionReset(id) = outcome {
            warn!(
                "{} fencer unmatched beyond tolerance ({} frames) - resetting session",
                id.as_str(),
                self.config.dropout_tolerance
            );
            session.reset();
        }

        outcome
    }
}

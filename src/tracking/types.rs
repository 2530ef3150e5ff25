// src/tracking/types.rs
use crate::types::BoundingBox;
use serde::Serialize;

/// Fixed role label for a tracked fencer, assigned once at lock time and
/// never reassigned while the track is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FencerId {
    Near,
    Far,
}

impl FencerId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Near => "near",
            Self::Far => "far",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrackedFencer {
    pub identity: FencerId,
    pub bbox: BoundingBox,
    pub centroid: (f32, f32),
    /// Frames since this track was created, matched or not
    pub frames_alive: u32,
    /// Consecutive frames without a matching detection
    pub frames_since_last_match: u32,
    /// Set once the dropout tolerance is exceeded under the freeze policy
    pub lost: bool,
}

impl TrackedFencer {
    pub fn new(identity: FencerId, bbox: BoundingBox) -> Self {
        Self {
            identity,
            bbox,
            centroid: bbox.center(),
            frames_alive: 0,
            frames_since_last_match: 0,
            lost: false,
        }
    }

    /// Apply a matched detection: new position, miss counter cleared.
    /// A lost track that matches again is re-acquired.
    pub fn apply_match(&mut self, bbox: BoundingBox) {
        self.bbox = bbox;
        self.centroid = bbox.center();
        self.frames_since_last_match = 0;
        self.frames_alive += 1;
        self.lost = false;
    }

    /// No matching detection this frame: hold the last known position.
    pub fn mark_missed(&mut self) {
        self.frames_since_last_match += 1;
        self.frames_alive += 1;
    }
}

/// Process-wide state for the pair of fencers. Starts uninitialized and
/// becomes initialized exactly when both identities are assigned at once.
#[derive(Debug, Clone, Default)]
pub struct TrackingSession {
    pub initialized: bool,
    near: Option<TrackedFencer>,
    far: Option<TrackedFencer>,
}

impl TrackingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-shot transition into the tracking phase. Locking an already
    /// initialized session means the caller's state machine is broken.
    pub fn lock(&mut self, near: TrackedFencer, far: TrackedFencer) {
        assert!(!self.initialized, "session locked twice without a reset");
        assert!(near.identity == FencerId::Near && far.identity == FencerId::Far);
        self.near = Some(near);
        self.far = Some(far);
        self.initialized = true;
    }

    /// Back to the uninitialized state; identity assignment starts over.
    pub fn reset(&mut self) {
        self.initialized = false;
        self.near = None;
        self.far = None;
    }

    pub fn fencer(&self, id: FencerId) -> Option<&TrackedFencer> {
        match id {
            FencerId::Near => self.near.as_ref(),
            FencerId::Far => self.far.as_ref(),
        }
    }

    pub fn fencer_mut(&mut self, id: FencerId) -> Option<&mut TrackedFencer> {
        match id {
            FencerId::Near => self.near.as_mut(),
            FencerId::Far => self.far.as_mut(),
        }
    }

    pub fn fencers(&self) -> impl Iterator<Item = &TrackedFencer> {
        self.near.iter().chain(self.far.iter())
    }

    /// True once either track has gone unmatched past the given tolerance.
    pub fn any_lost_beyond(&self, tolerance: u32) -> bool {
        self.fencers()
            .any(|f| f.frames_since_last_match > tolerance)
    }
}

/// Per-frame guard line compliance, recomputed from raw detections.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub near_on_guard: bool,
    pub far_on_guard: bool,
    pub both_on_guard: bool,
    pub status: String,
}

impl ValidationResult {
    pub fn new(near_on_guard: bool, far_on_guard: bool, status: impl Into<String>) -> Self {
        Self {
            near_on_guard,
            far_on_guard,
            both_on_guard: near_on_guard && far_on_guard,
            status: status.into(),
        }
    }

    pub fn not_ready(status: impl Into<String>) -> Self {
        Self::new(false, false, status)
    }
}

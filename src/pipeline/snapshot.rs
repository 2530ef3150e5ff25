// src/pipeline/snapshot.rs
//
// Read-only per-frame export for the control surface and stream overlay.
// The core does not care whether this is persisted, displayed or dropped.

use crate::tracking::{TrackedFencer, ValidationResult};
use crate::types::BoundingBox;
use serde::Serialize;

/// Coarse bout phase, derived from pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoutPhase {
    /// No piste area defined yet
    AwaitingCalibration,
    /// Calibrated, waiting for both fencers to take their guard lines
    AwaitingFencers,
    /// Pair locked and tracked
    BoutActive,
}

impl BoutPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingCalibration => "awaiting_calibration",
            Self::AwaitingFencers => "awaiting_fencers",
            Self::BoutActive => "bout_active",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub frame_id: u64,
    pub phase: BoutPhase,
    pub initialized: bool,
    pub near: Option<TrackedFencer>,
    pub far: Option<TrackedFencer>,
    pub validation: Option<ValidationResult>,
    pub frame_box: Option<BoundingBox>,
}

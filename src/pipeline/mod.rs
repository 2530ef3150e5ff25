// src/pipeline/mod.rs
//
// Per-frame synchronous driver. One frame's detections run through identity
// assignment (until locked) or track maintenance (once locked), then guard
// line validation and framing, in that fixed order. The pipeline owns the
// calibration and session state; callers that parallelize acquisition with
// processing put a single lock around this struct — per-frame work is small
// and nothing here blocks.

mod metrics;
mod snapshot;

pub use metrics::{MetricsSummary, PipelineMetrics};
pub use snapshot::{BoutPhase, FrameSnapshot};

use crate::calibration::{CalibrationError, LineId, PisteCalibration};
use crate::tracking::{
    AssignerConfig, FrameAggregator, GuardLineValidator, IdentityAssigner, TrackMaintainer,
    TrackUpdate, TrackerConfig, TrackingSession,
};
use crate::types::{BoundingBox, Config, Detection};
use tracing::info;

pub struct BoutPipeline {
    calibration: Option<PisteCalibration>,
    session: TrackingSession,
    assigner: IdentityAssigner,
    maintainer: TrackMaintainer,
    validator: GuardLineValidator,
    framing: FrameAggregator,
    metrics: PipelineMetrics,
    line_tolerance_px: f32,
    frame_count: u64,
}

impl BoutPipeline {
    pub fn new(config: &Config) -> Result<Self, CalibrationError> {
        let mut pipeline = Self {
            calibration: None,
            session: TrackingSession::new(),
            assigner: IdentityAssigner::new(AssignerConfig {
                min_initial_separation: config.tracking.min_initial_separation_px,
            }),
            maintainer: TrackMaintainer::new(TrackerConfig {
                max_tracking_distance: config.tracking.max_tracking_distance,
                dropout_tolerance: config.tracking.dropout_tolerance,
                loss_policy: config.tracking.loss_policy,
                min_separation: config.tracking.min_separation_px,
            }),
            validator: GuardLineValidator::new(),
            framing: FrameAggregator::new(&config.framing),
            metrics: PipelineMetrics::new(),
            line_tolerance_px: config.piste.line_tolerance_px,
            frame_count: 0,
        };

        if let Some([x1, y1, x2, y2]) = config.piste.area {
            pipeline.set_area(BoundingBox::new(x1, y1, x2, y2), config.piste.length_m)?;
        }

        Ok(pipeline)
    }

    /// Define (or redefine) the piste area. Replacing the calibration
    /// discards the locked pair and the framing history.
    pub fn set_area(
        &mut self,
        area: BoundingBox,
        physical_length: f32,
    ) -> Result<(), CalibrationError> {
        let calibration = PisteCalibration::new(area, physical_length, self.line_tolerance_px)?;
        self.calibration = Some(calibration);
        self.session.reset();
        self.framing.reset();
        info!("Piste area set - waiting for fencers on guard lines");
        Ok(())
    }

    /// Apply a line adjustment from the control surface; effective on the
    /// next frame.
    pub fn adjust_line(
        &mut self,
        line: LineId,
        offset_px: f32,
        tilt: f32,
    ) -> Result<(), CalibrationError> {
        self.calibration
            .as_mut()
            .ok_or(CalibrationError::NotCalibrated)?
            .adjust_line(line, offset_px, tilt);
        Ok(())
    }

    pub fn reset_line(&mut self, line: LineId) -> Result<(), CalibrationError> {
        self.calibration
            .as_mut()
            .ok_or(CalibrationError::NotCalibrated)?
            .reset_line(line);
        Ok(())
    }

    pub fn phase(&self) -> BoutPhase {
        if self.calibration.is_none() {
            BoutPhase::AwaitingCalibration
        } else if !self.session.initialized {
            BoutPhase::AwaitingFencers
        } else {
            BoutPhase::BoutActive
        }
    }

    /// Run one frame's detections through the core and export the snapshot.
    pub fn process_frame(&mut self, detections: &[Detection]) -> FrameSnapshot {
        self.frame_count += 1;
        self.metrics.inc(&self.metrics.total_frames);

        let Some(calibration) = self.calibration.as_ref() else {
            return self.snapshot(None, None);
        };

        if !self.session.initialized {
            if let Some((near, far)) = self.assigner.try_initialize(detections, calibration) {
                self.session.lock(near, far);
                self.framing.reset();
                self.metrics.inc(&self.metrics.locks);
                info!("Bout active at frame {}", self.frame_count);
            }
        } else {
            match self.maintainer.update(&mut self.session, detections) {
                TrackUpdate::Tracking => {}
                TrackUpdate::Frozen(_) => self.metrics.inc(&self.metrics.tracks_frozen),
                TrackUpdate::SessionReset(_) => self.metrics.inc(&self.metrics.sessions_reset),
            }
        }

        if !self.session.initialized {
            return self.snapshot(None, None);
        }

        self.metrics.inc(&self.metrics.frames_tracking);

        let calibration = self
            .calibration
            .as_ref()
            .expect("calibration checked above");
        let validation = self
            .validator
            .validate(&self.session, detections, calibration);
        if validation.both_on_guard {
            self.metrics.inc(&self.metrics.frames_both_on_guard);
        }

        let frame_box = self.framing.compute(&self.session);
        self.snapshot(Some(validation), frame_box)
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    fn snapshot(
        &self,
        validation: Option<crate::tracking::ValidationResult>,
        frame_box: Option<BoundingBox>,
    ) -> FrameSnapshot {
        FrameSnapshot {
            frame_id: self.frame_count,
            phase: self.phase(),
            initialized: self.session.initialized,
            near: self.session.fencer(crate::tracking::FencerId::Near).copied(),
            far: self.session.fencer(crate::tracking::FencerId::Far).copied(),
            validation,
            frame_box,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LossPolicy;

    fn det(cx: f32, confidence: f32) -> Detection {
        Detection {
            bbox: BoundingBox::new(cx - 40.0, 20.0, cx + 40.0, 180.0),
            confidence,
        }
    }

    fn configured() -> Config {
        let mut config = Config::default();
        config.piste.area = Some([100.0, 0.0, 1400.0, 200.0]);
        config
    }

    #[test]
    fn test_uncalibrated_pipeline_reports_phase() {
        let mut pipeline = BoutPipeline::new(&Config::default()).unwrap();
        let snapshot = pipeline.process_frame(&[det(400.0, 0.9)]);
        assert_eq!(snapshot.phase, BoutPhase::AwaitingCalibration);
        assert!(!snapshot.initialized);
        assert!(snapshot.validation.is_none());
    }

    #[test]
    fn test_end_to_end_lock_on_first_populated_frame() {
        // 1300px piste mapped to 14m: guard lines near x=564 and x=936
        let mut pipeline = BoutPipeline::new(&configured()).unwrap();

        let empty = pipeline.process_frame(&[]);
        assert_eq!(empty.phase, BoutPhase::AwaitingFencers);

        let snapshot = pipeline.process_frame(&[det(446.0, 0.9), det(927.0, 0.9)]);
        assert_eq!(snapshot.phase, BoutPhase::BoutActive);
        assert!(snapshot.initialized);
        assert_eq!(snapshot.near.unwrap().centroid.0, 446.0);
        assert_eq!(snapshot.far.unwrap().centroid.0, 927.0);
        assert!(snapshot.frame_box.is_some());
    }

    #[test]
    fn test_lock_then_track_then_validate() {
        let mut pipeline = BoutPipeline::new(&configured()).unwrap();

        // Fencers take position close to their guard lines (564 / 936)
        pipeline.process_frame(&[det(550.0, 0.9), det(950.0, 0.9)]);
        let snapshot = pipeline.process_frame(&[det(552.0, 0.9), det(948.0, 0.9)]);

        assert_eq!(snapshot.phase, BoutPhase::BoutActive);
        let validation = snapshot.validation.unwrap();
        assert!(validation.both_on_guard, "{}", validation.status);
    }

    #[test]
    fn test_framing_follows_the_pair() {
        let mut pipeline = BoutPipeline::new(&configured()).unwrap();
        pipeline.process_frame(&[det(446.0, 0.9), det(1100.0, 0.9)]);

        let first = pipeline.process_frame(&[det(446.0, 0.9), det(1100.0, 0.9)]);
        let frame = first.frame_box.unwrap();
        assert!(frame.x1 < 446.0 - 40.0);
        assert!(frame.x2 > 1100.0 + 40.0);
    }

    #[test]
    fn test_session_reset_policy_reinitializes() {
        let mut config = configured();
        config.tracking.dropout_tolerance = 2;
        config.tracking.loss_policy = LossPolicy::Reset;
        let mut pipeline = BoutPipeline::new(&config).unwrap();

        pipeline.process_frame(&[det(446.0, 0.9), det(1100.0, 0.9)]);
        assert_eq!(pipeline.phase(), BoutPhase::BoutActive);

        // Far fencer vanishes past tolerance; session falls back to lock-up
        let mut last = None;
        for _ in 0..4 {
            last = Some(pipeline.process_frame(&[det(446.0, 0.9)]));
        }
        let snapshot = last.unwrap();
        assert_eq!(snapshot.phase, BoutPhase::AwaitingFencers);
        assert!(!snapshot.initialized);
        assert!(snapshot.near.is_none());

        // And the pair can lock again
        let relocked = pipeline.process_frame(&[det(446.0, 0.9), det(1100.0, 0.9)]);
        assert!(relocked.initialized);
    }

    #[test]
    fn test_freeze_policy_keeps_session_with_lost_flag() {
        let mut config = configured();
        config.tracking.dropout_tolerance = 2;
        config.tracking.loss_policy = LossPolicy::Freeze;
        let mut pipeline = BoutPipeline::new(&config).unwrap();

        pipeline.process_frame(&[det(446.0, 0.9), det(1100.0, 0.9)]);
        for _ in 0..4 {
            pipeline.process_frame(&[det(446.0, 0.9)]);
        }

        let snapshot = pipeline.process_frame(&[det(446.0, 0.9)]);
        assert_eq!(snapshot.phase, BoutPhase::BoutActive);
        let far = snapshot.far.unwrap();
        assert!(far.lost);
        assert_eq!(far.centroid.0, 1100.0);
    }

    #[test]
    fn test_redefining_area_resets_session() {
        let mut pipeline = BoutPipeline::new(&configured()).unwrap();
        pipeline.process_frame(&[det(446.0, 0.9), det(1100.0, 0.9)]);
        assert_eq!(pipeline.phase(), BoutPhase::BoutActive);

        pipeline
            .set_area(BoundingBox::new(50.0, 0.0, 1350.0, 250.0), 14.0)
            .unwrap();
        assert_eq!(pipeline.phase(), BoutPhase::AwaitingFencers);
        let snapshot = pipeline.process_frame(&[]);
        assert!(!snapshot.initialized);
    }

    #[test]
    fn test_adjust_line_requires_calibration() {
        let mut pipeline = BoutPipeline::new(&Config::default()).unwrap();
        assert!(matches!(
            pipeline.adjust_line(LineId::Near, 10.0, 1.0),
            Err(CalibrationError::NotCalibrated)
        ));
    }

    #[test]
    fn test_metrics_track_run() {
        let mut pipeline = BoutPipeline::new(&configured()).unwrap();
        pipeline.process_frame(&[]);
        pipeline.process_frame(&[det(550.0, 0.9), det(950.0, 0.9)]);
        pipeline.process_frame(&[det(550.0, 0.9), det(950.0, 0.9)]);

        let summary = pipeline.metrics().summary();
        assert_eq!(summary.total_frames, 3);
        assert_eq!(summary.locks, 1);
        assert_eq!(summary.frames_tracking, 2);
        assert!(summary.frames_both_on_guard >= 1);
    }
}

// src/calibration.rs
//
// Piste geometry: converts the user-selected playing-area rectangle into a
// pixels-per-meter scale and the three reference line positions (near guard
// line, center line, far guard line). Regulation proportions on a 14m piste
// put the guard lines 2m on either side of center, i.e. at 5m, 7m and 9m
// from the near end.

use crate::types::BoundingBox;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Guard lines sit at 5/14, 7/14 and 9/14 of the piste length.
const NEAR_LINE_FRACTION: f32 = 5.0 / 14.0;
const CENTER_LINE_FRACTION: f32 = 7.0 / 14.0;
const FAR_LINE_FRACTION: f32 = 9.0 / 14.0;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("piste area must have positive width and height (got {width:.0}x{height:.0})")]
    InvalidArea { width: f32, height: f32 },
    #[error("piste physical length must be positive (got {0})")]
    InvalidLength(f32),
    #[error("piste area has not been set")]
    NotCalibrated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineId {
    Near,
    Center,
    Far,
}

impl LineId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Near => "near",
            Self::Center => "center",
            Self::Far => "far",
        }
    }
}

/// Per-line runtime adjustment. Offsets are absolute, not cumulative:
/// applying the same adjustment twice yields the same line position.
#[derive(Debug, Clone, Copy)]
struct LineAdjust {
    offset_px: f32,
    tilt: f32,
}

impl Default for LineAdjust {
    fn default() -> Self {
        Self {
            offset_px: 0.0,
            tilt: 1.0,
        }
    }
}

/// Final line x-coordinates after adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinePositions {
    pub near_x: f32,
    pub center_x: f32,
    pub far_x: f32,
}

/// Calibrated piste geometry. Mutated only through explicit adjustment
/// calls; everything else is a pure function of the stored configuration.
#[derive(Debug, Clone)]
pub struct PisteCalibration {
    area: BoundingBox,
    /// Pixels per physical unit (piste width / physical length)
    scale: f32,
    base_near_x: f32,
    base_center_x: f32,
    base_far_x: f32,
    near: LineAdjust,
    center: LineAdjust,
    far: LineAdjust,
    line_tolerance_px: f32,
}

impl PisteCalibration {
    /// Calibrate from the piste area rectangle and its physical length.
    /// Nothing is committed on failure.
    pub fn new(
        area: BoundingBox,
        physical_length: f32,
        line_tolerance_px: f32,
    ) -> Result<Self, CalibrationError> {
        let width = area.x2 - area.x1;
        let height = area.y2 - area.y1;
        if width <= 0.0 || height <= 0.0 {
            return Err(CalibrationError::InvalidArea { width, height });
        }
        if physical_length <= 0.0 {
            return Err(CalibrationError::InvalidLength(physical_length));
        }

        let scale = width / physical_length;
        let calibration = Self {
            area,
            scale,
            base_near_x: area.x1 + NEAR_LINE_FRACTION * width,
            base_center_x: area.x1 + CENTER_LINE_FRACTION * width,
            base_far_x: area.x1 + FAR_LINE_FRACTION * width,
            near: LineAdjust::default(),
            center: LineAdjust::default(),
            far: LineAdjust::default(),
            line_tolerance_px,
        };

        info!(
            "Piste calibrated: {:.1} px/m, guard lines at x={:.0}/{:.0}/{:.0}",
            calibration.scale,
            calibration.base_near_x,
            calibration.base_center_x,
            calibration.base_far_x
        );

        Ok(calibration)
    }

    /// Set the offset and tilt for one line. Idempotent: values replace the
    /// stored adjustment instead of accumulating onto it.
    pub fn adjust_line(&mut self, line: LineId, offset_px: f32, tilt: f32) {
        *self.adjust_mut(line) = LineAdjust { offset_px, tilt };
        info!(
            "{} line adjusted: offset={:.0}px tilt={:.2} -> x={:.0}",
            line.as_str(),
            offset_px,
            tilt,
            self.line_x(line)
        );
    }

    /// Restore one line to its calculated position (offset 0, tilt 1).
    pub fn reset_line(&mut self, line: LineId) {
        *self.adjust_mut(line) = LineAdjust::default();
    }

    /// Line positions with adjustments applied: base + offset * tilt.
    pub fn current_positions(&self) -> LinePositions {
        LinePositions {
            near_x: self.line_x(LineId::Near),
            center_x: self.line_x(LineId::Center),
            far_x: self.line_x(LineId::Far),
        }
    }

    fn adjust_mut(&mut self, line: LineId) -> &mut LineAdjust {
        match line {
            LineId::Near => &mut self.near,
            LineId::Center => &mut self.center,
            LineId::Far => &mut self.far,
        }
    }

    pub fn line_x(&self, line: LineId) -> f32 {
        let (base, adjust) = match line {
            LineId::Near => (self.base_near_x, &self.near),
            LineId::Center => (self.base_center_x, &self.center),
            LineId::Far => (self.base_far_x, &self.far),
        };
        base + adjust.offset_px * adjust.tilt
    }

    pub fn area(&self) -> BoundingBox {
        self.area
    }

    /// Pixels per physical unit.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn line_tolerance_px(&self) -> f32 {
        self.line_tolerance_px
    }

    /// Distance from an x-coordinate to a reference line.
    pub fn distance_to_line(&self, line: LineId, x: f32) -> f32 {
        (x - self.line_x(line)).abs()
    }

    /// Whether an x-coordinate sits on a line: inside the piste bounds and
    /// within the tolerance band.
    pub fn on_line(&self, line: LineId, x: f32) -> bool {
        x >= self.area.x1
            && x <= self.area.x2
            && self.distance_to_line(line, x) <= self.line_tolerance_px
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibrate(area: BoundingBox, length: f32) -> PisteCalibration {
        PisteCalibration::new(area, length, 20.0).unwrap()
    }

    #[test]
    fn test_regulation_line_positions() {
        // 1300px wide piste mapped to 14m: 92.86 px/m, lines at 5m/7m/9m
        let cal = calibrate(BoundingBox::new(100.0, 0.0, 1400.0, 200.0), 14.0);
        assert!((cal.scale() - 1300.0 / 14.0).abs() < 0.01);

        let lines = cal.current_positions();
        assert!((lines.near_x - 564.3).abs() < 1.0);
        assert!((lines.center_x - 750.0).abs() < 1.0);
        assert!((lines.far_x - 935.7).abs() < 1.0);
    }

    #[test]
    fn test_lines_ordered_and_inside_area() {
        let area = BoundingBox::new(37.0, 12.0, 911.0, 300.0);
        let cal = calibrate(area, 14.0);
        let lines = cal.current_positions();
        assert!(area.x1 <= lines.near_x);
        assert!(lines.near_x < lines.center_x);
        assert!(lines.center_x < lines.far_x);
        assert!(lines.far_x <= area.x2);
    }

    #[test]
    fn test_lines_partition_length_at_regulation_fractions() {
        let area = BoundingBox::new(0.0, 0.0, 1400.0, 100.0);
        let cal = calibrate(area, 14.0);
        let lines = cal.current_positions();
        // 100 px/m: guard lines at the 5m and 9m marks, center at 7m
        assert!((lines.near_x - 500.0).abs() < 0.5);
        assert!((lines.center_x - 700.0).abs() < 0.5);
        assert!((lines.far_x - 900.0).abs() < 0.5);
    }

    #[test]
    fn test_invalid_area_rejected() {
        let flat = BoundingBox::new(100.0, 50.0, 100.0, 50.0);
        assert!(matches!(
            PisteCalibration::new(flat, 14.0, 20.0),
            Err(CalibrationError::InvalidArea { .. })
        ));

        let inverted = BoundingBox::new(500.0, 0.0, 100.0, 200.0);
        assert!(matches!(
            PisteCalibration::new(inverted, 14.0, 20.0),
            Err(CalibrationError::InvalidArea { .. })
        ));
    }

    #[test]
    fn test_invalid_length_rejected() {
        let area = BoundingBox::new(0.0, 0.0, 1000.0, 200.0);
        assert!(matches!(
            PisteCalibration::new(area, 0.0, 20.0),
            Err(CalibrationError::InvalidLength(_))
        ));
        assert!(matches!(
            PisteCalibration::new(area, -14.0, 20.0),
            Err(CalibrationError::InvalidLength(_))
        ));
    }

    #[test]
    fn test_adjust_is_idempotent_not_cumulative() {
        let mut cal = calibrate(BoundingBox::new(0.0, 0.0, 1400.0, 100.0), 14.0);
        let base = cal.current_positions().near_x;

        cal.adjust_line(LineId::Near, 30.0, 1.0);
        assert!((cal.current_positions().near_x - (base + 30.0)).abs() < 0.01);

        // Same call again: same result, not base + 60
        cal.adjust_line(LineId::Near, 30.0, 1.0);
        assert!((cal.current_positions().near_x - (base + 30.0)).abs() < 0.01);
    }

    #[test]
    fn test_tilt_scales_offset() {
        let mut cal = calibrate(BoundingBox::new(0.0, 0.0, 1400.0, 100.0), 14.0);
        let base = cal.current_positions().far_x;

        cal.adjust_line(LineId::Far, 40.0, 0.5);
        assert!((cal.current_positions().far_x - (base + 20.0)).abs() < 0.01);

        cal.adjust_line(LineId::Far, 40.0, 1.5);
        assert!((cal.current_positions().far_x - (base + 60.0)).abs() < 0.01);
    }

    #[test]
    fn test_reset_line_restores_base() {
        let mut cal = calibrate(BoundingBox::new(0.0, 0.0, 1400.0, 100.0), 14.0);
        let base = cal.current_positions().center_x;

        cal.adjust_line(LineId::Center, -75.0, 1.2);
        assert!((cal.current_positions().center_x - base).abs() > 1.0);

        cal.reset_line(LineId::Center);
        assert!((cal.current_positions().center_x - base).abs() < 0.01);
    }

    #[test]
    fn test_extreme_adjustment_tolerated() {
        // Adjustments may push lines out of order or outside the area.
        // That is an operator choice, not an error.
        let mut cal = calibrate(BoundingBox::new(0.0, 0.0, 1400.0, 100.0), 14.0);
        cal.adjust_line(LineId::Near, 800.0, 1.0);
        let lines = cal.current_positions();
        assert!(lines.near_x > lines.far_x);
    }

    #[test]
    fn test_on_line_tolerance_band() {
        let cal = calibrate(BoundingBox::new(0.0, 0.0, 1400.0, 100.0), 14.0);
        // Near line at x=500, tolerance 20
        assert!(cal.on_line(LineId::Near, 500.0));
        assert!(cal.on_line(LineId::Near, 481.0));
        assert!(cal.on_line(LineId::Near, 519.0));
        assert!(!cal.on_line(LineId::Near, 479.0));
        assert!(!cal.on_line(LineId::Near, 521.0));
    }

    #[test]
    fn test_on_line_requires_point_inside_piste() {
        let mut cal = calibrate(BoundingBox::new(100.0, 0.0, 1500.0, 100.0), 14.0);
        // Drag the near line next to the piste edge; points past the edge
        // are off-piste even when inside the tolerance band.
        cal.adjust_line(LineId::Near, -490.0, 1.0);
        let near_x = cal.current_positions().near_x;
        assert!((near_x - 110.0).abs() < 0.01);
        assert!(cal.on_line(LineId::Near, 105.0));
        assert!(!cal.on_line(LineId::Near, 95.0));
    }
}

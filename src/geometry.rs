use std::f64::consts::{FRAC_PI_2, PI};

use crate::{Result, XgError};

pub const GOAL_WIDTH: f64 = 7.32;
pub const PITCH_LENGTH: f64 = 105.0;
pub const PITCH_WIDTH: f64 = 68.0;

// Wyscout positions are percentages of the pitch, attacking towards x = 100.
pub const WYSCOUT_WIDTH: f64 = 100.0;
pub const WYSCOUT_HEIGHT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchFrame {
    pub source_width: f64,
    pub source_height: f64,
    pub target_length: f64,
    pub target_width: f64,
    pub goal_width: f64,
}

impl Default for PitchFrame {
    fn default() -> Self {
        Self {
            source_width: WYSCOUT_WIDTH,
            source_height: WYSCOUT_HEIGHT,
            target_length: PITCH_LENGTH,
            target_width: PITCH_WIDTH,
            goal_width: GOAL_WIDTH,
        }
    }
}

impl PitchFrame {
    /// Inverse of [`normalize`]: pitch metres back to source units.
    pub fn to_source(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.source_width - x * self.source_width / self.target_length,
            y * self.source_height / self.target_width,
        )
    }
}

/// Rescales a raw shot location so the attacked goal sits at `X = 0`.
pub fn normalize(
    raw_x: f64,
    raw_y: f64,
    source_width: f64,
    source_height: f64,
    target_length: f64,
    target_width: f64,
) -> Result<(f64, f64)> {
    if !(source_width.is_finite() && source_width > 0.0)
        || !(source_height.is_finite() && source_height > 0.0)
    {
        return Err(XgError::InvalidInput(format!(
            "source dimensions must be positive, got {source_width}x{source_height}"
        )));
    }
    if !raw_x.is_finite() || !raw_y.is_finite() {
        return Err(XgError::InvalidInput(format!(
            "non-finite shot coordinates ({raw_x}, {raw_y})"
        )));
    }
    let x = (source_width - raw_x) * target_length / source_width;
    let y = raw_y * target_width / source_height;
    Ok((x, y))
}

pub fn center_offset(y: f64, target_width: f64) -> f64 {
    (y - target_width / 2.0).abs()
}

pub fn distance_to_goal(x: f64, c: f64) -> f64 {
    (x * x + c * c).sqrt()
}

/// Angle subtended by the goal mouth, in `[0, π]`.
///
/// A negative arctangent means the shot lies inside the circle through both
/// posts; the angle is then obtuse and is recovered by adding π. Taking the
/// absolute value instead would give the supplementary angle.
///
/// On that circle the denominator is zero: the angle is π/2 for `X > 0` and
/// 0 when the shot is on the goal line.
pub fn shot_angle(x: f64, c: f64, goal_width: f64) -> f64 {
    let half = goal_width / 2.0;
    let denom = x * x + c * c - half * half;
    if denom == 0.0 {
        return if x == 0.0 { 0.0 } else { FRAC_PI_2 };
    }
    let raw = (goal_width * x / denom).atan();
    if raw < 0.0 { raw + PI } else { raw }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_puts_goal_at_origin() {
        let (x, y) = normalize(100.0, 50.0, 100.0, 100.0, 105.0, 68.0).unwrap();
        assert_eq!(x, 0.0);
        assert_eq!(y, 34.0);

        let (x, _) = normalize(0.0, 0.0, 100.0, 100.0, 105.0, 68.0).unwrap();
        assert_eq!(x, 105.0);
    }

    #[test]
    fn to_source_inverts_normalize() {
        let frame = PitchFrame::default();
        let (rx, ry) = frame.to_source(11.0, 34.0);
        assert!((rx - (100.0 - 11.0 * 100.0 / 105.0)).abs() < 1e-12);
        assert!((ry - 50.0).abs() < 1e-12);
        let (x, y) = normalize(rx, ry, 100.0, 100.0, 105.0, 68.0).unwrap();
        assert!((x - 11.0).abs() < 1e-12);
        assert!((y - 34.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_rejects_degenerate_source() {
        assert!(matches!(
            normalize(10.0, 10.0, 0.0, 100.0, 105.0, 68.0),
            Err(XgError::InvalidInput(_))
        ));
        assert!(matches!(
            normalize(10.0, 10.0, 100.0, -1.0, 105.0, 68.0),
            Err(XgError::InvalidInput(_))
        ));
    }

    #[test]
    fn angle_on_goal_line_centre_is_zero() {
        assert_eq!(shot_angle(0.0, 0.0, GOAL_WIDTH), 0.0);
        assert_eq!(distance_to_goal(0.0, 0.0), 0.0);
    }

    #[test]
    fn angle_inside_post_circle_adds_pi() {
        // One metre out, dead centre: the mouth spans almost a half turn.
        let a = shot_angle(1.0, 0.0, GOAL_WIDTH);
        let expected = 2.0 * (GOAL_WIDTH / 2.0).atan2(1.0);
        assert!((a - expected).abs() < 1e-12);
        assert!(a > FRAC_PI_2);

        let raw = (GOAL_WIDTH * 1.0 / (1.0 - (GOAL_WIDTH / 2.0).powi(2))).atan();
        assert!((a - raw.abs()).abs() > 0.1);
    }

    #[test]
    fn angle_on_post_circle_is_right_angle() {
        let half = GOAL_WIDTH / 2.0;
        assert_eq!(shot_angle(half, 0.0, GOAL_WIDTH), FRAC_PI_2);
        assert_eq!(shot_angle(0.0, half, GOAL_WIDTH), 0.0);
    }

    #[test]
    fn penalty_spot_angle_matches_geometry() {
        let a = shot_angle(11.0, 0.0, GOAL_WIDTH);
        let expected = 2.0 * (GOAL_WIDTH / 2.0 / 11.0).atan();
        assert!((a - expected).abs() < 1e-12);
    }
}

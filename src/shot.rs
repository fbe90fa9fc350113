use serde::{Deserialize, Serialize};

use crate::Result;
use crate::geometry::{self, PitchFrame};

/// A shot as delivered by a dataset, before any geometry is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawShot {
    pub x: f64,
    pub y: f64,
    pub scored: bool,
    #[serde(default)]
    pub header: bool,
    #[serde(default)]
    pub player_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotRecord {
    pub raw_x: f64,
    pub raw_y: f64,
    pub x: f64,
    pub y: f64,
    pub c: f64,
    pub distance: f64,
    pub angle: f64,
    pub goal: u8,
    pub header: bool,
    pub player_id: Option<u64>,
}

impl ShotRecord {
    pub fn from_raw(raw: &RawShot, frame: &PitchFrame) -> Result<Self> {
        let (x, y) = geometry::normalize(
            raw.x,
            raw.y,
            frame.source_width,
            frame.source_height,
            frame.target_length,
            frame.target_width,
        )?;
        Ok(Self::at(x, y, raw.scored, frame).with_origin(raw))
    }

    /// Builds a record directly from normalized pitch coordinates. The raw
    /// fields hold the same location in the frame's source units.
    pub fn at(x: f64, y: f64, scored: bool, frame: &PitchFrame) -> Self {
        let c = geometry::center_offset(y, frame.target_width);
        let (raw_x, raw_y) = frame.to_source(x, y);
        Self {
            raw_x,
            raw_y,
            x,
            y,
            c,
            distance: geometry::distance_to_goal(x, c),
            angle: geometry::shot_angle(x, c, frame.goal_width),
            goal: u8::from(scored),
            header: false,
            player_id: None,
        }
    }

    pub fn is_goal(&self) -> bool {
        self.goal == 1
    }

    pub fn label(&self) -> f64 {
        f64::from(self.goal)
    }

    fn with_origin(mut self, raw: &RawShot) -> Self {
        self.raw_x = raw.x;
        self.raw_y = raw.y;
        self.header = raw.header;
        self.player_id = raw.player_id;
        self
    }
}

pub fn records_from_raw(raw: &[RawShot], frame: &PitchFrame) -> Result<Vec<ShotRecord>> {
    raw.iter().map(|r| ShotRecord::from_raw(r, frame)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_shot_on_penalty_spot() {
        // 11m out on a 105m pitch is ~89.52% of the way up, centred.
        let raw = RawShot {
            x: 100.0 - 11.0 * 100.0 / 105.0,
            y: 50.0,
            scored: true,
            header: false,
            player_id: Some(7),
        };
        let rec = ShotRecord::from_raw(&raw, &PitchFrame::default()).unwrap();
        assert!((rec.x - 11.0).abs() < 1e-9);
        assert_eq!(rec.c, 0.0);
        assert!((rec.distance - 11.0).abs() < 1e-9);
        assert!(rec.is_goal());
        assert_eq!(rec.player_id, Some(7));
        assert_eq!(rec.raw_y, 50.0);
    }

    #[test]
    fn record_invariants_hold() {
        let rec = ShotRecord::at(20.0, 10.0, false, &PitchFrame::default());
        assert_eq!(rec.c, 24.0);
        assert!(rec.distance >= 0.0);
        assert!(rec.angle >= 0.0 && rec.angle <= std::f64::consts::PI);
        assert_eq!(rec.goal, 0);
    }

    #[test]
    fn record_from_pitch_coordinates_keeps_source_location() {
        let frame = PitchFrame::default();
        let rec = ShotRecord::at(21.0, 17.0, true, &frame);
        assert!((rec.raw_x - 80.0).abs() < 1e-12);
        assert!((rec.raw_y - 25.0).abs() < 1e-12);

        let raw = RawShot {
            x: rec.raw_x,
            y: rec.raw_y,
            scored: true,
            header: false,
            player_id: None,
        };
        let again = ShotRecord::from_raw(&raw, &frame).unwrap();
        assert!((again.x - rec.x).abs() < 1e-12);
        assert!((again.y - rec.y).abs() < 1e-12);
    }
}

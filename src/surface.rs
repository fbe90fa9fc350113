use rayon::prelude::*;
use serde::Serialize;

use crate::geometry::PitchFrame;
use crate::model::ModelCoefficients;
use crate::shot::ShotRecord;
use crate::{Result, XgError};

/// xG sampled on a regular grid of the attacking half.
///
/// Row `i` is `i * step` metres out from the goal line, column `j` is
/// `j * step` metres across the pitch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilitySurface {
    pub rows: usize,
    pub cols: usize,
    pub step: f64,
    pub values: Vec<f64>,
}

impl ProbabilitySurface {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.values.get(row * self.cols + col).copied()
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.rows {
            return None;
        }
        self.values.get(row * self.cols..(row + 1) * self.cols)
    }
}

pub fn probability_surface(
    model: &ModelCoefficients,
    frame: &PitchFrame,
    rows: usize,
    cols: usize,
    step: f64,
) -> Result<ProbabilitySurface> {
    if rows == 0 || cols == 0 || !(step.is_finite() && step > 0.0) {
        return Err(XgError::InvalidInput(format!(
            "surface needs positive dimensions and step, got {rows}x{cols} step {step}"
        )));
    }
    let values = (0..rows * cols)
        .into_par_iter()
        .map(|idx| {
            let x = (idx / cols) as f64 * step;
            let y = (idx % cols) as f64 * step;
            model.xg(&ShotRecord::at(x, y, false, frame))
        })
        .collect();
    Ok(ProbabilitySurface {
        rows,
        cols,
        step,
        values,
    })
}

/// The 68x68 one-metre grid used for the classic xG heat map.
pub fn default_surface(model: &ModelCoefficients) -> Result<ProbabilitySurface> {
    let frame = PitchFrame::default();
    let n = frame.target_width as usize;
    probability_surface(model, &frame, n, n, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSet;

    #[test]
    fn surface_is_symmetric_across_centreline() {
        let model = ModelCoefficients::new(FeatureSet::full(), vec![
            -1.0, -1.5, 0.05, 0.02, 0.01, 0.0005, 0.001, -0.01,
        ])
        .unwrap();
        let s = default_surface(&model).unwrap();
        assert_eq!(s.values.len(), 68 * 68);
        let a = s.get(12, 30).unwrap();
        let b = s.get(12, 38).unwrap();
        assert!((a - b).abs() < 1e-12);
        assert!(s.get(68, 0).is_none());
        assert_eq!(s.row(3).map(<[f64]>::len), Some(68));
        assert_eq!(s.row(67).and_then(|r| r.last()).copied(), s.get(67, 67));
        assert!(s.row(68).is_none());
    }

    #[test]
    fn closer_is_likelier_under_distance_model() {
        let model = ModelCoefficients::new(FeatureSet::distance_only(), vec![0.5, 0.1]).unwrap();
        let s = default_surface(&model).unwrap();
        assert!(s.get(6, 34).unwrap() > s.get(30, 34).unwrap());
    }

    #[test]
    fn rejects_empty_grid() {
        let model = ModelCoefficients::new(FeatureSet::empty(), vec![0.0]).unwrap();
        assert!(probability_surface(&model, &PitchFrame::default(), 0, 5, 1.0).is_err());
    }
}

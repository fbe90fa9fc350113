use serde::{Deserialize, Serialize};

use crate::features::{FeatureSet, FeatureVector, build_features};
use crate::shot::ShotRecord;
use crate::{Result, XgError};

// Below -36 the sum 1 + e^η rounds to 1 and p would reach 1. Above ~745
// e^-η underflows to 0, so the upper bound stays clear of it.
pub const LINEAR_PREDICTOR_MIN: f64 = -36.0;
pub const LINEAR_PREDICTOR_MAX: f64 = 700.0;

/// Intercept followed by one coefficient per feature, in feature-set order.
///
/// Probabilities follow `p = 1 / (1 + exp(b0 + Σ bi·xi))`, so a negative
/// coefficient raises the scoring probability as its feature grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoefficientsRepr", into = "CoefficientsRepr")]
pub struct ModelCoefficients {
    features: FeatureSet,
    values: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct CoefficientsRepr {
    features: FeatureSet,
    values: Vec<f64>,
}

impl TryFrom<CoefficientsRepr> for ModelCoefficients {
    type Error = XgError;

    fn try_from(repr: CoefficientsRepr) -> Result<Self> {
        Self::new(repr.features, repr.values)
    }
}

impl From<ModelCoefficients> for CoefficientsRepr {
    fn from(m: ModelCoefficients) -> Self {
        Self {
            features: m.features,
            values: m.values,
        }
    }
}

impl ModelCoefficients {
    pub fn new(features: FeatureSet, values: Vec<f64>) -> Result<Self> {
        let expected = features.len() + 1;
        if values.len() != expected {
            return Err(XgError::DimensionMismatch {
                expected,
                actual: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(XgError::InvalidInput(
                "coefficients must be finite".to_string(),
            ));
        }
        Ok(Self { features, values })
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn intercept(&self) -> f64 {
        self.values[0]
    }

    pub fn slopes(&self) -> &[f64] {
        &self.values[1..]
    }

    pub fn named(&self) -> Vec<(String, f64)> {
        std::iter::once("Intercept".to_string())
            .chain(self.features.names())
            .zip(self.values.iter().copied())
            .collect()
    }

    /// Scores a shot with this model's own feature configuration.
    pub fn xg(&self, shot: &ShotRecord) -> f64 {
        let fv = build_features(shot, &self.features);
        probability_from_linear(linear_predictor_unchecked(&fv.values, &self.values))
    }
}

pub fn linear_predictor(features: &FeatureVector, coefficients: &ModelCoefficients) -> Result<f64> {
    check_dimensions(features.len(), coefficients.values.len())?;
    Ok(linear_predictor_unchecked(
        &features.values,
        &coefficients.values,
    ))
}

pub fn score_probability(features: &FeatureVector, coefficients: &ModelCoefficients) -> Result<f64> {
    linear_predictor(features, coefficients).map(probability_from_linear)
}

/// `1 / (1 + e^η)` evaluated without overflow; always strictly inside (0, 1).
pub fn probability_from_linear(eta: f64) -> f64 {
    let eta = eta.clamp(LINEAR_PREDICTOR_MIN, LINEAR_PREDICTOR_MAX);
    if eta >= 0.0 {
        let e = (-eta).exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + eta.exp())
    }
}

/// `(ln p, ln(1 - p))` for `p = 1 / (1 + e^η)`, finite for any finite η.
pub fn log_probabilities(eta: f64) -> (f64, f64) {
    (-softplus(eta), -softplus(-eta))
}

pub(crate) fn linear_predictor_unchecked(x: &[f64], b: &[f64]) -> f64 {
    let mut eta = b[0];
    for (xi, bi) in x.iter().zip(&b[1..]) {
        eta += bi * xi;
    }
    eta
}

pub(crate) fn check_dimensions(feature_len: usize, coeff_len: usize) -> Result<()> {
    if coeff_len != feature_len + 1 {
        return Err(XgError::DimensionMismatch {
            expected: feature_len + 1,
            actual: coeff_len,
        });
    }
    Ok(())
}

/// Length check, then the feature names and order the coefficients were fitted on.
pub(crate) fn check_alignment(features: &FeatureSet, coefficients: &ModelCoefficients) -> Result<()> {
    check_dimensions(features.len(), coefficients.values.len())?;
    if features != coefficients.features() {
        return Err(XgError::FeatureMismatch {
            expected: coefficients.features().names().join(", "),
            actual: features.names().join(", "),
        });
    }
    Ok(())
}

fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(values: &[f64]) -> FeatureVector {
        FeatureVector {
            values: values.to_vec(),
        }
    }

    #[test]
    fn matches_naive_formula_in_normal_range() {
        let coeffs = ModelCoefficients::new(FeatureSet::angle_only(), vec![3.0, -3.0]).unwrap();
        let p = score_probability(&fv(&[0.5]), &coeffs).unwrap();
        let naive = 1.0 / (1.0 + (3.0_f64 - 1.5).exp());
        assert!((p - naive).abs() < 1e-15);
    }

    #[test]
    fn extreme_predictors_stay_open_interval() {
        for eta in [-1e308, -800.0, -40.0, 0.0, 40.0, 800.0, 1e308] {
            let p = probability_from_linear(eta);
            assert!(p > 0.0 && p < 1.0, "eta={eta} p={p}");
        }
    }

    #[test]
    fn large_positive_predictors_still_separate() {
        let ps: Vec<f64> = [30.0, 40.0, 100.0, 600.0, 699.0]
            .into_iter()
            .map(probability_from_linear)
            .collect();
        assert!(ps.windows(2).all(|w| w[0] > w[1]), "{ps:?}");
        assert!(ps[4] > 0.0);
        assert!(probability_from_linear(-36.0) < 1.0);
        assert!(probability_from_linear(-20.0) > probability_from_linear(-10.0));
    }

    #[test]
    fn alignment_checks_names_not_just_length() {
        let coeffs = ModelCoefficients::new(FeatureSet::angle_only(), vec![0.1, 0.2]).unwrap();
        assert!(check_alignment(&FeatureSet::angle_only(), &coeffs).is_ok());
        assert_eq!(
            check_alignment(&FeatureSet::distance_only(), &coeffs).unwrap_err(),
            XgError::FeatureMismatch {
                expected: "Angle".to_string(),
                actual: "Distance".to_string(),
            }
        );
        assert!(matches!(
            check_alignment(&FeatureSet::full(), &coeffs),
            Err(XgError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let coeffs = ModelCoefficients::new(FeatureSet::angle_only(), vec![0.1, 0.2]).unwrap();
        let err = score_probability(&fv(&[1.0, 2.0]), &coeffs).unwrap_err();
        assert_eq!(
            err,
            XgError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
        assert!(ModelCoefficients::new(FeatureSet::full(), vec![0.0; 3]).is_err());
    }

    #[test]
    fn log_probabilities_agree_with_probability() {
        for eta in [-5.0, -0.3, 0.0, 2.0, 9.0] {
            let p = probability_from_linear(eta);
            let (lp, lq) = log_probabilities(eta);
            assert!((lp - p.ln()).abs() < 1e-12);
            assert!((lq - (1.0 - p).ln()).abs() < 1e-12);
        }
        let (lp, lq) = log_probabilities(1000.0);
        assert!((lp + 1000.0).abs() < 1e-9);
        assert_eq!(lq, 0.0);
    }
}

use rayon::prelude::*;
use serde::Serialize;

use crate::features::{FeatureSet, build_features};
use crate::model::{
    ModelCoefficients, check_alignment, linear_predictor_unchecked, log_probabilities,
    probability_from_linear,
};
use crate::shot::ShotRecord;
use crate::{Result, XgError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocPoint {
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub log_likelihood: f64,
    pub null_log_likelihood: f64,
    pub pseudo_r2: f64,
    pub roc: Vec<RocPoint>,
    pub auc: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinMetric {
    AngleDegrees,
    Distance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateBin {
    pub start: f64,
    pub end: f64,
    pub shots: usize,
    pub goals: usize,
    pub rate: Option<f64>,
}

impl RateBin {
    pub fn mid(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

pub fn log_likelihood(
    dataset: &[ShotRecord],
    coefficients: &ModelCoefficients,
    features: &FeatureSet,
) -> Result<f64> {
    check_alignment(features, coefficients)?;
    let mut ll = 0.0;
    for shot in dataset {
        let fv = build_features(shot, features);
        let eta = linear_predictor_unchecked(&fv.values, coefficients.values());
        let (log_p, log_q) = log_probabilities(eta);
        ll += if shot.is_goal() { log_p } else { log_q };
    }
    Ok(ll)
}

/// McFadden's pseudo R²: `1 - ll_fitted / ll_null`.
pub fn pseudo_r2(fitted_log_likelihood: f64, null_log_likelihood: f64) -> Result<f64> {
    if null_log_likelihood == 0.0 {
        return Err(XgError::DivisionUndefined(
            "null model log-likelihood is zero (labels are all one class)".to_string(),
        ));
    }
    Ok(1.0 - fitted_log_likelihood / null_log_likelihood)
}

/// Sweeps `threshold_count` thresholds `i / threshold_count` over `[0, 1)`.
///
/// A shot is predicted to score when its probability is strictly above the
/// threshold. Rates for a class absent from `dataset` are NaN.
pub fn roc_curve(
    dataset: &[ShotRecord],
    coefficients: &ModelCoefficients,
    features: &FeatureSet,
    threshold_count: usize,
) -> Result<Vec<RocPoint>> {
    if threshold_count == 0 {
        return Err(XgError::InvalidInput(
            "threshold_count must be at least 1".to_string(),
        ));
    }
    let probs = predict_all(dataset, coefficients, features)?;
    Ok(roc_from_probabilities(dataset, &probs, threshold_count))
}

/// Per-shot probabilities in input order.
pub fn predict_all(
    dataset: &[ShotRecord],
    coefficients: &ModelCoefficients,
    features: &FeatureSet,
) -> Result<Vec<f64>> {
    check_alignment(features, coefficients)?;
    Ok(dataset
        .par_iter()
        .map(|shot| {
            let fv = build_features(shot, features);
            probability_from_linear(linear_predictor_unchecked(&fv.values, coefficients.values()))
        })
        .collect())
}

fn roc_from_probabilities(dataset: &[ShotRecord], probs: &[f64], threshold_count: usize) -> Vec<RocPoint> {
    let mut out = Vec::with_capacity(threshold_count);
    for i in 0..threshold_count {
        let threshold = i as f64 / threshold_count as f64;
        let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);
        for (shot, p) in dataset.iter().zip(probs) {
            match (shot.is_goal(), *p > threshold) {
                (true, true) => tp += 1,
                (true, false) => fn_ += 1,
                (false, true) => fp += 1,
                (false, false) => tn += 1,
            }
        }
        out.push(RocPoint {
            threshold,
            fpr: ratio(fp, fp + tn),
            tpr: ratio(tp, tp + fn_),
        });
    }
    out
}

/// Trapezoidal area under the finite ROC points, anchored at (0,0) and (1,1).
pub fn auc(points: &[RocPoint]) -> f64 {
    let mut pts: Vec<(f64, f64)> = points
        .iter()
        .filter(|p| p.fpr.is_finite() && p.tpr.is_finite())
        .map(|p| (p.fpr, p.tpr))
        .collect();
    if pts.is_empty() {
        return f64::NAN;
    }
    pts.push((0.0, 0.0));
    pts.push((1.0, 1.0));
    pts.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut area = 0.0;
    for w in pts.windows(2) {
        area += (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0;
    }
    area
}

/// With a single class the fitted null log-likelihood only approaches zero, so
/// pseudo R² needs both goals and misses.
pub fn check_both_classes(dataset: &[ShotRecord]) -> Result<()> {
    let goals = dataset.iter().filter(|s| s.is_goal()).count();
    if goals == 0 || goals == dataset.len() {
        return Err(XgError::DivisionUndefined(format!(
            "need both goals and misses, got {goals} goals from {} shots",
            dataset.len()
        )));
    }
    Ok(())
}

pub fn evaluate(
    dataset: &[ShotRecord],
    coefficients: &ModelCoefficients,
    null_model: &ModelCoefficients,
    threshold_count: usize,
) -> Result<EvaluationResult> {
    check_both_classes(dataset)?;
    let features = coefficients.features();
    let fitted = log_likelihood(dataset, coefficients, features)?;
    let null = log_likelihood(dataset, null_model, null_model.features())?;
    let roc = roc_curve(dataset, coefficients, features, threshold_count)?;
    Ok(EvaluationResult {
        log_likelihood: fitted,
        null_log_likelihood: null,
        pseudo_r2: pseudo_r2(fitted, null)?,
        auc: auc(&roc),
        roc,
    })
}

/// Empirical goals/shots per bin; shots outside `range` are ignored and the
/// upper edge is inclusive.
pub fn binned_scoring_rate(
    shots: &[ShotRecord],
    metric: BinMetric,
    bins: usize,
    range: (f64, f64),
) -> Result<Vec<RateBin>> {
    let (lo, hi) = range;
    if bins == 0 || !(lo.is_finite() && hi.is_finite() && hi > lo) {
        return Err(XgError::InvalidInput(format!(
            "need bins > 0 and a non-empty range, got {bins} over [{lo}, {hi}]"
        )));
    }
    let width = (hi - lo) / bins as f64;
    let mut shots_in = vec![0usize; bins];
    let mut goals_in = vec![0usize; bins];

    for shot in shots {
        let v = match metric {
            BinMetric::AngleDegrees => shot.angle.to_degrees(),
            BinMetric::Distance => shot.distance,
        };
        if !(lo..=hi).contains(&v) {
            continue;
        }
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        shots_in[idx] += 1;
        if shot.is_goal() {
            goals_in[idx] += 1;
        }
    }

    Ok((0..bins)
        .map(|i| RateBin {
            start: lo + i as f64 * width,
            end: lo + (i + 1) as f64 * width,
            shots: shots_in[i],
            goals: goals_in[i],
            rate: (shots_in[i] > 0).then(|| goals_in[i] as f64 / shots_in[i] as f64),
        })
        .collect())
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        f64::NAN
    } else {
        num as f64 / den as f64
    }
}

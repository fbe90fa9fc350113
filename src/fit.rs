use tracing::{debug, info, warn};

use crate::features::{FeatureSet, build_features};
use crate::model::{ModelCoefficients, log_probabilities, probability_from_linear};
use crate::shot::ShotRecord;
use crate::{Result, XgError};

const MAX_STEP_HALVINGS: usize = 30;
const PIVOT_EPS: f64 = 1e-14;
// Every fitted probability this close to its label means the classes are
// perfectly separated and the estimates are running off to infinity.
const SEPARATION_EPS: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct FitConfig {
    pub max_iterations: usize,
    /// Stop once one Newton step improves the log-likelihood by less than this.
    pub tolerance: f64,
    /// Starting coefficients (intercept first). Zeros when absent.
    pub initial: Option<Vec<f64>>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-8,
            initial: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientRow {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    pub coefficients: ModelCoefficients,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub observations: usize,
    pub std_errors: Vec<f64>,
    /// Coefficients are not finite MLEs; the fit stopped on the tolerance.
    pub perfect_separation: bool,
}

impl FitSummary {
    pub fn table(&self) -> Vec<CoefficientRow> {
        self.coefficients
            .named()
            .into_iter()
            .zip(&self.std_errors)
            .map(|((name, estimate), se)| CoefficientRow {
                name,
                estimate,
                std_error: *se,
                z: if *se > 0.0 { estimate / se } else { f64::NAN },
            })
            .collect()
    }
}

pub fn fit(
    training: &[ShotRecord],
    features: &FeatureSet,
    config: &FitConfig,
) -> Result<ModelCoefficients> {
    fit_with_summary(training, features, config).map(|s| s.coefficients)
}

pub fn fit_null_model(training: &[ShotRecord], config: &FitConfig) -> Result<ModelCoefficients> {
    fit(training, &FeatureSet::empty(), config)
}

/// Newton-Raphson on the binomial log-likelihood.
///
/// Each step solves `I(b)·Δ = Σ (p - y)·x` where `I` is the observed
/// information; a step that lowers the likelihood is halved until it does
/// not.
pub fn fit_with_summary(
    training: &[ShotRecord],
    features: &FeatureSet,
    config: &FitConfig,
) -> Result<FitSummary> {
    if training.is_empty() {
        return Err(XgError::InvalidInput("training set is empty".to_string()));
    }
    if config.max_iterations == 0 {
        return Err(XgError::InvalidInput(
            "max_iterations must be at least 1".to_string(),
        ));
    }
    if !(config.tolerance.is_finite() && config.tolerance > 0.0) {
        return Err(XgError::InvalidInput(format!(
            "tolerance must be positive, got {}",
            config.tolerance
        )));
    }

    let k = features.len() + 1;
    let rows: Vec<Vec<f64>> = training
        .iter()
        .map(|shot| {
            let mut row = Vec::with_capacity(k);
            row.push(1.0);
            row.extend(build_features(shot, features).values);
            row
        })
        .collect();
    if rows.iter().flatten().any(|v| !v.is_finite()) {
        return Err(XgError::InvalidInput(
            "training features contain non-finite values".to_string(),
        ));
    }
    let labels: Vec<f64> = training.iter().map(ShotRecord::label).collect();

    let mut beta = match &config.initial {
        Some(start) if start.len() != k => {
            return Err(XgError::DimensionMismatch {
                expected: k,
                actual: start.len(),
            });
        }
        Some(start) => start.clone(),
        None => vec![0.0; k],
    };
    let mut ll = design_log_likelihood(&rows, &labels, &beta);
    let mut last_change = f64::INFINITY;

    for iteration in 1..=config.max_iterations {
        let (grad, info) = score_and_information(&rows, &labels, &beta);
        let step = solve(info, grad).ok_or(XgError::SingularSystem { iteration })?;

        let mut scale = 1.0;
        let mut candidate = advance(&beta, &step, scale);
        let mut candidate_ll = design_log_likelihood(&rows, &labels, &candidate);
        let mut halvings = 0;
        while candidate_ll < ll && halvings < MAX_STEP_HALVINGS {
            scale *= 0.5;
            candidate = advance(&beta, &step, scale);
            candidate_ll = design_log_likelihood(&rows, &labels, &candidate);
            halvings += 1;
        }
        if candidate_ll < ll {
            // No improving point along the Newton direction: we are at the optimum
            // to within floating-point resolution.
            candidate = beta.clone();
            candidate_ll = ll;
        }

        last_change = candidate_ll - ll;
        beta = candidate;
        ll = candidate_ll;
        debug!(iteration, log_likelihood = ll, change = last_change, halvings, "newton step");

        if last_change.abs() < config.tolerance {
            info!(
                iterations = iteration,
                observations = training.len(),
                log_likelihood = ll,
                "xG fit converged"
            );
            let perfect_separation = is_separated(&rows, &labels, &beta);
            if perfect_separation {
                warn!(
                    observations = training.len(),
                    "perfect separation: fitted probabilities match every label"
                );
            }
            let std_errors = standard_errors(&rows, &labels, &beta);
            return Ok(FitSummary {
                coefficients: ModelCoefficients::new(features.clone(), beta)?,
                log_likelihood: ll,
                iterations: iteration,
                observations: training.len(),
                std_errors,
                perfect_separation,
            });
        }
    }

    warn!(
        iterations = config.max_iterations,
        last_change, "xG fit hit the iteration cap"
    );
    Err(XgError::NonConvergence {
        iterations: config.max_iterations,
        last_change,
    })
}

pub(crate) fn design_log_likelihood(rows: &[Vec<f64>], labels: &[f64], beta: &[f64]) -> f64 {
    let mut ll = 0.0;
    for (row, y) in rows.iter().zip(labels) {
        let (log_p, log_q) = log_probabilities(dot(row, beta));
        ll += y * log_p + (1.0 - y) * log_q;
    }
    ll
}

fn score_and_information(
    rows: &[Vec<f64>],
    labels: &[f64],
    beta: &[f64],
) -> (Vec<f64>, Vec<Vec<f64>>) {
    let k = beta.len();
    let mut grad = vec![0.0; k];
    let mut info = vec![vec![0.0; k]; k];
    for (row, y) in rows.iter().zip(labels) {
        let p = probability_from_linear(dot(row, beta));
        let w = p * (1.0 - p);
        let r = p - y;
        for i in 0..k {
            grad[i] += r * row[i];
            for j in 0..=i {
                info[i][j] += w * row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            info[j][i] = info[i][j];
        }
    }
    (grad, info)
}

fn is_separated(rows: &[Vec<f64>], labels: &[f64], beta: &[f64]) -> bool {
    rows.iter()
        .zip(labels)
        .all(|(row, y)| (probability_from_linear(dot(row, beta)) - y).abs() < SEPARATION_EPS)
}

fn standard_errors(rows: &[Vec<f64>], labels: &[f64], beta: &[f64]) -> Vec<f64> {
    let k = beta.len();
    let (_, info) = score_and_information(rows, labels, beta);
    (0..k)
        .map(|j| {
            let mut unit = vec![0.0; k];
            unit[j] = 1.0;
            solve(info.clone(), unit)
                .map(|col| col[j])
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(f64::sqrt)
                .unwrap_or(f64::NAN)
        })
        .collect()
}

fn advance(beta: &[f64], step: &[f64], scale: f64) -> Vec<f64> {
    beta.iter().zip(step).map(|(b, s)| b + scale * s).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    let mut out = 0.0;
    for (x, y) in a.iter().zip(b) {
        out += x * y;
    }
    out
}

/// Gaussian elimination with partial pivoting. `None` when the matrix is
/// numerically singular.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0_f64, f64::max);
    if !(scale.is_finite() && scale > 0.0) {
        return None;
    }

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r, &s| a[r][col].abs().total_cmp(&a[s][col].abs()))?;
        if a[pivot_row][col].abs() <= PIVOT_EPS * scale {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                a[row][c] -= factor * a[col][c];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut acc = b[row];
        for c in row + 1..n {
            acc -= a[row][c] * x[c];
        }
        x[row] = acc / a[row][row];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PitchFrame;

    fn shots_at(x: f64, y: f64, goals: usize, misses: usize) -> Vec<ShotRecord> {
        let frame = PitchFrame::default();
        let mut out = Vec::new();
        out.extend((0..goals).map(|_| ShotRecord::at(x, y, true, &frame)));
        out.extend((0..misses).map(|_| ShotRecord::at(x, y, false, &frame)));
        out
    }

    #[test]
    fn solve_small_system() {
        let a = vec![vec![4.0, 1.0], vec![1.0, 3.0]];
        let x = solve(a, vec![1.0, 2.0]).unwrap();
        assert!((x[0] - 1.0 / 11.0).abs() < 1e-12);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-12);
        assert!(solve(vec![vec![1.0, 2.0], vec![2.0, 4.0]], vec![1.0, 1.0]).is_none());
    }

    #[test]
    fn null_model_matches_base_rate() {
        let data = shots_at(15.0, 34.0, 3, 7);
        let coeffs = fit_null_model(&data, &FitConfig::default()).unwrap();
        // p = 1 / (1 + e^b0) = 0.3  =>  b0 = ln(0.7 / 0.3)
        assert!((coeffs.intercept() - (0.7_f64 / 0.3).ln()).abs() < 1e-6);
    }

    #[test]
    fn empty_training_set_is_invalid() {
        assert!(matches!(
            fit(&[], &FeatureSet::angle_only(), &FitConfig::default()),
            Err(XgError::InvalidInput(_))
        ));
    }

    #[test]
    fn iteration_cap_is_reported() {
        let mut data = shots_at(11.0, 34.0, 3, 2);
        data.extend(shots_at(30.0, 24.0, 1, 4));
        let cfg = FitConfig {
            max_iterations: 1,
            ..FitConfig::default()
        };
        assert!(matches!(
            fit(&data, &FeatureSet::angle_only(), &cfg),
            Err(XgError::NonConvergence { iterations: 1, .. })
        ));
    }

    #[test]
    fn wrong_start_vector_length() {
        let data = shots_at(11.0, 34.0, 1, 1);
        let cfg = FitConfig {
            initial: Some(vec![0.0; 3]),
            ..FitConfig::default()
        };
        assert!(matches!(
            fit(&data, &FeatureSet::angle_only(), &cfg),
            Err(XgError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn summary_has_standard_errors() {
        let mut data = shots_at(11.0, 34.0, 3, 2);
        data.extend(shots_at(30.0, 24.0, 1, 4));
        let summary =
            fit_with_summary(&data, &FeatureSet::angle_only(), &FitConfig::default()).unwrap();
        let table = summary.table();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].name, "Intercept");
        assert_eq!(table[1].name, "Angle");
        assert!(table.iter().all(|r| r.std_error.is_finite() && r.std_error > 0.0));
        assert_eq!(summary.observations, 10);
        assert!(summary.log_likelihood < 0.0);
        assert!(!summary.perfect_separation);
    }

    #[test]
    fn separable_shots_are_flagged() {
        // Every close shot scores, every long one misses.
        let mut data = shots_at(5.0, 34.0, 3, 0);
        data.extend(shots_at(30.0, 34.0, 0, 3));
        let summary =
            fit_with_summary(&data, &FeatureSet::distance_only(), &FitConfig::default()).unwrap();
        assert!(summary.perfect_separation);
        assert!(summary.coefficients.slopes()[0] > 0.0);
    }
}

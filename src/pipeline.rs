use anyhow::{Context, Result};
use tracing::info;

use crate::config::AnalysisConfig;
use crate::evaluation::{self, BinMetric, EvaluationResult, RateBin};
use crate::features::FeatureSet;
use crate::fit::{self, FitSummary};
use crate::model::ModelCoefficients;
use crate::player_totals::{self, PlayerXg};
use crate::report_export::ReportInput;
use crate::shot::{RawShot, ShotRecord};
use crate::surface::{self, ProbabilitySurface};

pub const ANGLE_BINS: (usize, (f64, f64)) = (40, (0.0, 150.0));
pub const DISTANCE_BINS: (usize, (f64, f64)) = (40, (0.0, 70.0));

#[derive(Debug, Clone)]
pub struct Analysis {
    pub summary: FitSummary,
    pub null_model: ModelCoefficients,
    pub evaluation: EvaluationResult,
    pub angle_bins: Vec<RateBin>,
    pub distance_bins: Vec<RateBin>,
    pub surface: ProbabilitySurface,
    pub players: Vec<PlayerXg>,
}

impl Analysis {
    pub fn report_input(&self) -> ReportInput<'_> {
        ReportInput {
            summary: &self.summary,
            evaluation: &self.evaluation,
            angle_bins: &self.angle_bins,
            distance_bins: &self.distance_bins,
            surface: &self.surface,
            players: &self.players,
        }
    }
}

/// Fit, baseline, evaluate and summarise one feature configuration.
pub fn analyse(
    shots: &[ShotRecord],
    penalties: &[RawShot],
    features: &FeatureSet,
    cfg: &AnalysisConfig,
) -> Result<Analysis> {
    evaluation::check_both_classes(shots)?;
    let summary = fit::fit_with_summary(shots, features, &cfg.fit)
        .with_context(|| format!("fit model [{}]", features.names().join(", ")))?;
    let null_model = fit::fit_null_model(shots, &cfg.fit).context("fit null model")?;
    let evaluation =
        evaluation::evaluate(shots, &summary.coefficients, &null_model, cfg.roc_thresholds)
            .context("evaluate model")?;
    info!(
        observations = summary.observations,
        iterations = summary.iterations,
        log_likelihood = evaluation.log_likelihood,
        pseudo_r2 = evaluation.pseudo_r2,
        auc = evaluation.auc,
        "model fitted"
    );

    let angle_bins =
        evaluation::binned_scoring_rate(shots, BinMetric::AngleDegrees, ANGLE_BINS.0, ANGLE_BINS.1)?;
    let distance_bins = evaluation::binned_scoring_rate(
        shots,
        BinMetric::Distance,
        DISTANCE_BINS.0,
        DISTANCE_BINS.1,
    )?;
    let surface = surface::default_surface(&summary.coefficients)?;
    let players =
        player_totals::player_xg_totals(shots, penalties, &summary.coefficients, cfg.penalty_xg);

    Ok(Analysis {
        summary,
        null_model,
        evaluation,
        angle_bins,
        distance_bins,
        surface,
        players,
    })
}

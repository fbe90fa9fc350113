use std::env;

use crate::fit::FitConfig;
use crate::player_totals::DEFAULT_PENALTY_XG;
use crate::wyscout::ShotFilter;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub fit: FitConfig,
    pub roc_thresholds: usize,
    pub filter: ShotFilter,
    pub penalty_xg: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fit: FitConfig::default(),
            roc_thresholds: 100,
            filter: ShotFilter::default(),
            penalty_xg: DEFAULT_PENALTY_XG,
        }
    }
}

impl AnalysisConfig {
    /// Reads `.env.local` / `.env` if present, then the `XG_*` variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let max_iterations = lookup("XG_MAX_ITERS")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(d.fit.max_iterations)
            .clamp(1, 10_000);
        let tolerance = lookup("XG_TOLERANCE")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(d.fit.tolerance);
        let roc_thresholds = lookup("XG_ROC_THRESHOLDS")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(d.roc_thresholds)
            .clamp(1, 100_000);
        let filter = lookup("XG_HEADERS")
            .and_then(|v| v.parse::<ShotFilter>().ok())
            .or_else(|| {
                lookup("XG_EXCLUDE_HEADERS")
                    .filter(|raw| parse_flag(raw))
                    .map(|_| ShotFilter::ExcludeHeaders)
            })
            .unwrap_or(d.filter);
        let penalty_xg = lookup("XG_PENALTY_XG")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(d.penalty_xg)
            .clamp(0.0, 1.0);

        Self {
            fit: FitConfig {
                max_iterations,
                tolerance,
                initial: None,
            },
            roc_thresholds,
            filter,
            penalty_xg,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::evaluation::EvaluationResult;
use crate::fit::FitSummary;
use crate::model::ModelCoefficients;

pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoefficientEntry {
    pub name: String,
    pub estimate: f64,
    #[serde(default)]
    pub std_error: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub generated_at: String,
    #[serde(default)]
    pub source: Option<String>,
    pub model: ModelCoefficients,
    #[serde(default)]
    pub coefficients: Vec<CoefficientEntry>,
    #[serde(default)]
    pub observations: usize,
    #[serde(default)]
    pub iterations: usize,
    #[serde(default)]
    pub log_likelihood: f64,
    #[serde(default)]
    pub null_log_likelihood: f64,
    #[serde(default)]
    pub pseudo_r2: f64,
    #[serde(default)]
    pub auc: f64,
}

impl ModelArtifact {
    pub fn from_fit(summary: &FitSummary, eval: &EvaluationResult, source: Option<String>) -> Self {
        let coefficients = summary
            .table()
            .into_iter()
            .map(|row| CoefficientEntry {
                name: row.name,
                estimate: row.estimate,
                std_error: row.std_error.is_finite().then_some(row.std_error),
            })
            .collect();
        Self {
            version: ARTIFACT_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            source,
            model: summary.coefficients.clone(),
            coefficients,
            observations: summary.observations,
            iterations: summary.iterations,
            log_likelihood: eval.log_likelihood,
            null_log_likelihood: eval.null_log_likelihood,
            pseudo_r2: eval.pseudo_r2,
            auc: eval.auc,
        }
    }
}

/// Writes through a temp file and a rename so readers never see a partial file.
pub fn save_artifact(path: &Path, artifact: &ModelArtifact) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(artifact).context("serialize model artifact")?;
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

pub fn load_artifact(path: &Path) -> Result<ModelArtifact> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read model artifact {}", path.display()))?;
    serde_json::from_str::<ModelArtifact>(&raw)
        .with_context(|| format!("parse model artifact {}", path.display()))
}

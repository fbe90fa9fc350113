use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::evaluation::{EvaluationResult, RateBin};
use crate::fit::FitSummary;
use crate::player_totals::PlayerXg;
use crate::surface::ProbabilitySurface;

pub struct ReportInput<'a> {
    pub summary: &'a FitSummary,
    pub evaluation: &'a EvaluationResult,
    pub angle_bins: &'a [RateBin],
    pub distance_bins: &'a [RateBin],
    pub surface: &'a ProbabilitySurface,
    pub players: &'a [PlayerXg],
}

pub struct ReportCounts {
    pub coefficients: usize,
    pub roc_points: usize,
    pub surface_cells: usize,
    pub players: usize,
}

pub fn export_report(path: &Path, input: &ReportInput<'_>) -> Result<ReportCounts> {
    let mut coeff_rows = vec![vec![
        "Term".to_string(),
        "Estimate".to_string(),
        "Std. Error".to_string(),
        "z".to_string(),
    ]];
    for row in input.summary.table() {
        coeff_rows.push(vec![
            row.name,
            fmt_num(row.estimate),
            fmt_num(row.std_error),
            fmt_num(row.z),
        ]);
    }
    coeff_rows.push(Vec::new());
    coeff_rows.push(vec![
        "Log-likelihood".to_string(),
        fmt_num(input.evaluation.log_likelihood),
    ]);
    coeff_rows.push(vec![
        "Null log-likelihood".to_string(),
        fmt_num(input.evaluation.null_log_likelihood),
    ]);
    coeff_rows.push(vec![
        "McFadden R2".to_string(),
        fmt_num(input.evaluation.pseudo_r2),
    ]);
    coeff_rows.push(vec!["AUC".to_string(), fmt_num(input.evaluation.auc)]);

    let mut roc_rows = vec![vec![
        "Threshold".to_string(),
        "FPR".to_string(),
        "TPR".to_string(),
    ]];
    roc_rows.extend(input.evaluation.roc.iter().map(|p| {
        vec![fmt_num(p.threshold), fmt_num(p.fpr), fmt_num(p.tpr)]
    }));

    let mut bin_rows = vec![vec![
        "Metric".to_string(),
        "Bin start".to_string(),
        "Bin end".to_string(),
        "Shots".to_string(),
        "Goals".to_string(),
        "Rate".to_string(),
    ]];
    bin_rows.extend(input.angle_bins.iter().map(|b| bin_row("Angle (deg)", b)));
    bin_rows.extend(input.distance_bins.iter().map(|b| bin_row("Distance (m)", b)));

    let mut player_rows = vec![vec![
        "Player ID".to_string(),
        "Shots".to_string(),
        "Penalties".to_string(),
        "Goals".to_string(),
        "xG".to_string(),
        "Goals - xG".to_string(),
    ]];
    player_rows.extend(input.players.iter().map(|p| {
        vec![
            p.player_id.to_string(),
            p.shots.to_string(),
            p.penalties.to_string(),
            p.goals.to_string(),
            fmt_num(p.xg),
            fmt_num(p.goals_minus_xg()),
        ]
    }));

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Model")?;
        write_rows(sheet, &coeff_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("ROC")?;
        write_rows(sheet, &roc_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("ScoringRates")?;
        write_rows(sheet, &bin_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Surface")?;
        write_surface(sheet, input.surface)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Players")?;
        write_rows(sheet, &player_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ReportCounts {
        coefficients: input.summary.coefficients.values().len(),
        roc_points: input.evaluation.roc.len(),
        surface_cells: input.surface.values.len(),
        players: input.players.len(),
    })
}

fn bin_row(metric: &str, bin: &RateBin) -> Vec<String> {
    vec![
        metric.to_string(),
        fmt_num(bin.start),
        fmt_num(bin.end),
        bin.shots.to_string(),
        bin.goals.to_string(),
        bin.rate.map(fmt_num).unwrap_or_default(),
    ]
}

fn fmt_num(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.6}")
    } else {
        String::new()
    }
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

// Row 0 holds the across-pitch offsets, column 0 the distance from goal.
fn write_surface(worksheet: &mut Worksheet, surface: &ProbabilitySurface) -> Result<()> {
    for col in 0..surface.cols {
        worksheet
            .write_number(0, (col + 1) as u16, col as f64 * surface.step)
            .with_context(|| format!("write surface header {col}"))?;
    }
    for row in 0..surface.rows {
        let r = (row + 1) as u32;
        worksheet
            .write_number(r, 0, row as f64 * surface.step)
            .with_context(|| format!("write surface label {row}"))?;
        for (col, value) in surface.row(row).unwrap_or_default().iter().enumerate() {
            worksheet
                .write_number(r, (col + 1) as u16, *value)
                .with_context(|| format!("write surface cell ({row},{col})"))?;
        }
    }
    Ok(())
}

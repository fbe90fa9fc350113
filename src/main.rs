use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use xg_lab::artifact::{self, ModelArtifact};
use xg_lab::config::AnalysisConfig;
use xg_lab::features::FeatureSet;
use xg_lab::geometry::PitchFrame;
use xg_lab::pipeline::{self, Analysis};
use xg_lab::report_export;
use xg_lab::shot::{self, RawShot, ShotRecord};
use xg_lab::synthetic::{self, SyntheticConfig};
use xg_lab::wyscout::{self, ShotFilter};

#[derive(Parser)]
#[command(name = "xg_lab")]
#[command(about = "Fit and evaluate expected-goals models from shot events", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a model on one or more Wyscout event files
    Fit {
        /// Event JSON files (concatenated in order)
        #[arg(long = "events", required = true, num_args = 1..)]
        events: Vec<PathBuf>,
        /// Preset (full, angle, distance, distance2) or comma separated features
        #[arg(long, default_value = "full")]
        model: String,
        /// Body-part filter: all, exclude (no headers) or only (headers only)
        #[arg(long)]
        headers: Option<ShotFilter>,
        /// Where to write the model artifact
        #[arg(long, default_value = "xg_model.json")]
        out: PathBuf,
        /// Optional xlsx report
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },
    /// Score a single shot location with a saved model
    Score {
        #[arg(long)]
        model_file: PathBuf,
        /// Raw Wyscout x (0-100, attacking towards 100)
        #[arg(long)]
        x: f64,
        /// Raw Wyscout y (0-100)
        #[arg(long)]
        y: f64,
    },
    /// Run the whole pipeline on generated shots
    Demo {
        #[arg(long, default_value = "2000")]
        shots: usize,
        #[arg(long, default_value = "7")]
        seed: u64,
        #[arg(long, default_value = "full")]
        model: String,
        #[arg(long)]
        headers: Option<ShotFilter>,
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut cfg = AnalysisConfig::from_env();

    match cli.command {
        Commands::Fit {
            events,
            model,
            headers,
            out,
            xlsx,
        } => {
            if let Some(filter) = headers {
                cfg.filter = filter;
            }
            let features = FeatureSet::parse(&model).context("parse --model")?;
            let loaded = wyscout::load_events_files(&events, cfg.filter)?;
            if loaded.skipped_malformed > 0 {
                warn!(count = loaded.skipped_malformed, "shot events without a position skipped");
            }
            let records = shot::records_from_raw(&loaded.shots, &PitchFrame::default())
                .context("normalize shot coordinates")?;
            let analysis = pipeline::analyse(&records, &loaded.penalties, &features, &cfg)?;
            print_analysis(&analysis);

            let source = events
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(",");
            let art = ModelArtifact::from_fit(&analysis.summary, &analysis.evaluation, Some(source));
            artifact::save_artifact(&out, &art)?;
            println!();
            println!("model written: {}", out.display());
            if let Some(path) = xlsx {
                write_report(&path, &analysis)?;
            }
        }
        Commands::Score { model_file, x, y } => {
            let art = artifact::load_artifact(&model_file)?;
            let raw = RawShot {
                x,
                y,
                scored: false,
                header: false,
                player_id: None,
            };
            let rec = ShotRecord::from_raw(&raw, &PitchFrame::default())
                .context("normalize shot coordinates")?;
            println!("Distance: {:.2} m", rec.distance);
            println!("Angle: {:.2} deg", rec.angle.to_degrees());
            println!("xG: {:.4}", art.model.xg(&rec));
        }
        Commands::Demo {
            shots,
            seed,
            model,
            headers,
            xlsx,
        } => {
            if let Some(filter) = headers {
                cfg.filter = filter;
            }
            if shots == 0 {
                return Err(anyhow!("--shots must be positive"));
            }
            let features = FeatureSet::parse(&model).context("parse --model")?;
            let raw = synthetic::generate_shots(&SyntheticConfig {
                shots,
                seed,
                ..SyntheticConfig::default()
            });
            let raw: Vec<RawShot> = raw
                .into_iter()
                .filter(|s| cfg.filter.keeps(s.header))
                .collect();
            info!(shots = raw.len(), seed, filter = %cfg.filter, "generated synthetic shots");
            let records = shot::records_from_raw(&raw, &PitchFrame::default())?;
            let analysis = pipeline::analyse(&records, &[], &features, &cfg)?;
            print_analysis(&analysis);
            if let Some(path) = xlsx {
                write_report(&path, &analysis)?;
            }
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "xg_lab=debug" } else { "xg_lab=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_analysis(analysis: &Analysis) {
    println!(
        "{:<12} {:>12} {:>12} {:>9}",
        "term", "estimate", "std err", "z"
    );
    for row in analysis.summary.table() {
        println!(
            "{:<12} {:>12.6} {:>12.6} {:>9.3}",
            row.name, row.estimate, row.std_error, row.z
        );
    }
    let eval = &analysis.evaluation;
    println!();
    println!("Observations: {}", analysis.summary.observations);
    println!("Iterations: {}", analysis.summary.iterations);
    println!("Log-likelihood: {:.4}", eval.log_likelihood);
    println!("Null log-likelihood: {:.4}", eval.null_log_likelihood);
    println!("McFadden R2: {:.4}", eval.pseudo_r2);
    println!("ROC AUC: {:.4}", eval.auc);
    if let Some(top) = analysis.players.first() {
        println!(
            "Top xG: player {} ({:.2} xG, {} goals from {} shots)",
            top.player_id,
            top.xg,
            top.goals,
            top.shots + top.penalties
        );
    }
}

fn write_report(path: &Path, analysis: &Analysis) -> Result<()> {
    let counts = report_export::export_report(path, &analysis.report_input())?;
    println!(
        "report written: {} ({} terms, {} ROC points, {} surface cells, {} players)",
        path.display(),
        counts.coefficients,
        counts.roc_points,
        counts.surface_cells,
        counts.players
    );
    Ok(())
}

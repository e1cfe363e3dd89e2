use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use emotion_detector::session::{self, SessionStats};
use emotion_detector::{
    ArtifactManager, InferenceService, OptimizationLevel, Renderer, RuntimeConfig, ARTIFACTS_ENV,
};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding model.json (or model.onnx), vectorizer.json and label_encoder.json
    #[arg(short, long, env = ARTIFACTS_ENV)]
    artifacts: Option<PathBuf>,

    /// Classifier file, overriding the one in the artifact directory
    #[arg(long)]
    model: Option<PathBuf>,

    /// Vectorizer file, overriding the one in the artifact directory
    #[arg(long)]
    vectorizer: Option<PathBuf>,

    /// Label encoder file, overriding the one in the artifact directory
    #[arg(long)]
    label_encoder: Option<PathBuf>,

    /// Do not check artifacts against manifest.json
    #[arg(long)]
    skip_verify: bool,

    /// Decimals shown for confidence scores
    #[arg(short, long, default_value_t = emotion_detector::render::DEFAULT_PRECISION)]
    precision: usize,

    /// Classify this text once and exit instead of reading from stdin
    #[arg(short, long)]
    text: Option<String>,

    /// Intra-op threads for ONNX classifiers (0 lets the runtime decide)
    #[arg(long, default_value_t = 0)]
    intra_threads: usize,

    /// Graph optimisation level for ONNX classifiers
    #[arg(long, value_enum, default_value_t = OptimizationLevel::Level3)]
    optimization: OptimizationLevel,
}

fn build_service(args: &Args) -> Result<InferenceService> {
    let artifact_dir = args
        .artifacts
        .clone()
        .unwrap_or_else(ArtifactManager::get_default_artifacts_dir);

    let mut builder = InferenceService::builder()
        .with_artifact_dir(&artifact_dir)
        .verify_checksums(!args.skip_verify)
        .with_runtime_config(RuntimeConfig {
            intra_threads: args.intra_threads,
            optimization_level: args.optimization,
            ..RuntimeConfig::default()
        });
    if let Some(path) = &args.model {
        builder = builder.with_classifier_path(path);
    }
    if let Some(path) = &args.vectorizer {
        builder = builder.with_vectorizer_path(path);
    }
    if let Some(path) = &args.label_encoder {
        builder = builder.with_label_encoder_path(path);
    }

    builder
        .build()
        .with_context(|| format!("failed to load artifacts from {:?}", artifact_dir))
}

fn main() -> Result<()> {
    emotion_detector::init_logger();
    let args = Args::parse();

    info!("=== Starting Emotion Detector ===");
    let start_time = Instant::now();
    let service = build_service(&args)?;
    let info = service.info();
    info!(
        "Loaded {} classifier with {} classes in {:.2?}",
        info.backend,
        info.num_classes,
        start_time.elapsed()
    );

    let renderer = Renderer::new(args.precision);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &args.text {
        Some(text) => {
            let mut stats = SessionStats::default();
            session::run_action(&service, &renderer, &mut out, text, &mut stats)?;
            out.flush()?;
            if stats.failed > 0 {
                anyhow::bail!("prediction failed");
            }
        }
        None => {
            let stdin = io::stdin();
            session::run_interactive(&service, &renderer, stdin.lock(), &mut out)
                .context("terminal session failed")?;
        }
    }

    Ok(())
}

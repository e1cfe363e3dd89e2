#[cfg(feature = "onnx")]
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
#[cfg(feature = "onnx")]
use ort::session::Session;
#[cfg(feature = "onnx")]
use std::sync::OnceLock;

/// Graph optimisation applied when an ONNX session is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OptimizationLevel {
    Disable,
    Level1,
    Level2,
    #[default]
    Level3,
}

#[cfg(feature = "onnx")]
impl From<OptimizationLevel> for GraphOptimizationLevel {
    fn from(level: OptimizationLevel) -> Self {
        match level {
            OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
            OptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
            OptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
            OptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        }
    }
}

/// Execution settings for classifier backends that run on an external runtime.
///
/// The native JSON backend ignores these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: OptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0, // Let ONNX Runtime decide
            intra_threads: 0, // Let ONNX Runtime decide
            optimization_level: OptimizationLevel::default(),
        }
    }
}

#[cfg(feature = "onnx")]
static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Initialises the ONNX Runtime environment once per process.
///
/// A failed initialisation is remembered and returned to every later caller.
#[cfg(feature = "onnx")]
pub fn ensure_initialized() -> Result<(), String> {
    INIT.get_or_init(|| {
        ort::init()
            .with_name("emotion-detector")
            .commit()
            .map(|_| ())
            .map_err(|e| e.to_string())
    })
    .clone()
}

#[cfg(feature = "onnx")]
pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, String> {
    ensure_initialized()?;
    let mut builder = Session::builder().map_err(|e| e.to_string())?;

    if config.inter_threads > 0 {
        builder = builder
            .with_inter_threads(config.inter_threads)
            .map_err(|e| e.to_string())?;
    }
    if config.intra_threads > 0 {
        builder = builder
            .with_intra_threads(config.intra_threads)
            .map_err(|e| e.to_string())?;
    }

    builder
        .with_optimization_level(config.optimization_level.into())
        .map_err(|e| e.to_string())
}
